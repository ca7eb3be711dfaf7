use async_graphql::{Context, Object};
use chrono::Utc;

use super::context::{forbidden, portal, require, viewer};
use super::errors::{coded, GraphqlResultExt, INVALID_TRANSITION};
use super::types::{
    ApplicantNode, ApplicationNode, CompletionReceiptNode, EmployeeNode, PhysicianNode,
};
use crate::workflows::applicants::{ApplicantId, IdentityClaim};
use crate::workflows::applications::{
    ApplicationAmendment, ApplicationId, NewApplicationInput, ProcessingTask,
    RenewalApplicationInput, ReplacementApplicationInput, Submitter, TaskUpdate,
};
use crate::workflows::employees::{EmployeeId, EmployeeInput, Permission};
use crate::workflows::people::{Guardian, PersonalInformation};
use crate::workflows::physicians::{PhysicianDetails, PhysicianStatus};

pub struct MutationRoot;

#[Object]
impl MutationRoot {
    async fn create_new_application(
        &self,
        ctx: &Context<'_>,
        input: NewApplicationInput,
    ) -> async_graphql::Result<ApplicationNode> {
        require(ctx, Permission::ManageApplications)?;
        let record = portal(ctx)?.applications.create_new(input).graphql()?;
        Ok(ApplicationNode(record))
    }

    /// Staff may renew for any holder. Anonymous callers must pass an identity claim,
    /// which decides the holder and forces the scheduled processing fee.
    async fn create_renewal_application(
        &self,
        ctx: &Context<'_>,
        mut input: RenewalApplicationInput,
        identity: Option<IdentityClaim>,
    ) -> async_graphql::Result<ApplicationNode> {
        let portal = portal(ctx)?;
        let submitter = match viewer(ctx).employee() {
            Some(employee) if employee.can(Permission::ManageApplications) => {
                Submitter::Employee(employee.id)
            }
            _ => {
                let claim = identity.ok_or_else(|| forbidden(Permission::ManageApplications))?;
                let verified = portal
                    .applicants
                    .verify_identity(&claim, Utc::now().date_naive())
                    .graphql()?;
                input.applicant_id = verified.applicant_id.0;
                Submitter::Applicant
            }
        };

        let record = portal
            .applications
            .create_renewal(input, submitter)
            .graphql()?;
        Ok(ApplicationNode(record))
    }

    async fn create_replacement_application(
        &self,
        ctx: &Context<'_>,
        input: ReplacementApplicationInput,
    ) -> async_graphql::Result<ApplicationNode> {
        require(ctx, Permission::ManageApplications)?;
        let record = portal(ctx)?
            .applications
            .create_replacement(input)
            .graphql()?;
        Ok(ApplicationNode(record))
    }

    async fn approve_application(
        &self,
        ctx: &Context<'_>,
        id: i64,
    ) -> async_graphql::Result<ApplicationNode> {
        let employee = require(ctx, Permission::ManageApplications)?;
        let record = portal(ctx)?
            .applications
            .approve(ApplicationId(id), employee.id)
            .graphql()?;
        Ok(ApplicationNode(record))
    }

    async fn reject_application(
        &self,
        ctx: &Context<'_>,
        id: i64,
        reason: String,
    ) -> async_graphql::Result<ApplicationNode> {
        let employee = require(ctx, Permission::ManageApplications)?;
        let record = portal(ctx)?
            .applications
            .reject(ApplicationId(id), &reason, employee.id)
            .graphql()?;
        Ok(ApplicationNode(record))
    }

    async fn reopen_application(
        &self,
        ctx: &Context<'_>,
        id: i64,
    ) -> async_graphql::Result<ApplicationNode> {
        let employee = require(ctx, Permission::ManageApplications)?;
        let record = portal(ctx)?
            .applications
            .reopen(ApplicationId(id), employee.id)
            .graphql()?;
        Ok(ApplicationNode(record))
    }

    /// Refunds need `RefundPayments`; every other task needs `ManageApplications`.
    async fn update_processing_task(
        &self,
        ctx: &Context<'_>,
        id: i64,
        update: TaskUpdate,
    ) -> async_graphql::Result<ApplicationNode> {
        let permission = if update.task == ProcessingTask::RefundPayment {
            Permission::RefundPayments
        } else {
            Permission::ManageApplications
        };
        let employee = require(ctx, permission)?;
        let record = portal(ctx)?
            .applications
            .update_task(ApplicationId(id), update, employee.id)
            .graphql()?;
        Ok(ApplicationNode(record))
    }

    async fn complete_application(
        &self,
        ctx: &Context<'_>,
        id: i64,
    ) -> async_graphql::Result<CompletionReceiptNode> {
        let employee = require(ctx, Permission::ManageApplications)?;
        let receipt = portal(ctx)?
            .applications
            .complete(ApplicationId(id), employee.id)
            .graphql()?;
        Ok(receipt.into())
    }

    async fn amend_application(
        &self,
        ctx: &Context<'_>,
        id: i64,
        amendment: ApplicationAmendment,
    ) -> async_graphql::Result<ApplicationNode> {
        require(ctx, Permission::ManageApplications)?;
        let record = portal(ctx)?
            .applications
            .amend(ApplicationId(id), amendment)
            .graphql()?;
        Ok(ApplicationNode(record))
    }

    async fn delete_application(&self, ctx: &Context<'_>, id: i64) -> async_graphql::Result<bool> {
        require(ctx, Permission::ManageApplications)?;
        portal(ctx)?
            .applications
            .delete(ApplicationId(id))
            .graphql()?;
        Ok(true)
    }

    async fn update_applicant_personal_information(
        &self,
        ctx: &Context<'_>,
        id: i64,
        personal: PersonalInformation,
    ) -> async_graphql::Result<ApplicantNode> {
        require(ctx, Permission::ManageApplicants)?;
        let record = portal(ctx)?
            .applicants
            .update_personal_information(ApplicantId(id), personal)
            .graphql()?;
        Ok(ApplicantNode(record))
    }

    /// Passing no guardian clears the one on file.
    async fn update_applicant_guardian(
        &self,
        ctx: &Context<'_>,
        id: i64,
        guardian: Option<Guardian>,
    ) -> async_graphql::Result<ApplicantNode> {
        require(ctx, Permission::ManageApplicants)?;
        let record = portal(ctx)?
            .applicants
            .update_guardian(ApplicantId(id), guardian)
            .graphql()?;
        Ok(ApplicantNode(record))
    }

    async fn set_applicant_inactive(
        &self,
        ctx: &Context<'_>,
        id: i64,
        reason: String,
    ) -> async_graphql::Result<ApplicantNode> {
        require(ctx, Permission::ManageApplicants)?;
        let record = portal(ctx)?
            .applicants
            .set_inactive(ApplicantId(id), &reason)
            .graphql()?;
        Ok(ApplicantNode(record))
    }

    async fn set_applicant_active(
        &self,
        ctx: &Context<'_>,
        id: i64,
    ) -> async_graphql::Result<ApplicantNode> {
        require(ctx, Permission::ManageApplicants)?;
        let record = portal(ctx)?
            .applicants
            .set_active(ApplicantId(id))
            .graphql()?;
        Ok(ApplicantNode(record))
    }

    async fn upsert_physician(
        &self,
        ctx: &Context<'_>,
        input: PhysicianDetails,
    ) -> async_graphql::Result<PhysicianNode> {
        require(ctx, Permission::ManagePhysicians)?;
        let record = portal(ctx)?.physicians.upsert(input).graphql()?;
        Ok(PhysicianNode(record))
    }

    async fn set_physician_status(
        &self,
        ctx: &Context<'_>,
        msp_number: String,
        status: PhysicianStatus,
    ) -> async_graphql::Result<PhysicianNode> {
        require(ctx, Permission::ManagePhysicians)?;
        let record = portal(ctx)?
            .physicians
            .set_status(&msp_number, status)
            .graphql()?;
        Ok(PhysicianNode(record))
    }

    async fn create_employee(
        &self,
        ctx: &Context<'_>,
        input: EmployeeInput,
    ) -> async_graphql::Result<EmployeeNode> {
        require(ctx, Permission::ManageEmployees)?;
        let record = portal(ctx)?.employees.create(input).graphql()?;
        Ok(EmployeeNode(record))
    }

    async fn update_employee(
        &self,
        ctx: &Context<'_>,
        id: i64,
        input: EmployeeInput,
    ) -> async_graphql::Result<EmployeeNode> {
        require(ctx, Permission::ManageEmployees)?;
        let record = portal(ctx)?
            .employees
            .update(EmployeeId(id), input)
            .graphql()?;
        Ok(EmployeeNode(record))
    }

    /// Admins cannot lock themselves out.
    async fn set_employee_active(
        &self,
        ctx: &Context<'_>,
        id: i64,
        active: bool,
    ) -> async_graphql::Result<EmployeeNode> {
        let employee = require(ctx, Permission::ManageEmployees)?;
        if employee.id == EmployeeId(id) && !active {
            return Err(coded(
                "employees cannot deactivate their own account",
                INVALID_TRANSITION,
            ));
        }
        let record = portal(ctx)?
            .employees
            .set_active(EmployeeId(id), active)
            .graphql()?;
        Ok(EmployeeNode(record))
    }
}
