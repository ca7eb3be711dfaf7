//! Output objects wrapping workflow records.

use async_graphql::{Context, Object, OutputType, SimpleObject};
use chrono::{DateTime, NaiveDate, Utc};

use super::context::portal;
use super::errors::GraphqlResultExt;
use crate::pagination::Page;
use crate::storage::RepositoryError;
use crate::workflows::applicants::{
    ApplicantRecord, ApplicantServiceError, ApplicantStatus, IdentityVerificationFailure,
    MedicalAssessment, Permit, VerifiedIdentity,
};
use crate::workflows::applications::{
    ApplicationDetails, ApplicationProcessing, ApplicationRecord, ApplicationStatus,
    ApplicationType, CompletionReceipt, NewApplicationDetails, PaymentInformation, PermitType,
    ProcessingTask, RenewalApplicationDetails, ReplacementApplicationDetails,
};
use crate::workflows::employees::{EmployeeRecord, Permission, Role};
use crate::workflows::people::{Address, Gender, Guardian, PersonalInformation};
use crate::workflows::physicians::{
    PhysicianDetails, PhysicianRecord, PhysicianServiceError, PhysicianStatus,
};

/// Offset page of results with the counters table views need.
#[derive(SimpleObject)]
#[graphql(concrete(name = "ApplicationPage", params(ApplicationNode)))]
#[graphql(concrete(name = "ApplicantPage", params(ApplicantNode)))]
#[graphql(concrete(name = "PhysicianPage", params(PhysicianNode)))]
#[graphql(concrete(name = "EmployeePage", params(EmployeeNode)))]
pub struct PageNode<T: OutputType> {
    pub items: Vec<T>,
    pub total_count: u64,
    pub offset: u32,
    pub limit: u32,
    pub page_count: u64,
    pub page_index: u64,
    pub has_next_page: bool,
    pub has_previous_page: bool,
}

impl<T: OutputType> PageNode<T> {
    pub fn from_page<R>(page: Page<R>, wrap: impl FnMut(R) -> T) -> Self {
        let page_count = page.page_count();
        let page_index = page.page_index();
        let has_next_page = page.has_next_page();
        let has_previous_page = page.has_previous_page();
        let page = page.map(wrap);
        Self {
            items: page.items,
            total_count: page.total_count,
            offset: page.offset,
            limit: page.limit,
            page_count,
            page_index,
            has_next_page,
            has_previous_page,
        }
    }
}

pub struct ViewerNode {
    pub employee: Option<EmployeeRecord>,
}

#[Object(name = "Viewer")]
impl ViewerNode {
    async fn authenticated(&self) -> bool {
        self.employee.is_some()
    }

    async fn employee(&self) -> Option<EmployeeNode> {
        self.employee.clone().map(EmployeeNode)
    }

    async fn can_manage_applications(&self) -> bool {
        self.can(Permission::ManageApplications)
    }

    async fn can_refund_payments(&self) -> bool {
        self.can(Permission::RefundPayments)
    }

    async fn can_view_reports(&self) -> bool {
        self.can(Permission::ViewReports)
    }

    async fn can_manage_employees(&self) -> bool {
        self.can(Permission::ManageEmployees)
    }
}

impl ViewerNode {
    fn can(&self, permission: Permission) -> bool {
        self.employee
            .as_ref()
            .is_some_and(|employee| employee.can(permission))
    }
}

pub struct ApplicationNode(pub ApplicationRecord);

#[Object(name = "Application")]
impl ApplicationNode {
    async fn id(&self) -> i64 {
        self.0.id.0
    }

    async fn application_type(&self) -> ApplicationType {
        self.0.application_type
    }

    async fn permit_type(&self) -> PermitType {
        self.0.permit_type
    }

    async fn status(&self) -> ApplicationStatus {
        self.0.status()
    }

    async fn status_label(&self) -> &str {
        self.0.status().label()
    }

    async fn applicant_name(&self) -> String {
        self.0.personal.full_name()
    }

    async fn personal(&self) -> &PersonalInformation {
        &self.0.personal
    }

    async fn payment(&self) -> &PaymentInformation {
        &self.0.payment
    }

    async fn total_cents(&self) -> i64 {
        self.0.payment.total_cents()
    }

    async fn new_details(&self) -> Option<&NewApplicationDetails> {
        match &self.0.details {
            ApplicationDetails::New(details) => Some(details),
            _ => None,
        }
    }

    async fn renewal_details(&self) -> Option<&RenewalApplicationDetails> {
        match &self.0.details {
            ApplicationDetails::Renewal(details) => Some(details),
            _ => None,
        }
    }

    async fn replacement_details(&self) -> Option<&ReplacementApplicationDetails> {
        match &self.0.details {
            ApplicationDetails::Replacement(details) => Some(details),
            _ => None,
        }
    }

    /// Holder the application belongs to; set for renewals and replacements,
    /// and for new applications once completed.
    async fn applicant(&self, ctx: &Context<'_>) -> async_graphql::Result<Option<ApplicantNode>> {
        let Some(applicant_id) = self.0.applicant_id.or(self.0.details.applicant_id()) else {
            return Ok(None);
        };
        let portal = portal(ctx)?;
        match portal.applicants.get(applicant_id) {
            Ok(record) => Ok(Some(ApplicantNode(record))),
            Err(ApplicantServiceError::Repository(RepositoryError::NotFound)) => Ok(None),
            Err(err) => Err(err).graphql(),
        }
    }

    async fn processing(&self) -> ProcessingNode {
        ProcessingNode(self.0.processing.clone())
    }

    async fn outstanding_tasks(&self) -> Vec<ProcessingTask> {
        self.0.processing.outstanding_tasks()
    }

    async fn created_at(&self) -> DateTime<Utc> {
        self.0.created_at
    }

    async fn updated_at(&self) -> DateTime<Utc> {
        self.0.updated_at
    }
}

pub struct ProcessingNode(pub ApplicationProcessing);

#[Object(name = "ApplicationProcessing")]
impl ProcessingNode {
    async fn status(&self) -> ApplicationStatus {
        self.0.status
    }

    async fn rejected_reason(&self) -> Option<&str> {
        self.0.rejected_reason.as_deref()
    }

    async fn app_number(&self) -> Option<i64> {
        self.0.app_number
    }

    async fn app_holepunched(&self) -> bool {
        self.0.app_holepunched
    }

    async fn wallet_card_created(&self) -> bool {
        self.0.wallet_card_created
    }

    async fn review_request_completed(&self) -> bool {
        self.0.review_request_completed
    }

    async fn invoice_number(&self) -> Option<i64> {
        self.0.invoice_number
    }

    async fn documents_url(&self) -> Option<&str> {
        self.0.documents_url.as_deref()
    }

    async fn app_mailed(&self) -> bool {
        self.0.app_mailed
    }

    async fn payment_refunded(&self) -> bool {
        self.0.payment_refunded
    }

    async fn status_changed_by(&self) -> Option<i64> {
        self.0.status_changed.map(|change| change.employee_id.0)
    }

    async fn status_changed_at(&self) -> Option<DateTime<Utc>> {
        self.0.status_changed.map(|change| change.at)
    }

    /// Every task with its completion flag and last editor, fulfillment tasks first.
    async fn tasks(&self) -> Vec<TaskState> {
        ProcessingTask::fulfillment()
            .into_iter()
            .chain(std::iter::once(ProcessingTask::RefundPayment))
            .map(|task| {
                let change = self.0.task_changes.get(&task);
                TaskState {
                    task,
                    label: task.label().to_string(),
                    done: self.0.is_done(task),
                    updated_by: change.map(|change| change.employee_id.0),
                    updated_at: change.map(|change| change.at),
                }
            })
            .collect()
    }
}

#[derive(Debug, Clone, SimpleObject)]
pub struct TaskState {
    pub task: ProcessingTask,
    pub label: String,
    pub done: bool,
    pub updated_by: Option<i64>,
    pub updated_at: Option<DateTime<Utc>>,
}

pub struct ApplicantNode(pub ApplicantRecord);

#[Object(name = "Applicant")]
impl ApplicantNode {
    async fn id(&self) -> i64 {
        self.0.id.0
    }

    async fn rcd_user_id(&self) -> i64 {
        self.0.rcd_user_id
    }

    async fn full_name(&self) -> String {
        self.0.personal.full_name()
    }

    async fn personal(&self) -> &PersonalInformation {
        &self.0.personal
    }

    async fn date_of_birth(&self) -> NaiveDate {
        self.0.date_of_birth
    }

    async fn gender(&self) -> Gender {
        self.0.gender
    }

    async fn other_gender(&self) -> Option<&str> {
        self.0.other_gender.as_deref()
    }

    async fn status(&self) -> ApplicantStatus {
        self.0.status
    }

    async fn inactive_reason(&self) -> Option<&str> {
        self.0.inactive_reason.as_deref()
    }

    async fn notes(&self) -> Option<&str> {
        self.0.notes.as_deref()
    }

    async fn medical(&self) -> &MedicalAssessment {
        &self.0.medical
    }

    async fn guardian(&self) -> Option<&Guardian> {
        self.0.guardian.as_ref()
    }

    async fn physician(&self, ctx: &Context<'_>) -> async_graphql::Result<Option<PhysicianNode>> {
        let portal = portal(ctx)?;
        match portal.physicians.get(&self.0.physician_msp_number) {
            Ok(record) => Ok(Some(PhysicianNode(record))),
            Err(PhysicianServiceError::Repository(RepositoryError::NotFound)) => Ok(None),
            Err(err) => Err(err).graphql(),
        }
    }

    /// Every permit issued to the holder, newest first.
    async fn permits(&self, ctx: &Context<'_>) -> async_graphql::Result<Vec<PermitNode>> {
        let portal = portal(ctx)?;
        let permits = portal.applicants.permits(self.0.id).graphql()?;
        Ok(permits.into_iter().map(PermitNode).collect())
    }

    async fn active_permit(&self, ctx: &Context<'_>) -> async_graphql::Result<Option<PermitNode>> {
        let portal = portal(ctx)?;
        let permit = portal.applicants.active_permit(self.0.id).graphql()?;
        Ok(permit.map(PermitNode))
    }

    async fn created_at(&self) -> DateTime<Utc> {
        self.0.created_at
    }

    async fn updated_at(&self) -> DateTime<Utc> {
        self.0.updated_at
    }
}

pub struct PermitNode(pub Permit);

#[Object(name = "Permit")]
impl PermitNode {
    async fn rcd_permit_id(&self) -> i64 {
        self.0.rcd_permit_id
    }

    async fn permit_type(&self) -> PermitType {
        self.0.permit_type
    }

    async fn expiry_date(&self) -> NaiveDate {
        self.0.expiry_date
    }

    async fn expired(&self) -> bool {
        self.0.is_expired(Utc::now().date_naive())
    }

    async fn active(&self) -> bool {
        self.0.active
    }

    async fn issued_on(&self) -> NaiveDate {
        self.0.issued_on
    }

    async fn applicant_id(&self) -> i64 {
        self.0.applicant_id.0
    }

    async fn application_id(&self) -> i64 {
        self.0.application_id.0
    }
}

pub struct PhysicianNode(pub PhysicianRecord);

#[Object(name = "Physician")]
impl PhysicianNode {
    async fn msp_number(&self) -> &str {
        &self.0.details.msp_number
    }

    async fn full_name(&self) -> String {
        self.0.full_name()
    }

    async fn details(&self) -> &PhysicianDetails {
        &self.0.details
    }

    async fn phone(&self) -> &str {
        &self.0.details.phone
    }

    async fn address(&self) -> &Address {
        &self.0.details.address
    }

    async fn status(&self) -> PhysicianStatus {
        self.0.status
    }

    async fn created_at(&self) -> DateTime<Utc> {
        self.0.created_at
    }

    async fn updated_at(&self) -> DateTime<Utc> {
        self.0.updated_at
    }
}

pub struct EmployeeNode(pub EmployeeRecord);

#[Object(name = "Employee")]
impl EmployeeNode {
    async fn id(&self) -> i64 {
        self.0.id.0
    }

    async fn email(&self) -> &str {
        &self.0.email
    }

    async fn first_name(&self) -> &str {
        &self.0.first_name
    }

    async fn last_name(&self) -> &str {
        &self.0.last_name
    }

    async fn role(&self) -> Role {
        self.0.role
    }

    async fn active(&self) -> bool {
        self.0.active
    }

    async fn role_label(&self) -> &str {
        self.0.role.label()
    }
}

#[derive(Debug, Clone, SimpleObject)]
pub struct CompletionReceiptNode {
    pub application_id: i64,
    pub applicant_id: i64,
    pub rcd_permit_id: i64,
    pub expiry_date: NaiveDate,
}

impl From<CompletionReceipt> for CompletionReceiptNode {
    fn from(receipt: CompletionReceipt) -> Self {
        Self {
            application_id: receipt.application_id.0,
            applicant_id: receipt.applicant_id.0,
            rcd_permit_id: receipt.rcd_permit_id,
            expiry_date: receipt.expiry_date,
        }
    }
}

/// Outcome of the self-service identity check; failures are data, not errors.
#[derive(Debug, Clone, SimpleObject)]
pub struct RenewalEligibility {
    pub eligible: bool,
    pub failure: Option<IdentityVerificationFailure>,
    pub identity: Option<VerifiedIdentity>,
}
