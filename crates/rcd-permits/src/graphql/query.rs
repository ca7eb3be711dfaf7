use async_graphql::{Context, Object};
use chrono::Utc;

use super::context::{portal, require, viewer};
use super::errors::GraphqlResultExt;
use super::types::{
    ApplicantNode, ApplicationNode, EmployeeNode, PageNode, PhysicianNode, RenewalEligibility,
    ViewerNode,
};
use crate::pagination::PageRequest;
use crate::storage::RepositoryError;
use crate::workflows::applicants::{
    ApplicantFilter, ApplicantId, ApplicantServiceError, IdentityClaim,
};
use crate::workflows::applications::{ApplicationFilter, ApplicationId, ApplicationServiceError};
use crate::workflows::employees::Permission;
use crate::workflows::physicians::{PhysicianFilter, PhysicianServiceError};
use crate::workflows::reports::{
    AccountantReport, ApplicationsReportRow, PermitHolderRow, ReportRange,
};

pub struct QueryRoot;

#[Object]
impl QueryRoot {
    /// The employee behind the request, if any.
    async fn viewer(&self, ctx: &Context<'_>) -> ViewerNode {
        ViewerNode {
            employee: viewer(ctx).employee().cloned(),
        }
    }

    async fn application(
        &self,
        ctx: &Context<'_>,
        id: i64,
    ) -> async_graphql::Result<Option<ApplicationNode>> {
        require(ctx, Permission::ViewRecords)?;
        match portal(ctx)?.applications.get(ApplicationId(id)) {
            Ok(record) => Ok(Some(ApplicationNode(record))),
            Err(ApplicationServiceError::Repository(RepositoryError::NotFound)) => Ok(None),
            Err(err) => Err(err).graphql(),
        }
    }

    /// Applications matching the filter, newest first.
    async fn applications(
        &self,
        ctx: &Context<'_>,
        filter: Option<ApplicationFilter>,
        offset: Option<i64>,
        limit: Option<i64>,
    ) -> async_graphql::Result<PageNode<ApplicationNode>> {
        require(ctx, Permission::ViewRecords)?;
        let page = portal(ctx)?
            .applications
            .search(&filter.unwrap_or_default(), PageRequest::new(offset, limit))
            .graphql()?;
        Ok(PageNode::from_page(page, ApplicationNode))
    }

    async fn applicant(
        &self,
        ctx: &Context<'_>,
        id: i64,
    ) -> async_graphql::Result<Option<ApplicantNode>> {
        require(ctx, Permission::ViewRecords)?;
        match portal(ctx)?.applicants.get(ApplicantId(id)) {
            Ok(record) => Ok(Some(ApplicantNode(record))),
            Err(ApplicantServiceError::Repository(RepositoryError::NotFound)) => Ok(None),
            Err(err) => Err(err).graphql(),
        }
    }

    async fn applicants(
        &self,
        ctx: &Context<'_>,
        filter: Option<ApplicantFilter>,
        offset: Option<i64>,
        limit: Option<i64>,
    ) -> async_graphql::Result<PageNode<ApplicantNode>> {
        require(ctx, Permission::ViewRecords)?;
        let page = portal(ctx)?
            .applicants
            .search(&filter.unwrap_or_default(), PageRequest::new(offset, limit))
            .graphql()?;
        Ok(PageNode::from_page(page, ApplicantNode))
    }

    /// Public check run before the self-service renewal form is shown.
    async fn verify_identity(
        &self,
        ctx: &Context<'_>,
        claim: IdentityClaim,
    ) -> async_graphql::Result<RenewalEligibility> {
        let today = Utc::now().date_naive();
        match portal(ctx)?.applicants.verify_identity(&claim, today) {
            Ok(identity) => Ok(RenewalEligibility {
                eligible: true,
                failure: None,
                identity: Some(identity),
            }),
            Err(ApplicantServiceError::Identity(failure)) => Ok(RenewalEligibility {
                eligible: false,
                failure: Some(failure),
                identity: None,
            }),
            Err(err) => Err(err).graphql(),
        }
    }

    async fn physician(
        &self,
        ctx: &Context<'_>,
        msp_number: String,
    ) -> async_graphql::Result<Option<PhysicianNode>> {
        require(ctx, Permission::ViewRecords)?;
        match portal(ctx)?.physicians.get(&msp_number) {
            Ok(record) => Ok(Some(PhysicianNode(record))),
            Err(PhysicianServiceError::Repository(RepositoryError::NotFound)) => Ok(None),
            Err(err) => Err(err).graphql(),
        }
    }

    async fn physicians(
        &self,
        ctx: &Context<'_>,
        filter: Option<PhysicianFilter>,
        offset: Option<i64>,
        limit: Option<i64>,
    ) -> async_graphql::Result<PageNode<PhysicianNode>> {
        require(ctx, Permission::ViewRecords)?;
        let page = portal(ctx)?
            .physicians
            .search(&filter.unwrap_or_default(), PageRequest::new(offset, limit))
            .graphql()?;
        Ok(PageNode::from_page(page, PhysicianNode))
    }

    async fn employees(
        &self,
        ctx: &Context<'_>,
        active: Option<bool>,
        offset: Option<i64>,
        limit: Option<i64>,
    ) -> async_graphql::Result<PageNode<EmployeeNode>> {
        require(ctx, Permission::ManageEmployees)?;
        let page = portal(ctx)?
            .employees
            .list(active, PageRequest::new(offset, limit))
            .graphql()?;
        Ok(PageNode::from_page(page, EmployeeNode))
    }

    /// Applications created within the range.
    async fn applications_report(
        &self,
        ctx: &Context<'_>,
        range: ReportRange,
    ) -> async_graphql::Result<Vec<ApplicationsReportRow>> {
        require(ctx, Permission::ViewReports)?;
        portal(ctx)?.reports.applications_report(range).graphql()
    }

    /// Holders whose active permit expires within the range.
    async fn permit_holders_report(
        &self,
        ctx: &Context<'_>,
        range: ReportRange,
    ) -> async_graphql::Result<Vec<PermitHolderRow>> {
        require(ctx, Permission::ViewReports)?;
        portal(ctx)?.reports.permit_holders_report(range).graphql()
    }

    /// Fees and donations of applications completed within the range, per payment method.
    async fn accountant_report(
        &self,
        ctx: &Context<'_>,
        range: ReportRange,
    ) -> async_graphql::Result<AccountantReport> {
        require(ctx, Permission::ViewReports)?;
        portal(ctx)?.reports.accountant_report(range).graphql()
    }
}
