use std::sync::Arc;

use tracing::info;

use super::domain::{AccountantReport, ApplicationsReportRow, PermitHolderRow, ReportRange};
use super::ledger::AccountantLedger;
use super::repository::ReportRepository;
use crate::storage::RepositoryError;
use crate::workflows::validation::ValidationErrors;

pub struct ReportService<R: ?Sized> {
    repository: Arc<R>,
}

impl<R> ReportService<R>
where
    R: ReportRepository + ?Sized + 'static,
{
    pub fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }

    pub fn applications_report(
        &self,
        range: ReportRange,
    ) -> Result<Vec<ApplicationsReportRow>, ReportServiceError> {
        range.validate()?;
        let rows: Vec<_> = self
            .repository
            .applications_created(range)?
            .into_iter()
            .map(|record| ApplicationsReportRow {
                application_id: record.id.0,
                application_type: record.application_type,
                permit_type: record.permit_type,
                status: record.status(),
                applicant_name: record.personal.full_name(),
                applicant_id: record.applicant_id.map(|id| id.0),
                app_number: record.processing.app_number,
                payment_method: record.payment.payment_method,
                processing_fee_cents: record.payment.processing_fee_cents,
                donation_cents: record.payment.donation_cents,
                total_cents: record.payment.total_cents(),
                created_at: record.created_at,
            })
            .collect();
        info!(from = %range.from, to = %range.to, rows = rows.len(), "applications report generated");
        Ok(rows)
    }

    pub fn permit_holders_report(
        &self,
        range: ReportRange,
    ) -> Result<Vec<PermitHolderRow>, ReportServiceError> {
        range.validate()?;
        let rows: Vec<_> = self
            .repository
            .permit_holders(range)?
            .into_iter()
            .map(|(applicant, permit)| PermitHolderRow {
                applicant_id: applicant.id.0,
                rcd_user_id: applicant.rcd_user_id,
                applicant_name: applicant.personal.full_name(),
                phone: applicant.personal.phone,
                email: applicant.personal.email,
                status: applicant.status,
                rcd_permit_id: permit.rcd_permit_id,
                permit_type: permit.permit_type,
                expiry_date: permit.expiry_date,
            })
            .collect();
        info!(from = %range.from, to = %range.to, rows = rows.len(), "permit holders report generated");
        Ok(rows)
    }

    pub fn accountant_report(
        &self,
        range: ReportRange,
    ) -> Result<AccountantReport, ReportServiceError> {
        range.validate()?;
        let mut ledger = AccountantLedger::new();
        for record in self.repository.applications_completed(range)? {
            ledger.record(&record.payment);
        }
        Ok(ledger.summary(range))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ReportServiceError {
    #[error(transparent)]
    Validation(#[from] ValidationErrors),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
