use super::domain::ReportRange;
use crate::storage::RepositoryError;
use crate::workflows::applicants::domain::{ApplicantRecord, Permit};
use crate::workflows::applications::repository::ApplicationRecord;

pub trait ReportRepository: Send + Sync {
    /// Applications created within the range, oldest first.
    fn applications_created(
        &self,
        range: ReportRange,
    ) -> Result<Vec<ApplicationRecord>, RepositoryError>;
    /// Applications completed within the range.
    fn applications_completed(
        &self,
        range: ReportRange,
    ) -> Result<Vec<ApplicationRecord>, RepositoryError>;
    /// Holders whose active permit expires within the range, soonest first.
    fn permit_holders(
        &self,
        range: ReportRange,
    ) -> Result<Vec<(ApplicantRecord, Permit)>, RepositoryError>;
}
