use super::domain::{ApplicantFilter, ApplicantId, ApplicantRecord, Permit};
use crate::pagination::{Page, PageRequest};
use crate::storage::RepositoryError;

pub trait ApplicantRepository: Send + Sync {
    fn fetch_applicant(&self, id: ApplicantId) -> Result<Option<ApplicantRecord>, RepositoryError>;
    fn fetch_applicant_by_rcd_user_id(
        &self,
        rcd_user_id: i64,
    ) -> Result<Option<ApplicantRecord>, RepositoryError>;
    fn search_applicants(
        &self,
        filter: &ApplicantFilter,
        page: PageRequest,
    ) -> Result<Page<ApplicantRecord>, RepositoryError>;
    fn update_applicant(&self, record: &ApplicantRecord) -> Result<(), RepositoryError>;
    /// Every permit issued to the applicant, newest first.
    fn applicant_permits(&self, id: ApplicantId) -> Result<Vec<Permit>, RepositoryError>;

    fn active_permit(&self, id: ApplicantId) -> Result<Option<Permit>, RepositoryError> {
        Ok(self
            .applicant_permits(id)?
            .into_iter()
            .find(|permit| permit.active))
    }
}
