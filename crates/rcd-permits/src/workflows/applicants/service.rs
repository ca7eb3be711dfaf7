use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use tracing::info;

use super::domain::{ApplicantFilter, ApplicantId, ApplicantRecord, ApplicantStatus, Permit};
use super::identity::{verify_identity, IdentityClaim, IdentityVerificationFailure, VerifiedIdentity};
use super::repository::ApplicantRepository;
use crate::pagination::{Page, PageRequest};
use crate::storage::RepositoryError;
use crate::workflows::people::{Guardian, PersonalInformation};
use crate::workflows::validation::{normalize_address, normalize_personal, ValidationErrors};

/// Service for permit holder records outside the application workflow.
pub struct ApplicantService<R: ?Sized> {
    repository: Arc<R>,
}

impl<R> ApplicantService<R>
where
    R: ApplicantRepository + ?Sized + 'static,
{
    pub fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }

    pub fn get(&self, id: ApplicantId) -> Result<ApplicantRecord, ApplicantServiceError> {
        let record = self
            .repository
            .fetch_applicant(id)?
            .ok_or(RepositoryError::NotFound)?;
        Ok(record)
    }

    pub fn search(
        &self,
        filter: &ApplicantFilter,
        page: PageRequest,
    ) -> Result<Page<ApplicantRecord>, ApplicantServiceError> {
        Ok(self.repository.search_applicants(filter, page)?)
    }

    pub fn permits(&self, id: ApplicantId) -> Result<Vec<Permit>, ApplicantServiceError> {
        Ok(self.repository.applicant_permits(id)?)
    }

    pub fn active_permit(&self, id: ApplicantId) -> Result<Option<Permit>, ApplicantServiceError> {
        Ok(self.repository.active_permit(id)?)
    }

    pub fn update_personal_information(
        &self,
        id: ApplicantId,
        personal: PersonalInformation,
    ) -> Result<ApplicantRecord, ApplicantServiceError> {
        let mut errors = ValidationErrors::new();
        errors.check_personal("personal", &personal);
        errors.into_result()?;

        let mut record = self.get(id)?;
        record.personal = normalize_personal(personal);
        record.updated_at = Utc::now();
        self.repository.update_applicant(&record)?;
        Ok(record)
    }

    /// Replace or clear the guardian on file.
    pub fn update_guardian(
        &self,
        id: ApplicantId,
        guardian: Option<Guardian>,
    ) -> Result<ApplicantRecord, ApplicantServiceError> {
        if let Some(guardian) = guardian.as_ref() {
            let mut errors = ValidationErrors::new();
            errors.check_guardian("guardian", guardian);
            errors.into_result()?;
        }

        let mut record = self.get(id)?;
        record.guardian = guardian.map(|mut guardian| {
            guardian.address = normalize_address(guardian.address);
            guardian
        });
        record.updated_at = Utc::now();
        self.repository.update_applicant(&record)?;
        Ok(record)
    }

    pub fn set_inactive(
        &self,
        id: ApplicantId,
        reason: &str,
    ) -> Result<ApplicantRecord, ApplicantServiceError> {
        let reason = reason.trim();
        if reason.is_empty() {
            let mut errors = ValidationErrors::new();
            errors.push("reason", "is required to deactivate an applicant");
            return Err(errors.into());
        }

        let mut record = self.get(id)?;
        record.status = ApplicantStatus::Inactive;
        record.inactive_reason = Some(reason.to_string());
        record.updated_at = Utc::now();
        self.repository.update_applicant(&record)?;
        info!(applicant_id = %id, "applicant deactivated");
        Ok(record)
    }

    pub fn set_active(&self, id: ApplicantId) -> Result<ApplicantRecord, ApplicantServiceError> {
        let mut record = self.get(id)?;
        record.status = ApplicantStatus::Active;
        record.inactive_reason = None;
        record.updated_at = Utc::now();
        self.repository.update_applicant(&record)?;
        info!(applicant_id = %id, "applicant reactivated");
        Ok(record)
    }

    pub fn verify_identity(
        &self,
        claim: &IdentityClaim,
        today: NaiveDate,
    ) -> Result<VerifiedIdentity, ApplicantServiceError> {
        let applicant = self
            .repository
            .fetch_applicant_by_rcd_user_id(claim.rcd_user_id)?;
        let permit = match applicant.as_ref() {
            Some(applicant) => self.repository.active_permit(applicant.id)?,
            None => None,
        };

        let verified = verify_identity(applicant.as_ref(), permit.as_ref(), claim, today)?;
        info!(rcd_user_id = verified.rcd_user_id, "renewal identity verified");
        Ok(verified)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ApplicantServiceError {
    #[error(transparent)]
    Validation(#[from] ValidationErrors),
    #[error(transparent)]
    Identity(#[from] IdentityVerificationFailure),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
