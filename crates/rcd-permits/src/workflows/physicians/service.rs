use std::sync::Arc;

use chrono::Utc;
use tracing::info;

use super::domain::{PhysicianDetails, PhysicianFilter, PhysicianRecord, PhysicianStatus};
use super::repository::PhysicianRepository;
use crate::pagination::{Page, PageRequest};
use crate::storage::RepositoryError;
use crate::workflows::validation::ValidationErrors;

pub struct PhysicianService<R: ?Sized> {
    repository: Arc<R>,
}

impl<R> PhysicianService<R>
where
    R: PhysicianRepository + ?Sized + 'static,
{
    pub fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }

    pub fn get(&self, msp_number: &str) -> Result<PhysicianRecord, PhysicianServiceError> {
        let record = self
            .repository
            .fetch_physician(msp_number.trim())?
            .ok_or(RepositoryError::NotFound)?;
        Ok(record)
    }

    pub fn search(
        &self,
        filter: &PhysicianFilter,
        page: PageRequest,
    ) -> Result<Page<PhysicianRecord>, PhysicianServiceError> {
        Ok(self.repository.search_physicians(filter, page)?)
    }

    pub fn upsert(
        &self,
        details: PhysicianDetails,
    ) -> Result<PhysicianRecord, PhysicianServiceError> {
        let mut errors = ValidationErrors::new();
        details.validate("physician", &mut errors);
        errors.into_result()?;

        let record = self
            .repository
            .upsert_physician(details.normalized(), Utc::now())?;
        info!(msp_number = %record.details.msp_number, "physician saved");
        Ok(record)
    }

    /// Edit a physician already on file; the MSP number cannot change.
    pub fn update(
        &self,
        msp_number: &str,
        mut details: PhysicianDetails,
    ) -> Result<PhysicianRecord, PhysicianServiceError> {
        let existing = self.get(msp_number)?;
        details.msp_number = existing.details.msp_number;
        self.upsert(details)
    }

    pub fn set_status(
        &self,
        msp_number: &str,
        status: PhysicianStatus,
    ) -> Result<PhysicianRecord, PhysicianServiceError> {
        let record = self
            .repository
            .set_physician_status(msp_number.trim(), status, Utc::now())?;
        info!(msp_number = %record.details.msp_number, ?status, "physician status changed");
        Ok(record)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PhysicianServiceError {
    #[error(transparent)]
    Validation(#[from] ValidationErrors),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
