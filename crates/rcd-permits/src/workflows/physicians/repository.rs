use chrono::{DateTime, Utc};

use super::domain::{PhysicianDetails, PhysicianFilter, PhysicianRecord, PhysicianStatus};
use crate::pagination::{Page, PageRequest};
use crate::storage::RepositoryError;

pub trait PhysicianRepository: Send + Sync {
    fn fetch_physician(&self, msp_number: &str) -> Result<Option<PhysicianRecord>, RepositoryError>;
    fn search_physicians(
        &self,
        filter: &PhysicianFilter,
        page: PageRequest,
    ) -> Result<Page<PhysicianRecord>, RepositoryError>;
    /// Insert a new physician or overwrite the details of the existing MSP number.
    fn upsert_physician(
        &self,
        details: PhysicianDetails,
        at: DateTime<Utc>,
    ) -> Result<PhysicianRecord, RepositoryError>;
    fn set_physician_status(
        &self,
        msp_number: &str,
        status: PhysicianStatus,
        at: DateTime<Utc>,
    ) -> Result<PhysicianRecord, RepositoryError>;
}
