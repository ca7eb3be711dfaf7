use super::domain::{EmployeeId, EmployeeInput, EmployeeRecord};
use crate::pagination::{Page, PageRequest};
use crate::storage::RepositoryError;

pub trait EmployeeRepository: Send + Sync {
    /// Fails with `Conflict` when the e-mail is already registered.
    fn insert_employee(&self, input: EmployeeInput) -> Result<EmployeeRecord, RepositoryError>;
    fn fetch_employee(&self, id: EmployeeId) -> Result<Option<EmployeeRecord>, RepositoryError>;
    fn fetch_employee_by_email(
        &self,
        email: &str,
    ) -> Result<Option<EmployeeRecord>, RepositoryError>;
    fn update_employee(&self, record: &EmployeeRecord) -> Result<(), RepositoryError>;
    fn list_employees(
        &self,
        active: Option<bool>,
        page: PageRequest,
    ) -> Result<Page<EmployeeRecord>, RepositoryError>;
}
