use std::sync::Arc;

use tracing::info;

use super::domain::{EmployeeId, EmployeeInput, EmployeeRecord};
use super::repository::EmployeeRepository;
use crate::pagination::{Page, PageRequest};
use crate::storage::RepositoryError;
use crate::workflows::validation::ValidationErrors;

pub struct EmployeeService<R: ?Sized> {
    repository: Arc<R>,
}

impl<R> EmployeeService<R>
where
    R: EmployeeRepository + ?Sized + 'static,
{
    pub fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }

    pub fn get(&self, id: EmployeeId) -> Result<EmployeeRecord, EmployeeServiceError> {
        let record = self
            .repository
            .fetch_employee(id)?
            .ok_or(RepositoryError::NotFound)?;
        Ok(record)
    }

    pub fn find_by_email(&self, email: &str) -> Result<Option<EmployeeRecord>, EmployeeServiceError> {
        Ok(self
            .repository
            .fetch_employee_by_email(&email.trim().to_ascii_lowercase())?)
    }

    pub fn list(
        &self,
        active: Option<bool>,
        page: PageRequest,
    ) -> Result<Page<EmployeeRecord>, EmployeeServiceError> {
        Ok(self.repository.list_employees(active, page)?)
    }

    pub fn create(&self, input: EmployeeInput) -> Result<EmployeeRecord, EmployeeServiceError> {
        let input = validate(input)?;
        let record = self.repository.insert_employee(input)?;
        info!(employee_id = %record.id, role = record.role.label(), "employee created");
        Ok(record)
    }

    pub fn update(
        &self,
        id: EmployeeId,
        input: EmployeeInput,
    ) -> Result<EmployeeRecord, EmployeeServiceError> {
        let input = validate(input)?;
        let mut record = self.get(id)?;

        if record.email != input.email {
            if let Some(existing) = self.repository.fetch_employee_by_email(&input.email)? {
                if existing.id != id {
                    return Err(RepositoryError::Conflict(format!(
                        "e-mail {} already belongs to another employee",
                        input.email
                    ))
                    .into());
                }
            }
        }

        record.email = input.email;
        record.first_name = input.first_name;
        record.last_name = input.last_name;
        record.role = input.role;
        self.repository.update_employee(&record)?;
        Ok(record)
    }

    pub fn set_active(
        &self,
        id: EmployeeId,
        active: bool,
    ) -> Result<EmployeeRecord, EmployeeServiceError> {
        let mut record = self.get(id)?;
        record.active = active;
        self.repository.update_employee(&record)?;
        info!(employee_id = %id, active, "employee access changed");
        Ok(record)
    }
}

fn validate(mut input: EmployeeInput) -> Result<EmployeeInput, ValidationErrors> {
    let mut errors = ValidationErrors::new();
    input.email = input.email.trim().to_ascii_lowercase();
    input.first_name = input.first_name.trim().to_string();
    input.last_name = input.last_name.trim().to_string();

    if !input.email.contains('@') {
        errors.push("employee.email", "must be an e-mail address");
    }
    errors.require_text("employee.firstName", &input.first_name);
    errors.require_text("employee.lastName", &input.last_name);
    errors.into_result()?;
    Ok(input)
}

#[derive(Debug, thiserror::Error)]
pub enum EmployeeServiceError {
    #[error(transparent)]
    Validation(#[from] ValidationErrors),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
