//! Mapping from service errors to GraphQL errors carrying an extension `code`.

use async_graphql::{ErrorExtensions, Value};
use tracing::error;

use crate::storage::RepositoryError;
use crate::workflows::applicants::ApplicantServiceError;
use crate::workflows::applications::{ApplicationServiceError, CompletionError};
use crate::workflows::employees::EmployeeServiceError;
use crate::workflows::physicians::PhysicianServiceError;
use crate::workflows::reports::ReportServiceError;
use crate::workflows::validation::ValidationErrors;

pub const VALIDATION: &str = "VALIDATION";
pub const NOT_FOUND: &str = "NOT_FOUND";
pub const CONFLICT: &str = "CONFLICT";
pub const FORBIDDEN: &str = "FORBIDDEN";
pub const INVALID_TRANSITION: &str = "INVALID_TRANSITION";
pub const INTERNAL: &str = "INTERNAL";

pub(crate) trait IntoGraphqlError {
    fn into_graphql(self) -> async_graphql::Error;
}

pub(crate) trait GraphqlResultExt<T> {
    fn graphql(self) -> async_graphql::Result<T>;
}

impl<T, E> GraphqlResultExt<T> for Result<T, E>
where
    E: IntoGraphqlError,
{
    fn graphql(self) -> async_graphql::Result<T> {
        self.map_err(IntoGraphqlError::into_graphql)
    }
}

pub(crate) fn coded(message: impl Into<String>, code: &'static str) -> async_graphql::Error {
    async_graphql::Error::new(message).extend_with(|_, ext| ext.set("code", code))
}

impl IntoGraphqlError for ValidationErrors {
    fn into_graphql(self) -> async_graphql::Error {
        let fields = serde_json::to_value(&self.errors)
            .ok()
            .and_then(|json| Value::from_json(json).ok())
            .unwrap_or(Value::Null);
        async_graphql::Error::new(self.to_string()).extend_with(|_, ext| {
            ext.set("code", VALIDATION);
            ext.set("fields", fields.clone());
        })
    }
}

impl IntoGraphqlError for RepositoryError {
    fn into_graphql(self) -> async_graphql::Error {
        match self {
            RepositoryError::NotFound => coded("record not found", NOT_FOUND),
            RepositoryError::Conflict(message) => coded(message, CONFLICT),
            RepositoryError::Unavailable(_) | RepositoryError::Corrupt(_) => {
                error!(error = %self, "storage failure while resolving request");
                coded("internal error", INTERNAL)
            }
        }
    }
}

impl IntoGraphqlError for ApplicationServiceError {
    fn into_graphql(self) -> async_graphql::Error {
        match self {
            ApplicationServiceError::Validation(errors) => errors.into_graphql(),
            ApplicationServiceError::Repository(err) => err.into_graphql(),
            ApplicationServiceError::UnknownApplicant(_) => coded(self.to_string(), NOT_FOUND),
            ApplicationServiceError::AppNumberInUse(_) => coded(self.to_string(), CONFLICT),
            ApplicationServiceError::Completion(CompletionError::MissingApplicant(_)) => {
                coded(self.to_string(), NOT_FOUND)
            }
            ApplicationServiceError::Processing(_)
            | ApplicationServiceError::Completion(_)
            | ApplicationServiceError::ApplicantInactive(_)
            | ApplicationServiceError::NoActivePermit(_)
            | ApplicationServiceError::Locked(_) => coded(self.to_string(), INVALID_TRANSITION),
        }
    }
}

impl IntoGraphqlError for ApplicantServiceError {
    fn into_graphql(self) -> async_graphql::Error {
        match self {
            ApplicantServiceError::Validation(errors) => errors.into_graphql(),
            ApplicantServiceError::Repository(err) => err.into_graphql(),
            ApplicantServiceError::Identity(failure) => {
                async_graphql::Error::new(failure.to_string()).extend_with(|_, ext| {
                    ext.set("code", FORBIDDEN);
                    ext.set("reason", format!("{failure:?}"));
                })
            }
        }
    }
}

impl IntoGraphqlError for PhysicianServiceError {
    fn into_graphql(self) -> async_graphql::Error {
        match self {
            PhysicianServiceError::Validation(errors) => errors.into_graphql(),
            PhysicianServiceError::Repository(err) => err.into_graphql(),
        }
    }
}

impl IntoGraphqlError for EmployeeServiceError {
    fn into_graphql(self) -> async_graphql::Error {
        match self {
            EmployeeServiceError::Validation(errors) => errors.into_graphql(),
            EmployeeServiceError::Repository(err) => err.into_graphql(),
        }
    }
}

impl IntoGraphqlError for ReportServiceError {
    fn into_graphql(self) -> async_graphql::Error {
        match self {
            ReportServiceError::Validation(errors) => errors.into_graphql(),
            ReportServiceError::Repository(err) => err.into_graphql(),
        }
    }
}
