//! Persistence for every workflow. Repository traits live next to their workflows;
//! this module owns the shared error type and the SQLite implementation.

mod sqlite;

pub use sqlite::SqliteStore;

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists: {0}")]
    Conflict(String),
    #[error("record not found")]
    NotFound,
    #[error("storage unavailable: {0}")]
    Unavailable(String),
    #[error("stored record could not be decoded: {0}")]
    Corrupt(String),
}

impl From<rusqlite::Error> for RepositoryError {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            rusqlite::Error::QueryReturnedNoRows => RepositoryError::NotFound,
            rusqlite::Error::SqliteFailure(failure, message)
                if failure.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                RepositoryError::Conflict(
                    message.unwrap_or_else(|| "constraint violation".to_string()),
                )
            }
            rusqlite::Error::FromSqlConversionFailure(column, _, source) => {
                RepositoryError::Corrupt(format!("column {column}: {source}"))
            }
            other => RepositoryError::Unavailable(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for RepositoryError {
    fn from(value: serde_json::Error) -> Self {
        RepositoryError::Corrupt(value.to_string())
    }
}
