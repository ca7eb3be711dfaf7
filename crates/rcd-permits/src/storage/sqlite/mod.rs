//! SQLite-backed store implementing every repository trait.
//!
//! Nested sections (addresses, payment, medical details, processing state) are kept as
//! JSON columns; the columns used for filtering, uniqueness and foreign keys are
//! stored alongside them.

mod applicants;
mod applications;
mod employees;
mod physicians;
mod reports;

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use rusqlite::types::{Type, Value};
use rusqlite::{Connection, Row};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::info;

use super::RepositoryError;
use crate::pagination::PageRequest;

const SCHEMA: &str = r#"
    PRAGMA foreign_keys = ON;
    CREATE TABLE IF NOT EXISTS employees (
        id          INTEGER PRIMARY KEY AUTOINCREMENT,
        email       TEXT NOT NULL UNIQUE,
        first_name  TEXT NOT NULL,
        last_name   TEXT NOT NULL,
        role        TEXT NOT NULL,
        active      INTEGER NOT NULL DEFAULT 1
    );
    CREATE TABLE IF NOT EXISTS physicians (
        msp_number  TEXT PRIMARY KEY,
        first_name  TEXT NOT NULL,
        last_name   TEXT NOT NULL,
        phone       TEXT NOT NULL,
        address     TEXT NOT NULL,
        notes       TEXT,
        status      TEXT NOT NULL,
        created_at  TEXT NOT NULL,
        updated_at  TEXT NOT NULL
    );
    CREATE TABLE IF NOT EXISTS applicants (
        id                    INTEGER PRIMARY KEY AUTOINCREMENT,
        rcd_user_id           INTEGER NOT NULL UNIQUE,
        first_name            TEXT NOT NULL,
        last_name             TEXT NOT NULL,
        personal              TEXT NOT NULL,
        date_of_birth         TEXT NOT NULL,
        gender                TEXT NOT NULL,
        other_gender          TEXT,
        status                TEXT NOT NULL,
        inactive_reason       TEXT,
        notes                 TEXT,
        medical               TEXT NOT NULL,
        physician_msp_number  TEXT NOT NULL REFERENCES physicians (msp_number),
        guardian              TEXT,
        created_at            TEXT NOT NULL,
        updated_at            TEXT NOT NULL
    );
    CREATE TABLE IF NOT EXISTS applications (
        id                INTEGER PRIMARY KEY AUTOINCREMENT,
        application_type  TEXT NOT NULL,
        permit_type       TEXT NOT NULL,
        status            TEXT NOT NULL,
        first_name        TEXT NOT NULL,
        last_name         TEXT NOT NULL,
        personal          TEXT NOT NULL,
        payment           TEXT NOT NULL,
        details           TEXT NOT NULL,
        applicant_id      INTEGER REFERENCES applicants (id),
        processing        TEXT NOT NULL,
        app_number        INTEGER,
        created_at        TEXT NOT NULL,
        updated_at        TEXT NOT NULL,
        completed_at      TEXT
    );
    CREATE INDEX IF NOT EXISTS applications_status ON applications (status);
    CREATE INDEX IF NOT EXISTS applications_app_number ON applications (app_number);
    CREATE TABLE IF NOT EXISTS permits (
        rcd_permit_id   INTEGER PRIMARY KEY,
        permit_type     TEXT NOT NULL,
        expiry_date     TEXT NOT NULL,
        active          INTEGER NOT NULL,
        applicant_id    INTEGER NOT NULL REFERENCES applicants (id),
        application_id  INTEGER NOT NULL REFERENCES applications (id),
        issued_on       TEXT NOT NULL
    );
    CREATE INDEX IF NOT EXISTS permits_applicant ON permits (applicant_id);
    CREATE TABLE IF NOT EXISTS invoice_sequence (
        id    INTEGER PRIMARY KEY CHECK (id = 1),
        last  INTEGER NOT NULL
    );
"#;

/// Single-connection store; callers share it behind an `Arc`.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, RepositoryError> {
        let path = path.as_ref();
        let conn = if path.as_os_str() == ":memory:" {
            Connection::open_in_memory()?
        } else {
            Connection::open(path)?
        };
        let store = Self::migrate(conn)?;
        info!(path = %path.display(), "permit store opened");
        Ok(store)
    }

    pub fn open_in_memory() -> Result<Self, RepositoryError> {
        Self::migrate(Connection::open_in_memory()?)
    }

    fn migrate(conn: Connection) -> Result<Self, RepositoryError> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub(crate) fn conn(&self) -> Result<MutexGuard<'_, Connection>, RepositoryError> {
        self.conn
            .lock()
            .map_err(|_| RepositoryError::Unavailable("connection mutex poisoned".to_string()))
    }
}

/// Text form of a unit enum, matching its serde name.
pub(crate) fn encode_enum<T: Serialize>(value: &T) -> Result<String, RepositoryError> {
    match serde_json::to_value(value)? {
        serde_json::Value::String(text) => Ok(text),
        other => Err(RepositoryError::Corrupt(format!(
            "expected a unit variant, got {other}"
        ))),
    }
}

pub(crate) fn encode_json<T: Serialize>(value: &T) -> Result<String, RepositoryError> {
    Ok(serde_json::to_string(value)?)
}

/// Read a TEXT column holding a serde unit variant.
pub(crate) fn enum_column<T: DeserializeOwned>(row: &Row<'_>, index: usize) -> rusqlite::Result<T> {
    let text: String = row.get(index)?;
    serde_json::from_value(serde_json::Value::String(text))
        .map_err(|err| rusqlite::Error::FromSqlConversionFailure(index, Type::Text, Box::new(err)))
}

/// Read a TEXT column holding a JSON document.
pub(crate) fn json_column<T: DeserializeOwned>(row: &Row<'_>, index: usize) -> rusqlite::Result<T> {
    let text: String = row.get(index)?;
    serde_json::from_str(&text)
        .map_err(|err| rusqlite::Error::FromSqlConversionFailure(index, Type::Text, Box::new(err)))
}

pub(crate) fn optional_json_column<T: DeserializeOwned>(
    row: &Row<'_>,
    index: usize,
) -> rusqlite::Result<Option<T>> {
    let text: Option<String> = row.get(index)?;
    text.map(|text| {
        serde_json::from_str(&text).map_err(|err| {
            rusqlite::Error::FromSqlConversionFailure(index, Type::Text, Box::new(err))
        })
    })
    .transpose()
}

/// `%term%` pattern for LIKE filters, or `None` for a blank search.
pub(crate) fn like_pattern(search: Option<&str>) -> Option<String> {
    search
        .map(str::trim)
        .filter(|term| !term.is_empty())
        .map(|term| format!("%{term}%"))
}

/// WHERE clause assembled from optional filters with numbered parameters.
#[derive(Debug, Default)]
pub(crate) struct Conditions {
    clauses: Vec<String>,
    values: Vec<Value>,
}

impl Conditions {
    /// Add `clause`, binding every `?` in it to `value`.
    pub(crate) fn bind(&mut self, clause: &str, value: Value) {
        self.values.push(value);
        let placeholder = format!("?{}", self.values.len());
        self.clauses.push(clause.replace('?', &placeholder));
    }

    pub(crate) fn where_clause(&self) -> String {
        if self.clauses.is_empty() {
            "1 = 1".to_string()
        } else {
            self.clauses.join(" AND ")
        }
    }

    pub(crate) fn values(&self) -> &[Value] {
        &self.values
    }

    /// `LIMIT/OFFSET` suffix plus the full parameter list for the page query.
    pub(crate) fn paged(&self, page: PageRequest) -> (String, Vec<Value>) {
        let mut values = self.values.clone();
        values.push(Value::Integer(i64::from(page.limit)));
        values.push(Value::Integer(i64::from(page.offset)));
        let limit = values.len() - 1;
        (format!("LIMIT ?{limit} OFFSET ?{}", limit + 1), values)
    }
}
