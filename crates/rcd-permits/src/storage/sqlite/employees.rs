use rusqlite::{params, OptionalExtension, Row};

use super::{encode_enum, enum_column, SqliteStore};
use crate::pagination::{Page, PageRequest};
use crate::storage::RepositoryError;
use crate::workflows::employees::{EmployeeId, EmployeeInput, EmployeeRecord, EmployeeRepository};

const COLUMNS: &str = "id, email, first_name, last_name, role, active";

fn employee_from_row(row: &Row<'_>) -> rusqlite::Result<EmployeeRecord> {
    Ok(EmployeeRecord {
        id: EmployeeId(row.get(0)?),
        email: row.get(1)?,
        first_name: row.get(2)?,
        last_name: row.get(3)?,
        role: enum_column(row, 4)?,
        active: row.get(5)?,
    })
}

impl EmployeeRepository for SqliteStore {
    fn insert_employee(&self, input: EmployeeInput) -> Result<EmployeeRecord, RepositoryError> {
        let conn = self.conn()?;
        let inserted = conn.execute(
            "INSERT INTO employees (email, first_name, last_name, role, active)
             VALUES (?1, ?2, ?3, ?4, 1)
             ON CONFLICT(email) DO NOTHING",
            params![
                input.email,
                input.first_name,
                input.last_name,
                encode_enum(&input.role)?
            ],
        )?;
        if inserted == 0 {
            return Err(RepositoryError::Conflict(format!(
                "employee e-mail {}",
                input.email
            )));
        }

        Ok(EmployeeRecord {
            id: EmployeeId(conn.last_insert_rowid()),
            email: input.email,
            first_name: input.first_name,
            last_name: input.last_name,
            role: input.role,
            active: true,
        })
    }

    fn fetch_employee(&self, id: EmployeeId) -> Result<Option<EmployeeRecord>, RepositoryError> {
        let conn = self.conn()?;
        let record = conn
            .query_row(
                &format!("SELECT {COLUMNS} FROM employees WHERE id = ?1"),
                params![id.0],
                employee_from_row,
            )
            .optional()?;
        Ok(record)
    }

    fn fetch_employee_by_email(
        &self,
        email: &str,
    ) -> Result<Option<EmployeeRecord>, RepositoryError> {
        let conn = self.conn()?;
        let record = conn
            .query_row(
                &format!("SELECT {COLUMNS} FROM employees WHERE email = ?1 COLLATE NOCASE"),
                params![email.trim()],
                employee_from_row,
            )
            .optional()?;
        Ok(record)
    }

    fn update_employee(&self, record: &EmployeeRecord) -> Result<(), RepositoryError> {
        let conn = self.conn()?;
        let updated = conn.execute(
            "UPDATE employees SET email = ?2, first_name = ?3, last_name = ?4, role = ?5, active = ?6
             WHERE id = ?1",
            params![
                record.id.0,
                record.email,
                record.first_name,
                record.last_name,
                encode_enum(&record.role)?,
                record.active
            ],
        )?;
        if updated == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    fn list_employees(
        &self,
        active: Option<bool>,
        page: PageRequest,
    ) -> Result<Page<EmployeeRecord>, RepositoryError> {
        let conn = self.conn()?;
        let total: i64 = conn.query_row(
            "SELECT COUNT(*) FROM employees WHERE ?1 IS NULL OR active = ?1",
            params![active],
            |row| row.get(0),
        )?;

        let mut stmt = conn.prepare(&format!(
            "SELECT {COLUMNS} FROM employees WHERE ?1 IS NULL OR active = ?1
             ORDER BY last_name COLLATE NOCASE, first_name COLLATE NOCASE, id
             LIMIT ?2 OFFSET ?3"
        ))?;
        let items = stmt
            .query_map(params![active, page.limit, page.offset], employee_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Page::new(items, total.max(0) as u64, page))
    }
}
