use chrono::{DateTime, Utc};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};

use super::{
    encode_enum, encode_json, enum_column, json_column, like_pattern, Conditions, SqliteStore,
};
use crate::pagination::{Page, PageRequest};
use crate::storage::RepositoryError;
use crate::workflows::physicians::{
    PhysicianDetails, PhysicianFilter, PhysicianRecord, PhysicianRepository, PhysicianStatus,
};

const COLUMNS: &str =
    "msp_number, first_name, last_name, phone, address, notes, status, created_at, updated_at";

fn physician_from_row(row: &Row<'_>) -> rusqlite::Result<PhysicianRecord> {
    Ok(PhysicianRecord {
        details: PhysicianDetails {
            msp_number: row.get(0)?,
            first_name: row.get(1)?,
            last_name: row.get(2)?,
            phone: row.get(3)?,
            address: json_column(row, 4)?,
            notes: row.get(5)?,
        },
        status: enum_column(row, 6)?,
        created_at: row.get(7)?,
        updated_at: row.get(8)?,
    })
}

pub(super) fn fetch(
    conn: &Connection,
    msp_number: &str,
) -> Result<Option<PhysicianRecord>, RepositoryError> {
    let record = conn
        .query_row(
            &format!("SELECT {COLUMNS} FROM physicians WHERE msp_number = ?1"),
            params![msp_number],
            physician_from_row,
        )
        .optional()?;
    Ok(record)
}

/// Insert or refresh a physician; also used inside the completion transaction.
pub(super) fn upsert(
    conn: &Connection,
    details: &PhysicianDetails,
    at: DateTime<Utc>,
) -> Result<(), RepositoryError> {
    conn.execute(
        "INSERT INTO physicians
             (msp_number, first_name, last_name, phone, address, notes, status, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8)
         ON CONFLICT(msp_number) DO UPDATE SET
             first_name = excluded.first_name,
             last_name = excluded.last_name,
             phone = excluded.phone,
             address = excluded.address,
             notes = excluded.notes,
             updated_at = excluded.updated_at",
        params![
            details.msp_number,
            details.first_name,
            details.last_name,
            details.phone,
            encode_json(&details.address)?,
            details.notes,
            encode_enum(&PhysicianStatus::Active)?,
            at
        ],
    )?;
    Ok(())
}

impl PhysicianRepository for SqliteStore {
    fn fetch_physician(&self, msp_number: &str) -> Result<Option<PhysicianRecord>, RepositoryError> {
        let conn = self.conn()?;
        fetch(&conn, msp_number.trim())
    }

    fn search_physicians(
        &self,
        filter: &PhysicianFilter,
        page: PageRequest,
    ) -> Result<Page<PhysicianRecord>, RepositoryError> {
        let mut conditions = Conditions::default();
        if let Some(pattern) = like_pattern(filter.search.as_deref()) {
            conditions.bind(
                "(msp_number LIKE ? OR first_name LIKE ? OR last_name LIKE ?)",
                Value::Text(pattern),
            );
        }
        if let Some(status) = filter.status {
            conditions.bind("status = ?", Value::Text(encode_enum(&status)?));
        }
        let where_clause = conditions.where_clause();

        let conn = self.conn()?;
        let total: i64 = conn.query_row(
            &format!("SELECT COUNT(*) FROM physicians WHERE {where_clause}"),
            params_from_iter(conditions.values()),
            |row| row.get(0),
        )?;

        let (limit, values) = conditions.paged(page);
        let mut stmt = conn.prepare(&format!(
            "SELECT {COLUMNS} FROM physicians WHERE {where_clause}
             ORDER BY last_name COLLATE NOCASE, first_name COLLATE NOCASE, msp_number {limit}"
        ))?;
        let items = stmt
            .query_map(params_from_iter(values.iter()), physician_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Page::new(items, total.max(0) as u64, page))
    }

    fn upsert_physician(
        &self,
        details: PhysicianDetails,
        at: DateTime<Utc>,
    ) -> Result<PhysicianRecord, RepositoryError> {
        let conn = self.conn()?;
        upsert(&conn, &details, at)?;
        fetch(&conn, &details.msp_number)?.ok_or(RepositoryError::NotFound)
    }

    fn set_physician_status(
        &self,
        msp_number: &str,
        status: PhysicianStatus,
        at: DateTime<Utc>,
    ) -> Result<PhysicianRecord, RepositoryError> {
        let conn = self.conn()?;
        let updated = conn.execute(
            "UPDATE physicians SET status = ?2, updated_at = ?3 WHERE msp_number = ?1",
            params![msp_number.trim(), encode_enum(&status)?, at],
        )?;
        if updated == 0 {
            return Err(RepositoryError::NotFound);
        }
        fetch(&conn, msp_number.trim())?.ok_or(RepositoryError::NotFound)
    }
}
