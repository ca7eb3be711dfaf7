use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};

use super::{
    encode_enum, encode_json, enum_column, json_column, like_pattern, optional_json_column,
    Conditions, SqliteStore,
};
use crate::pagination::{Page, PageRequest};
use crate::storage::RepositoryError;
use crate::workflows::applicants::domain::{
    ApplicantFilter, ApplicantId, ApplicantRecord, ApplicantStatus, Permit,
};
use crate::workflows::applicants::ApplicantRepository;
use crate::workflows::applications::completion::{NewApplicant, PermitIssue};
use crate::workflows::applications::domain::ApplicationId;
use crate::workflows::people::PersonalInformation;

const COLUMNS: &str = "id, rcd_user_id, personal, date_of_birth, gender, other_gender, status, \
                       inactive_reason, notes, medical, physician_msp_number, guardian, \
                       created_at, updated_at";

const PERMIT_COLUMNS: &str =
    "rcd_permit_id, permit_type, expiry_date, active, applicant_id, application_id, issued_on";

pub(super) fn applicant_from_row(row: &Row<'_>) -> rusqlite::Result<ApplicantRecord> {
    Ok(ApplicantRecord {
        id: ApplicantId(row.get(0)?),
        rcd_user_id: row.get(1)?,
        personal: json_column(row, 2)?,
        date_of_birth: row.get(3)?,
        gender: enum_column(row, 4)?,
        other_gender: row.get(5)?,
        status: enum_column(row, 6)?,
        inactive_reason: row.get(7)?,
        notes: row.get(8)?,
        medical: json_column(row, 9)?,
        physician_msp_number: row.get(10)?,
        guardian: optional_json_column(row, 11)?,
        created_at: row.get(12)?,
        updated_at: row.get(13)?,
    })
}

/// Permit columns read at `offset` so joins can reuse the mapping.
pub(super) fn permit_from_row(row: &Row<'_>, offset: usize) -> rusqlite::Result<Permit> {
    Ok(Permit {
        rcd_permit_id: row.get(offset)?,
        permit_type: enum_column(row, offset + 1)?,
        expiry_date: row.get(offset + 2)?,
        active: row.get(offset + 3)?,
        applicant_id: ApplicantId(row.get(offset + 4)?),
        application_id: ApplicationId(row.get(offset + 5)?),
        issued_on: row.get(offset + 6)?,
    })
}

pub(super) fn applicant_columns(alias: &str) -> String {
    COLUMNS
        .split(',')
        .map(|column| format!("{alias}.{}", column.trim()))
        .collect::<Vec<_>>()
        .join(", ")
}

pub(super) fn permit_columns(alias: &str) -> String {
    PERMIT_COLUMNS
        .split(',')
        .map(|column| format!("{alias}.{}", column.trim()))
        .collect::<Vec<_>>()
        .join(", ")
}

pub(super) fn fetch(
    conn: &Connection,
    id: ApplicantId,
) -> Result<Option<ApplicantRecord>, RepositoryError> {
    let record = conn
        .query_row(
            &format!("SELECT {COLUMNS} FROM applicants WHERE id = ?1"),
            params![id.0],
            applicant_from_row,
        )
        .optional()?;
    Ok(record)
}

pub(super) fn insert(
    conn: &Connection,
    applicant: &NewApplicant,
    at: DateTime<Utc>,
) -> Result<ApplicantId, RepositoryError> {
    conn.execute(
        "INSERT INTO applicants
             (rcd_user_id, first_name, last_name, personal, date_of_birth, gender, other_gender,
              status, medical, physician_msp_number, guardian, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?12)",
        params![
            applicant.rcd_user_id,
            applicant.personal.first_name,
            applicant.personal.last_name,
            encode_json(&applicant.personal)?,
            applicant.date_of_birth,
            encode_enum(&applicant.gender)?,
            applicant.other_gender,
            encode_enum(&ApplicantStatus::Active)?,
            encode_json(&applicant.medical)?,
            applicant.physician_msp_number,
            applicant
                .guardian
                .as_ref()
                .map(encode_json)
                .transpose()?,
            at
        ],
    )?;
    Ok(ApplicantId(conn.last_insert_rowid()))
}

/// Copy the personal details of a renewal or replacement onto the holder.
pub(super) fn refresh_personal(
    conn: &Connection,
    id: ApplicantId,
    personal: &PersonalInformation,
    physician_msp_number: Option<&str>,
    at: DateTime<Utc>,
) -> Result<(), RepositoryError> {
    let updated = conn.execute(
        "UPDATE applicants SET
             first_name = ?2, last_name = ?3, personal = ?4,
             physician_msp_number = COALESCE(?5, physician_msp_number),
             updated_at = ?6
         WHERE id = ?1",
        params![
            id.0,
            personal.first_name,
            personal.last_name,
            encode_json(personal)?,
            physician_msp_number,
            at
        ],
    )?;
    if updated == 0 {
        return Err(RepositoryError::NotFound);
    }
    Ok(())
}

pub(super) fn deactivate_permits(conn: &Connection, id: ApplicantId) -> Result<(), RepositoryError> {
    conn.execute(
        "UPDATE permits SET active = 0 WHERE applicant_id = ?1 AND active = 1",
        params![id.0],
    )?;
    Ok(())
}

pub(super) fn insert_permit(
    conn: &Connection,
    permit: &PermitIssue,
    applicant_id: ApplicantId,
    application_id: ApplicationId,
) -> Result<(), RepositoryError> {
    conn.execute(
        "INSERT INTO permits
             (rcd_permit_id, permit_type, expiry_date, active, applicant_id, application_id, issued_on)
         VALUES (?1, ?2, ?3, 1, ?4, ?5, ?6)",
        params![
            permit.rcd_permit_id,
            encode_enum(&permit.permit_type)?,
            permit.expiry_date,
            applicant_id.0,
            application_id.0,
            permit.issued_on
        ],
    )?;
    Ok(())
}

fn bind_expiry_window(
    conditions: &mut Conditions,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
) {
    if let Some(from) = from {
        conditions.bind(
            "EXISTS (SELECT 1 FROM permits p WHERE p.applicant_id = a.id AND p.active = 1 AND p.expiry_date >= ?)",
            Value::Text(from.to_string()),
        );
    }
    if let Some(to) = to {
        conditions.bind(
            "EXISTS (SELECT 1 FROM permits p WHERE p.applicant_id = a.id AND p.active = 1 AND p.expiry_date <= ?)",
            Value::Text(to.to_string()),
        );
    }
}

impl ApplicantRepository for SqliteStore {
    fn fetch_applicant(&self, id: ApplicantId) -> Result<Option<ApplicantRecord>, RepositoryError> {
        let conn = self.conn()?;
        fetch(&conn, id)
    }

    fn fetch_applicant_by_rcd_user_id(
        &self,
        rcd_user_id: i64,
    ) -> Result<Option<ApplicantRecord>, RepositoryError> {
        let conn = self.conn()?;
        let record = conn
            .query_row(
                &format!("SELECT {COLUMNS} FROM applicants WHERE rcd_user_id = ?1"),
                params![rcd_user_id],
                applicant_from_row,
            )
            .optional()?;
        Ok(record)
    }

    fn search_applicants(
        &self,
        filter: &ApplicantFilter,
        page: PageRequest,
    ) -> Result<Page<ApplicantRecord>, RepositoryError> {
        let mut conditions = Conditions::default();
        if let Some(pattern) = like_pattern(filter.search.as_deref()) {
            conditions.bind(
                "(a.first_name LIKE ? OR a.last_name LIKE ? OR CAST(a.rcd_user_id AS TEXT) LIKE ?)",
                Value::Text(pattern),
            );
        }
        if let Some(status) = filter.status {
            conditions.bind("a.status = ?", Value::Text(encode_enum(&status)?));
        }
        bind_expiry_window(
            &mut conditions,
            filter.permit_expiry_from,
            filter.permit_expiry_to,
        );
        let where_clause = conditions.where_clause();

        let conn = self.conn()?;
        let total: i64 = conn.query_row(
            &format!("SELECT COUNT(*) FROM applicants a WHERE {where_clause}"),
            params_from_iter(conditions.values()),
            |row| row.get(0),
        )?;

        let (limit, values) = conditions.paged(page);
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM applicants a WHERE {where_clause}
             ORDER BY a.last_name COLLATE NOCASE, a.first_name COLLATE NOCASE, a.id {limit}",
            applicant_columns("a")
        ))?;
        let items = stmt
            .query_map(params_from_iter(values.iter()), applicant_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Page::new(items, total.max(0) as u64, page))
    }

    fn update_applicant(&self, record: &ApplicantRecord) -> Result<(), RepositoryError> {
        let conn = self.conn()?;
        let updated = conn.execute(
            "UPDATE applicants SET
                 first_name = ?2, last_name = ?3, personal = ?4, date_of_birth = ?5,
                 gender = ?6, other_gender = ?7, status = ?8, inactive_reason = ?9, notes = ?10,
                 medical = ?11, physician_msp_number = ?12, guardian = ?13, updated_at = ?14
             WHERE id = ?1",
            params![
                record.id.0,
                record.personal.first_name,
                record.personal.last_name,
                encode_json(&record.personal)?,
                record.date_of_birth,
                encode_enum(&record.gender)?,
                record.other_gender,
                encode_enum(&record.status)?,
                record.inactive_reason,
                record.notes,
                encode_json(&record.medical)?,
                record.physician_msp_number,
                record.guardian.as_ref().map(encode_json).transpose()?,
                record.updated_at
            ],
        )?;
        if updated == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    fn applicant_permits(&self, id: ApplicantId) -> Result<Vec<Permit>, RepositoryError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {PERMIT_COLUMNS} FROM permits WHERE applicant_id = ?1
             ORDER BY issued_on DESC, rcd_permit_id DESC"
        ))?;
        let permits = stmt
            .query_map(params![id.0], |row| permit_from_row(row, 0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(permits)
    }
}
