use chrono::{DateTime, Utc};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use tracing::debug;

use super::{
    applicants, encode_enum, encode_json, enum_column, json_column, like_pattern, physicians,
    Conditions, SqliteStore,
};
use crate::pagination::{Page, PageRequest};
use crate::storage::RepositoryError;
use crate::workflows::applicants::domain::ApplicantId;
use crate::workflows::applications::completion::{
    ApplicantWrite, CompletionPlan, CompletionReceipt,
};
use crate::workflows::applications::domain::{ApplicationDraft, ApplicationFilter, ApplicationId};
use crate::workflows::applications::processing::ApplicationProcessing;
use crate::workflows::applications::repository::{ApplicationRecord, ApplicationRepository};

pub(super) const COLUMNS: &str = "id, application_type, permit_type, personal, payment, details, \
                       applicant_id, processing, created_at, updated_at";

pub(super) fn application_from_row(row: &Row<'_>) -> rusqlite::Result<ApplicationRecord> {
    Ok(ApplicationRecord {
        id: ApplicationId(row.get(0)?),
        application_type: enum_column(row, 1)?,
        permit_type: enum_column(row, 2)?,
        personal: json_column(row, 3)?,
        payment: json_column(row, 4)?,
        details: json_column(row, 5)?,
        applicant_id: row.get::<_, Option<i64>>(6)?.map(ApplicantId),
        processing: json_column(row, 7)?,
        created_at: row.get(8)?,
        updated_at: row.get(9)?,
    })
}

fn fetch(conn: &Connection, id: ApplicationId) -> Result<Option<ApplicationRecord>, RepositoryError> {
    let record = conn
        .query_row(
            &format!("SELECT {COLUMNS} FROM applications WHERE id = ?1"),
            params![id.0],
            application_from_row,
        )
        .optional()?;
    Ok(record)
}

fn write_processing(
    conn: &Connection,
    id: ApplicationId,
    processing: &ApplicationProcessing,
    applicant_id: Option<ApplicantId>,
    expected_updated_at: DateTime<Utc>,
    at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
) -> Result<(), RepositoryError> {
    let updated = conn.execute(
        "UPDATE applications SET
             status = ?2, processing = ?3, app_number = ?4,
             applicant_id = COALESCE(?5, applicant_id),
             updated_at = ?6, completed_at = COALESCE(?7, completed_at)
         WHERE id = ?1 AND updated_at = ?8",
        params![
            id.0,
            encode_enum(&processing.status)?,
            encode_json(processing)?,
            processing.app_number,
            applicant_id.map(|id| id.0),
            at,
            completed_at,
            expected_updated_at
        ],
    )?;
    if updated == 0 {
        return Err(missed_update(conn, id));
    }
    Ok(())
}

/// Explain a conditional update that touched no row.
fn missed_update(conn: &Connection, id: ApplicationId) -> RepositoryError {
    let exists = conn
        .query_row(
            "SELECT 1 FROM applications WHERE id = ?1",
            params![id.0],
            |_| Ok(()),
        )
        .optional();
    match exists {
        Ok(Some(())) => {
            RepositoryError::Conflict(format!("application {id} was changed by another request"))
        }
        Ok(None) => RepositoryError::NotFound,
        Err(err) => err.into(),
    }
}

impl ApplicationRepository for SqliteStore {
    fn insert_application(
        &self,
        draft: ApplicationDraft,
        at: DateTime<Utc>,
    ) -> Result<ApplicationRecord, RepositoryError> {
        let application_type = draft.application_type();
        let applicant_id = draft.details.applicant_id();
        let processing = ApplicationProcessing::new();

        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO applications
                 (application_type, permit_type, status, first_name, last_name, personal, payment,
                  details, applicant_id, processing, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?11)",
            params![
                encode_enum(&application_type)?,
                encode_enum(&draft.permit_type)?,
                encode_enum(&processing.status)?,
                draft.personal.first_name,
                draft.personal.last_name,
                encode_json(&draft.personal)?,
                encode_json(&draft.payment)?,
                encode_json(&draft.details)?,
                applicant_id.map(|id| id.0),
                encode_json(&processing)?,
                at
            ],
        )?;

        Ok(ApplicationRecord {
            id: ApplicationId(conn.last_insert_rowid()),
            application_type,
            permit_type: draft.permit_type,
            personal: draft.personal,
            payment: draft.payment,
            details: draft.details,
            applicant_id,
            processing,
            created_at: at,
            updated_at: at,
        })
    }

    fn fetch_application(
        &self,
        id: ApplicationId,
    ) -> Result<Option<ApplicationRecord>, RepositoryError> {
        let conn = self.conn()?;
        fetch(&conn, id)
    }

    fn update_application(
        &self,
        record: &ApplicationRecord,
        expected_updated_at: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        let conn = self.conn()?;
        let updated = conn.execute(
            "UPDATE applications SET
                 status = ?2, first_name = ?3, last_name = ?4, personal = ?5, payment = ?6,
                 details = ?7, processing = ?8, app_number = ?9, updated_at = ?10
             WHERE id = ?1 AND updated_at = ?11",
            params![
                record.id.0,
                encode_enum(&record.processing.status)?,
                record.personal.first_name,
                record.personal.last_name,
                encode_json(&record.personal)?,
                encode_json(&record.payment)?,
                encode_json(&record.details)?,
                encode_json(&record.processing)?,
                record.processing.app_number,
                record.updated_at,
                expected_updated_at
            ],
        )?;
        if updated == 0 {
            return Err(missed_update(&conn, record.id));
        }
        Ok(())
    }

    fn delete_application(&self, id: ApplicationId) -> Result<(), RepositoryError> {
        let conn = self.conn()?;
        let deleted = conn.execute("DELETE FROM applications WHERE id = ?1", params![id.0])?;
        if deleted == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    fn search_applications(
        &self,
        filter: &ApplicationFilter,
        page: PageRequest,
    ) -> Result<Page<ApplicationRecord>, RepositoryError> {
        let mut conditions = Conditions::default();
        if let Some(status) = filter.status {
            conditions.bind("status = ?", Value::Text(encode_enum(&status)?));
        }
        if let Some(application_type) = filter.application_type {
            conditions.bind(
                "application_type = ?",
                Value::Text(encode_enum(&application_type)?),
            );
        }
        if let Some(permit_type) = filter.permit_type {
            conditions.bind("permit_type = ?", Value::Text(encode_enum(&permit_type)?));
        }
        if let Some(pattern) = like_pattern(filter.search.as_deref()) {
            conditions.bind(
                "(first_name LIKE ? OR last_name LIKE ? OR applicant_id IN \
                 (SELECT id FROM applicants WHERE CAST(rcd_user_id AS TEXT) LIKE ?))",
                Value::Text(pattern),
            );
        }
        if let Some(from) = filter.created_from {
            conditions.bind("date(created_at) >= ?", Value::Text(from.to_string()));
        }
        if let Some(to) = filter.created_to {
            conditions.bind("date(created_at) <= ?", Value::Text(to.to_string()));
        }
        let where_clause = conditions.where_clause();

        let conn = self.conn()?;
        let total: i64 = conn.query_row(
            &format!("SELECT COUNT(*) FROM applications WHERE {where_clause}"),
            params_from_iter(conditions.values()),
            |row| row.get(0),
        )?;

        let (limit, values) = conditions.paged(page);
        let mut stmt = conn.prepare(&format!(
            "SELECT {COLUMNS} FROM applications WHERE {where_clause}
             ORDER BY created_at DESC, id DESC {limit}"
        ))?;
        let items = stmt
            .query_map(params_from_iter(values.iter()), application_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Page::new(items, total.max(0) as u64, page))
    }

    fn app_number_in_use(
        &self,
        app_number: i64,
        excluding: ApplicationId,
    ) -> Result<bool, RepositoryError> {
        let conn = self.conn()?;
        let in_use: bool = conn.query_row(
            "SELECT EXISTS (SELECT 1 FROM applications WHERE app_number = ?1 AND id <> ?2)
                 OR EXISTS (SELECT 1 FROM permits WHERE rcd_permit_id = ?1)
                 OR EXISTS (SELECT 1 FROM applicants WHERE rcd_user_id = ?1)",
            params![app_number, excluding.0],
            |row| row.get(0),
        )?;
        Ok(in_use)
    }

    fn next_invoice_number(&self) -> Result<i64, RepositoryError> {
        let conn = self.conn()?;
        let next: i64 = conn.query_row(
            "INSERT INTO invoice_sequence (id, last) VALUES (1, 1)
             ON CONFLICT(id) DO UPDATE SET last = last + 1
             RETURNING last",
            [],
            |row| row.get(0),
        )?;
        Ok(next)
    }

    fn complete_application(
        &self,
        plan: &CompletionPlan,
    ) -> Result<CompletionReceipt, RepositoryError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        let at = plan.completed_at;

        if let Some(physician) = plan.physician.as_ref() {
            physicians::upsert(&tx, physician, at)?;
        }

        let applicant_id = match &plan.applicant {
            ApplicantWrite::Create(applicant) => applicants::insert(&tx, applicant, at)?,
            ApplicantWrite::Update {
                applicant_id,
                personal,
                physician_msp_number,
            } => {
                applicants::refresh_personal(
                    &tx,
                    *applicant_id,
                    personal,
                    physician_msp_number.as_deref(),
                    at,
                )?;
                *applicant_id
            }
        };

        applicants::deactivate_permits(&tx, applicant_id)?;
        applicants::insert_permit(&tx, &plan.permit, applicant_id, plan.application_id)?;
        write_processing(
            &tx,
            plan.application_id,
            &plan.processing,
            Some(applicant_id),
            plan.expected_updated_at,
            at,
            Some(at),
        )?;

        tx.commit()?;
        debug!(
            application_id = %plan.application_id,
            applicant_id = %applicant_id,
            "completion transaction committed"
        );

        Ok(CompletionReceipt {
            application_id: plan.application_id,
            applicant_id,
            rcd_permit_id: plan.permit.rcd_permit_id,
            expiry_date: plan.permit.expiry_date,
        })
    }
}
