use rusqlite::params;

use super::applicants::{applicant_columns, applicant_from_row, permit_columns, permit_from_row};
use super::applications::{application_from_row, COLUMNS as APPLICATION_COLUMNS};
use super::{encode_enum, SqliteStore};
use crate::storage::RepositoryError;
use crate::workflows::applicants::domain::{ApplicantRecord, Permit};
use crate::workflows::applications::domain::ApplicationStatus;
use crate::workflows::applications::repository::ApplicationRecord;
use crate::workflows::reports::{ReportRange, ReportRepository};

impl ReportRepository for SqliteStore {
    fn applications_created(
        &self,
        range: ReportRange,
    ) -> Result<Vec<ApplicationRecord>, RepositoryError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {APPLICATION_COLUMNS} FROM applications
             WHERE date(created_at) BETWEEN ?1 AND ?2
             ORDER BY created_at, id"
        ))?;
        let records = stmt
            .query_map(params![range.from, range.to], application_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(records)
    }

    fn applications_completed(
        &self,
        range: ReportRange,
    ) -> Result<Vec<ApplicationRecord>, RepositoryError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {APPLICATION_COLUMNS} FROM applications
             WHERE status = ?1 AND date(completed_at) BETWEEN ?2 AND ?3
             ORDER BY completed_at, id"
        ))?;
        let records = stmt
            .query_map(
                params![
                    encode_enum(&ApplicationStatus::Completed)?,
                    range.from,
                    range.to
                ],
                application_from_row,
            )?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(records)
    }

    fn permit_holders(
        &self,
        range: ReportRange,
    ) -> Result<Vec<(ApplicantRecord, Permit)>, RepositoryError> {
        let conn = self.conn()?;
        let applicant = applicant_columns("a");
        let mut stmt = conn.prepare(&format!(
            "SELECT {applicant}, {} FROM applicants a
             JOIN permits p ON p.applicant_id = a.id AND p.active = 1
             WHERE p.expiry_date BETWEEN ?1 AND ?2
             ORDER BY p.expiry_date, a.last_name COLLATE NOCASE, a.id",
            permit_columns("p")
        ))?;
        let offset = applicant.split(',').count();
        let rows = stmt
            .query_map(params![range.from, range.to], |row| {
                Ok((applicant_from_row(row)?, permit_from_row(row, offset)?))
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}
