//! Records written when an application is completed.
//!
//! `plan_completion` decides every write up front; the repository applies the plan
//! inside a single transaction so a failure leaves no partial permit holder behind.

use chrono::{DateTime, Months, NaiveDate, Utc};
use serde::Serialize;

use super::domain::{ApplicationDetails, ApplicationId, PermitType};
use super::processing::{ApplicationProcessing, ProcessingError};
use super::repository::ApplicationRecord;
use crate::workflows::applicants::domain::{ApplicantId, ApplicantRecord, MedicalAssessment, Permit};
use crate::workflows::employees::EmployeeId;
use crate::workflows::people::{Gender, Guardian, PersonalInformation};
use crate::workflows::physicians::PhysicianDetails;

/// Validity of a permanent permit from the day it is issued.
pub const PERMANENT_PERMIT_TERM_MONTHS: u32 = 36;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewApplicant {
    pub rcd_user_id: i64,
    pub personal: PersonalInformation,
    pub date_of_birth: NaiveDate,
    pub gender: Gender,
    pub other_gender: Option<String>,
    pub medical: MedicalAssessment,
    pub physician_msp_number: String,
    pub guardian: Option<Guardian>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ApplicantWrite {
    Create(Box<NewApplicant>),
    Update {
        applicant_id: ApplicantId,
        personal: PersonalInformation,
        /// New physician of record when the renewal reported a change.
        physician_msp_number: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PermitIssue {
    pub rcd_permit_id: i64,
    pub permit_type: PermitType,
    pub expiry_date: NaiveDate,
    pub issued_on: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompletionPlan {
    pub application_id: ApplicationId,
    /// Physician to insert or refresh by MSP number before the applicant is written.
    pub physician: Option<PhysicianDetails>,
    pub applicant: ApplicantWrite,
    pub permit: PermitIssue,
    pub processing: ApplicationProcessing,
    /// `updated_at` of the application the plan was built from.
    pub expected_updated_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompletionReceipt {
    pub application_id: ApplicationId,
    pub applicant_id: ApplicantId,
    pub rcd_permit_id: i64,
    pub expiry_date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CompletionError {
    #[error(transparent)]
    Processing(#[from] ProcessingError),
    #[error("applicant {0} linked to the application does not exist")]
    MissingApplicant(ApplicantId),
    #[error("applicant {0} is inactive")]
    ApplicantInactive(ApplicantId),
    #[error("applicant {0} has no active permit to replace")]
    NoActivePermit(ApplicantId),
    #[error("temporary permit is missing its requested expiry date")]
    MissingRequestedExpiry,
}

/// Build the writes that turn a fully processed application into an issued permit.
///
/// `applicant` and `active_permit` must be the linked holder's current records for renewals
/// and replacements; they are ignored for new applications.
pub fn plan_completion(
    record: &ApplicationRecord,
    applicant: Option<&ApplicantRecord>,
    active_permit: Option<&Permit>,
    actor: EmployeeId,
    now: DateTime<Utc>,
) -> Result<CompletionPlan, CompletionError> {
    let mut processing = record.processing.clone();
    let app_number = processing.ready_for_completion()?;
    processing.mark_completed(actor, now)?;

    let today = now.date_naive();
    let permanent_expiry = today
        .checked_add_months(Months::new(PERMANENT_PERMIT_TERM_MONTHS))
        .unwrap_or(NaiveDate::MAX);

    let (physician, applicant_write, permit_type, expiry_date) = match &record.details {
        ApplicationDetails::New(details) => {
            let expiry_date = match record.permit_type {
                PermitType::Permanent => permanent_expiry,
                PermitType::Temporary => details
                    .requested_expiry
                    .ok_or(CompletionError::MissingRequestedExpiry)?,
            };
            let write = ApplicantWrite::Create(Box::new(NewApplicant {
                rcd_user_id: app_number,
                personal: record.personal.clone(),
                date_of_birth: details.date_of_birth,
                gender: details.gender,
                other_gender: details.other_gender.clone(),
                medical: details.medical.clone(),
                physician_msp_number: details.physician.msp_number.clone(),
                guardian: if details.omit_guardian {
                    None
                } else {
                    details.guardian.clone()
                },
            }));
            (
                Some(details.physician.clone()),
                write,
                record.permit_type,
                expiry_date,
            )
        }
        ApplicationDetails::Renewal(details) => {
            let holder = linked_holder(applicant, details.applicant_id)?;
            let physician = if details.physician_changed {
                details.physician.clone()
            } else {
                None
            };
            let write = ApplicantWrite::Update {
                applicant_id: holder.id,
                personal: record.personal.clone(),
                physician_msp_number: physician
                    .as_ref()
                    .map(|physician| physician.msp_number.clone()),
            };
            (physician, write, PermitType::Permanent, permanent_expiry)
        }
        ApplicationDetails::Replacement(details) => {
            let holder = linked_holder(applicant, details.applicant_id)?;
            let replaced = active_permit
                .filter(|permit| permit.active && permit.applicant_id == holder.id)
                .ok_or(CompletionError::NoActivePermit(holder.id))?;
            let write = ApplicantWrite::Update {
                applicant_id: holder.id,
                personal: record.personal.clone(),
                physician_msp_number: None,
            };
            (None, write, replaced.permit_type, replaced.expiry_date)
        }
    };

    Ok(CompletionPlan {
        application_id: record.id,
        physician,
        applicant: applicant_write,
        permit: PermitIssue {
            rcd_permit_id: app_number,
            permit_type,
            expiry_date,
            issued_on: today,
        },
        processing,
        expected_updated_at: record.updated_at,
        completed_at: now,
    })
}

fn linked_holder(
    applicant: Option<&ApplicantRecord>,
    expected: ApplicantId,
) -> Result<&ApplicantRecord, CompletionError> {
    let holder = applicant
        .filter(|holder| holder.id == expected)
        .ok_or(CompletionError::MissingApplicant(expected))?;
    if !holder.is_active() {
        return Err(CompletionError::ApplicantInactive(holder.id));
    }
    Ok(holder)
}
