use std::fmt;

use async_graphql::{Enum, InputObject, SimpleObject};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::workflows::applications::domain::{ApplicationId, PermitType};
use crate::workflows::people::{Gender, Guardian, PersonalInformation};

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct ApplicantId(pub i64);

impl fmt::Display for ApplicantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Enum)]
#[serde(rename_all = "snake_case")]
pub enum ApplicantStatus {
    Active,
    Inactive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Enum)]
#[serde(rename_all = "snake_case")]
pub enum PatientCondition {
    AffectsMobility,
    MobilityAidRequired,
    CannotWalk100m,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Enum)]
#[serde(rename_all = "snake_case")]
pub enum MobilityAid {
    Cane,
    ElectricChair,
    ManualChair,
    Scooter,
    Walker,
    Crutches,
    Other,
}

/// Physician-certified description of the applicant's disability.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, SimpleObject, InputObject)]
#[graphql(input_name = "MedicalAssessmentInput")]
pub struct MedicalAssessment {
    pub disability: String,
    pub disability_certification_date: NaiveDate,
    pub patient_condition: PatientCondition,
    pub mobility_aids: Vec<MobilityAid>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicantRecord {
    pub id: ApplicantId,
    /// Public holder number, equal to the app number of the first permit issued.
    pub rcd_user_id: i64,
    pub personal: PersonalInformation,
    pub date_of_birth: NaiveDate,
    pub gender: Gender,
    pub other_gender: Option<String>,
    pub status: ApplicantStatus,
    pub inactive_reason: Option<String>,
    pub notes: Option<String>,
    pub medical: MedicalAssessment,
    pub physician_msp_number: String,
    pub guardian: Option<Guardian>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ApplicantRecord {
    pub fn is_active(&self) -> bool {
        self.status == ApplicantStatus::Active
    }
}

/// Issued parking permit; `rcd_permit_id` is the number printed on the hang tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permit {
    pub rcd_permit_id: i64,
    pub permit_type: PermitType,
    pub expiry_date: NaiveDate,
    pub active: bool,
    pub applicant_id: ApplicantId,
    pub application_id: ApplicationId,
    pub issued_on: NaiveDate,
}

impl Permit {
    pub fn is_expired(&self, today: NaiveDate) -> bool {
        self.expiry_date < today
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, InputObject)]
pub struct ApplicantFilter {
    /// Matches first name, last name or the RCD user id.
    pub search: Option<String>,
    pub status: Option<ApplicantStatus>,
    /// Restrict to holders whose active permit expires on or after this date.
    pub permit_expiry_from: Option<NaiveDate>,
    /// Restrict to holders whose active permit expires on or before this date.
    pub permit_expiry_to: Option<NaiveDate>,
}
