//! Identity check gating the public renewal form.

use async_graphql::{Enum, InputObject, SimpleObject};
use chrono::{Duration, NaiveDate};
use serde::Serialize;

use super::domain::{ApplicantId, ApplicantRecord, Permit};
use crate::workflows::applications::domain::PermitType;
use crate::workflows::people::phone_digits;

/// Days before expiry from which a holder may renew online.
pub const RENEWAL_WINDOW_DAYS: i64 = 30;

#[derive(Debug, Clone, PartialEq, Eq, InputObject)]
pub struct IdentityClaim {
    pub rcd_user_id: i64,
    /// Last four digits of the phone number on file.
    pub phone_suffix: String,
    pub date_of_birth: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, SimpleObject)]
pub struct VerifiedIdentity {
    #[graphql(skip)]
    pub applicant_id: ApplicantId,
    pub rcd_user_id: i64,
    pub permit_expiry: NaiveDate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Enum, thiserror::Error)]
pub enum IdentityVerificationFailure {
    #[error("the details provided do not match our records")]
    IdentityMismatch,
    #[error("the applicant account is inactive")]
    ApplicantInactive,
    #[error("no permit is on file for this applicant")]
    NoPermitOnFile,
    #[error("temporary permit holders must submit a new application")]
    TemporaryPermitHolder,
    #[error("the permit does not expire within the renewal window")]
    PermitNotExpiringSoon,
}

/// Decide whether the claimant may use the self-service renewal form.
///
/// Unknown applicants and mismatched details both report `IdentityMismatch` so the
/// response never reveals whether an RCD user id exists.
pub fn verify_identity(
    applicant: Option<&ApplicantRecord>,
    active_permit: Option<&Permit>,
    claim: &IdentityClaim,
    today: NaiveDate,
) -> Result<VerifiedIdentity, IdentityVerificationFailure> {
    let applicant = applicant.ok_or(IdentityVerificationFailure::IdentityMismatch)?;

    let suffix = phone_digits(&claim.phone_suffix);
    let phone = phone_digits(&applicant.personal.phone);
    let phone_matches = suffix.len() == 4 && phone.ends_with(&suffix);
    if !phone_matches || applicant.date_of_birth != claim.date_of_birth {
        return Err(IdentityVerificationFailure::IdentityMismatch);
    }

    if !applicant.is_active() {
        return Err(IdentityVerificationFailure::ApplicantInactive);
    }

    let permit = active_permit.ok_or(IdentityVerificationFailure::NoPermitOnFile)?;
    if permit.permit_type == PermitType::Temporary {
        return Err(IdentityVerificationFailure::TemporaryPermitHolder);
    }

    if permit.expiry_date > today + Duration::days(RENEWAL_WINDOW_DAYS) {
        return Err(IdentityVerificationFailure::PermitNotExpiringSoon);
    }

    Ok(VerifiedIdentity {
        applicant_id: applicant.id,
        rcd_user_id: applicant.rcd_user_id,
        permit_expiry: permit.expiry_date,
    })
}
