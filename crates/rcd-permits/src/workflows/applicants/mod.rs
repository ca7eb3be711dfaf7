//! Permit holders: their medical certification, guardian, permits and self-service renewal checks.

pub mod domain;
pub mod identity;
pub mod repository;
pub mod service;

pub use domain::{
    ApplicantFilter, ApplicantId, ApplicantRecord, ApplicantStatus, MedicalAssessment,
    MobilityAid, PatientCondition, Permit,
};
pub use identity::{IdentityClaim, IdentityVerificationFailure, VerifiedIdentity};
pub use repository::ApplicantRepository;
pub use service::{ApplicantService, ApplicantServiceError};
