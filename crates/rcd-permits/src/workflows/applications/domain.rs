use std::fmt;

use async_graphql::{Enum, InputObject, SimpleObject};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::workflows::applicants::domain::{ApplicantId, MedicalAssessment};
use crate::workflows::people::{Address, Gender, Guardian, PersonalInformation};
use crate::workflows::physicians::PhysicianDetails;

/// Identifier wrapper for submitted applications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ApplicationId(pub i64);

impl fmt::Display for ApplicationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Enum)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationType {
    New,
    Renewal,
    Replacement,
}

impl ApplicationType {
    pub const fn label(self) -> &'static str {
        match self {
            ApplicationType::New => "New",
            ApplicationType::Renewal => "Renewal",
            ApplicationType::Replacement => "Replacement",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Enum)]
#[serde(rename_all = "snake_case")]
pub enum PermitType {
    Permanent,
    Temporary,
}

impl PermitType {
    pub const fn label(self) -> &'static str {
        match self {
            PermitType::Permanent => "Permanent",
            PermitType::Temporary => "Temporary",
        }
    }
}

/// High level status tracked throughout the application workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Enum)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    Pending,
    InProgress,
    Completed,
    Rejected,
}

impl ApplicationStatus {
    pub const fn label(self) -> &'static str {
        match self {
            ApplicationStatus::Pending => "Pending",
            ApplicationStatus::InProgress => "In Progress",
            ApplicationStatus::Completed => "Completed",
            ApplicationStatus::Rejected => "Rejected",
        }
    }

    /// Badge variant rendered next to the status in request tables.
    pub const fn badge(self) -> &'static str {
        match self {
            ApplicationStatus::Pending => "pending",
            ApplicationStatus::InProgress => "in_progress",
            ApplicationStatus::Completed => "completed",
            ApplicationStatus::Rejected => "rejected",
        }
    }

    pub const fn is_terminal(self) -> bool {
        matches!(self, ApplicationStatus::Completed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Enum)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Mastercard,
    Visa,
    Etransfer,
    Cash,
    Cheque,
    Debit,
    Shopify,
}

impl PaymentMethod {
    pub const fn ordered() -> [Self; 7] {
        [
            Self::Mastercard,
            Self::Visa,
            Self::Etransfer,
            Self::Cash,
            Self::Cheque,
            Self::Debit,
            Self::Shopify,
        ]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Mastercard => "Mastercard",
            Self::Visa => "Visa",
            Self::Etransfer => "E-transfer",
            Self::Cash => "Cash",
            Self::Cheque => "Cheque",
            Self::Debit => "Debit",
            Self::Shopify => "Shopify",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Enum)]
#[serde(rename_all = "snake_case")]
pub enum ReplacementReason {
    Lost,
    Stolen,
    Other,
}

/// Fees, donation and delivery details collected with every request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, SimpleObject, InputObject)]
#[graphql(input_name = "PaymentInformationInput")]
pub struct PaymentInformation {
    pub payment_method: PaymentMethod,
    pub processing_fee_cents: i64,
    pub donation_cents: i64,
    pub paid_through_shopify: bool,
    pub shopify_order_number: Option<String>,
    pub ship_to_same_address: bool,
    pub shipping_address: Option<Address>,
    pub bill_to_same_address: bool,
    pub billing_address: Option<Address>,
}

impl PaymentInformation {
    pub fn total_cents(&self) -> i64 {
        self.processing_fee_cents.saturating_add(self.donation_cents)
    }
}

/// Sections only a first-time application carries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, SimpleObject, InputObject)]
#[graphql(input_name = "NewApplicationDetailsInput")]
pub struct NewApplicationDetails {
    pub date_of_birth: NaiveDate,
    pub gender: Gender,
    pub other_gender: Option<String>,
    pub medical: MedicalAssessment,
    pub physician: PhysicianDetails,
    /// Applicant signs on their own behalf; no guardian section is collected.
    pub omit_guardian: bool,
    pub guardian: Option<Guardian>,
    /// Requested end date for a temporary permit.
    pub requested_expiry: Option<NaiveDate>,
    pub uses_accessible_converted_van: bool,
    pub requires_wider_parking_space: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, SimpleObject, InputObject)]
#[graphql(input_name = "RenewalApplicationDetailsInput")]
pub struct RenewalApplicationDetails {
    #[graphql(skip)]
    pub applicant_id: ApplicantId,
    pub physician_changed: bool,
    pub physician: Option<PhysicianDetails>,
    pub uses_accessible_converted_van: bool,
    pub requires_wider_parking_space: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, SimpleObject, InputObject)]
#[graphql(input_name = "ReplacementApplicationDetailsInput")]
pub struct ReplacementApplicationDetails {
    #[graphql(skip)]
    pub applicant_id: ApplicantId,
    pub reason: ReplacementReason,
    pub lost_timestamp: Option<DateTime<Utc>>,
    pub lost_location: Option<String>,
    pub stolen_police_file_number: Option<String>,
    pub stolen_jurisdiction: Option<String>,
    pub event_description: Option<String>,
}

/// Type-specific payload persisted alongside the common application columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ApplicationDetails {
    New(NewApplicationDetails),
    Renewal(RenewalApplicationDetails),
    Replacement(ReplacementApplicationDetails),
}

impl ApplicationDetails {
    pub fn application_type(&self) -> ApplicationType {
        match self {
            ApplicationDetails::New(_) => ApplicationType::New,
            ApplicationDetails::Renewal(_) => ApplicationType::Renewal,
            ApplicationDetails::Replacement(_) => ApplicationType::Replacement,
        }
    }

    pub fn applicant_id(&self) -> Option<ApplicantId> {
        match self {
            ApplicationDetails::New(_) => None,
            ApplicationDetails::Renewal(details) => Some(details.applicant_id),
            ApplicationDetails::Replacement(details) => Some(details.applicant_id),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, InputObject)]
pub struct NewApplicationInput {
    pub permit_type: PermitType,
    pub personal: PersonalInformation,
    pub payment: PaymentInformation,
    pub details: NewApplicationDetails,
}

#[derive(Debug, Clone, PartialEq, Eq, InputObject)]
pub struct RenewalApplicationInput {
    pub applicant_id: i64,
    pub personal: PersonalInformation,
    pub payment: PaymentInformation,
    pub details: RenewalApplicationDetails,
}

#[derive(Debug, Clone, PartialEq, Eq, InputObject)]
pub struct ReplacementApplicationInput {
    pub applicant_id: i64,
    pub personal: PersonalInformation,
    pub payment: PaymentInformation,
    pub details: ReplacementApplicationDetails,
}

/// Validated submission ready to be stored as a pending application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationDraft {
    pub permit_type: PermitType,
    pub personal: PersonalInformation,
    pub payment: PaymentInformation,
    pub details: ApplicationDetails,
}

impl ApplicationDraft {
    pub fn application_type(&self) -> ApplicationType {
        self.details.application_type()
    }
}

/// Edits staff may make to an application before it is completed.
#[derive(Debug, Clone, Default, PartialEq, Eq, InputObject)]
pub struct ApplicationAmendment {
    pub personal: Option<PersonalInformation>,
    pub payment: Option<PaymentInformation>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, InputObject)]
pub struct ApplicationFilter {
    pub status: Option<ApplicationStatus>,
    pub application_type: Option<ApplicationType>,
    pub permit_type: Option<PermitType>,
    /// Matches applicant first/last name or the linked RCD user id.
    pub search: Option<String>,
    pub created_from: Option<NaiveDate>,
    pub created_to: Option<NaiveDate>,
}
