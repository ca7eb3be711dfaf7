use async_graphql::{InputObject, SimpleObject};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use crate::workflows::applicants::domain::ApplicantStatus;
use crate::workflows::applications::domain::{
    ApplicationStatus, ApplicationType, PaymentMethod, PermitType,
};
use crate::workflows::validation::ValidationErrors;

/// Inclusive calendar-date window a report covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, InputObject)]
pub struct ReportRange {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl ReportRange {
    pub fn new(from: NaiveDate, to: NaiveDate) -> Self {
        Self { from, to }
    }

    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if self.from > self.to {
            errors.push("range.to", "must not be before the start date");
        }
        errors.into_result()
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.from <= date && date <= self.to
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, SimpleObject)]
pub struct ApplicationsReportRow {
    pub application_id: i64,
    pub application_type: ApplicationType,
    pub permit_type: PermitType,
    pub status: ApplicationStatus,
    pub applicant_name: String,
    pub applicant_id: Option<i64>,
    pub app_number: Option<i64>,
    pub payment_method: PaymentMethod,
    pub processing_fee_cents: i64,
    pub donation_cents: i64,
    pub total_cents: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, SimpleObject)]
pub struct PermitHolderRow {
    pub applicant_id: i64,
    pub rcd_user_id: i64,
    pub applicant_name: String,
    pub phone: String,
    pub email: Option<String>,
    pub status: ApplicantStatus,
    pub rcd_permit_id: i64,
    pub permit_type: PermitType,
    pub expiry_date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, SimpleObject)]
pub struct AccountantRow {
    pub payment_method: PaymentMethod,
    pub payment_method_label: String,
    pub application_count: u32,
    pub processing_fee_cents: i64,
    pub donation_cents: i64,
    pub total_cents: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, SimpleObject)]
pub struct AccountantTotals {
    pub application_count: u32,
    pub processing_fee_cents: i64,
    pub donation_cents: i64,
    pub total_cents: i64,
}

/// Money collected on completed applications, per payment method.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, SimpleObject)]
pub struct AccountantReport {
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub rows: Vec<AccountantRow>,
    pub totals: AccountantTotals,
}
