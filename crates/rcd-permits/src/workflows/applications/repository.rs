use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::completion::{CompletionPlan, CompletionReceipt};
use super::domain::{
    ApplicationDetails, ApplicationDraft, ApplicationFilter, ApplicationId, ApplicationStatus,
    ApplicationType, PaymentInformation, PermitType,
};
use super::processing::ApplicationProcessing;
use crate::pagination::{Page, PageRequest};
use crate::storage::RepositoryError;
use crate::workflows::applicants::domain::ApplicantId;
use crate::workflows::people::PersonalInformation;

/// Repository record containing the submission, links and processing metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationRecord {
    pub id: ApplicationId,
    pub application_type: ApplicationType,
    pub permit_type: PermitType,
    pub personal: PersonalInformation,
    pub payment: PaymentInformation,
    pub details: ApplicationDetails,
    pub applicant_id: Option<ApplicantId>,
    pub processing: ApplicationProcessing,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ApplicationRecord {
    pub fn status(&self) -> ApplicationStatus {
        self.processing.status
    }

    pub fn status_view(&self) -> ApplicationStatusView {
        ApplicationStatusView {
            application_id: self.id,
            status: self.processing.status.badge(),
            applicant_name: self.personal.full_name(),
            outstanding_tasks: self
                .processing
                .outstanding_tasks()
                .into_iter()
                .map(|task| task.label())
                .collect(),
            rejected_reason: self.processing.rejected_reason.clone(),
        }
    }
}

/// Storage abstraction so the service module can be exercised in isolation.
pub trait ApplicationRepository: Send + Sync {
    /// Store a pending application, assigning its id.
    fn insert_application(
        &self,
        draft: ApplicationDraft,
        at: DateTime<Utc>,
    ) -> Result<ApplicationRecord, RepositoryError>;
    fn fetch_application(
        &self,
        id: ApplicationId,
    ) -> Result<Option<ApplicationRecord>, RepositoryError>;
    /// Write the record only if the stored row still carries `expected_updated_at`;
    /// a row changed by another request fails with `Conflict`.
    fn update_application(
        &self,
        record: &ApplicationRecord,
        expected_updated_at: DateTime<Utc>,
    ) -> Result<(), RepositoryError>;
    fn delete_application(&self, id: ApplicationId) -> Result<(), RepositoryError>;
    /// Matching applications, newest first.
    fn search_applications(
        &self,
        filter: &ApplicationFilter,
        page: PageRequest,
    ) -> Result<Page<ApplicationRecord>, RepositoryError>;
    /// Whether another application or an issued permit already holds the APP number.
    fn app_number_in_use(
        &self,
        app_number: i64,
        excluding: ApplicationId,
    ) -> Result<bool, RepositoryError>;
    fn next_invoice_number(&self) -> Result<i64, RepositoryError>;
    /// Apply every write of the plan atomically.
    fn complete_application(
        &self,
        plan: &CompletionPlan,
    ) -> Result<CompletionReceipt, RepositoryError>;
}

/// Outbound status e-mails to applicants who opted in.
pub trait NotificationPublisher: Send + Sync {
    fn publish(&self, notification: ApplicantNotification) -> Result<(), NotificationError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationTemplate {
    ApplicationReceived,
    ApplicationRejected,
    PermitIssued,
}

/// Simple notification payload so routes/tests can assert integration boundaries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicantNotification {
    pub template: NotificationTemplate,
    pub application_id: ApplicationId,
    pub recipient: String,
    pub details: BTreeMap<String, String>,
}

#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    #[error("notification transport unavailable: {0}")]
    Transport(String),
}

/// Sanitized representation of an application's progress.
#[derive(Debug, Clone, Serialize)]
pub struct ApplicationStatusView {
    pub application_id: ApplicationId,
    pub status: &'static str,
    pub applicant_name: String,
    pub outstanding_tasks: Vec<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rejected_reason: Option<String>,
}
