//! Permit application intake, review, fulfillment and completion.
//!
//! New, renewal and replacement requests share one record shape; the type-specific
//! sections travel in [`ApplicationDetails`]. Completion turns a fully processed
//! request into an issued permit through a single storage transaction.

pub mod completion;
pub mod domain;
pub mod processing;
pub mod repository;
pub mod service;
pub mod validation;

#[cfg(test)]
mod tests;

pub use completion::{
    plan_completion, ApplicantWrite, CompletionError, CompletionPlan, CompletionReceipt,
    NewApplicant, PermitIssue, PERMANENT_PERMIT_TERM_MONTHS,
};
pub use domain::{
    ApplicationAmendment, ApplicationDetails, ApplicationDraft, ApplicationFilter, ApplicationId,
    ApplicationStatus, ApplicationType, NewApplicationDetails, NewApplicationInput,
    PaymentInformation, PaymentMethod, PermitType, RenewalApplicationDetails,
    RenewalApplicationInput, ReplacementApplicationDetails, ReplacementApplicationInput,
    ReplacementReason,
};
pub use processing::{
    ApplicationProcessing, Attribution, ProcessingError, ProcessingTask, TaskUpdate,
};
pub use repository::{
    ApplicantNotification, ApplicationRecord, ApplicationRepository, ApplicationStatusView,
    NotificationError, NotificationPublisher, NotificationTemplate,
};
pub use service::{ApplicationService, ApplicationServiceError, Submitter};
pub use validation::{ApplicationGuard, FeeSchedule, DEFAULT_PROCESSING_FEE_CENTS};
