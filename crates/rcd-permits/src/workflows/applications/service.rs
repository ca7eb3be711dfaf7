use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use super::completion::{plan_completion, CompletionError, CompletionReceipt};
use super::domain::{
    ApplicationAmendment, ApplicationFilter, ApplicationId, ApplicationStatus,
    NewApplicationInput, PermitType, RenewalApplicationInput, ReplacementApplicationInput,
};
use super::processing::{ProcessingError, ProcessingTask, TaskUpdate};
use super::repository::{
    ApplicantNotification, ApplicationRecord, ApplicationRepository, NotificationPublisher,
    NotificationTemplate,
};
use super::validation::{check_payment, normalize_payment, ApplicationGuard, FeeSchedule};
use crate::pagination::{Page, PageRequest};
use crate::storage::RepositoryError;
use crate::workflows::applicants::domain::{ApplicantId, ApplicantRecord};
use crate::workflows::applicants::ApplicantRepository;
use crate::workflows::employees::EmployeeId;
use crate::workflows::validation::{normalize_personal, ValidationErrors};

/// Who is submitting a renewal: staff at the front desk or the holder through the public form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Submitter {
    Employee(EmployeeId),
    Applicant,
}

/// Service composing the application guard, repository, and notification hooks.
pub struct ApplicationService<R: ?Sized, N: ?Sized> {
    guard: ApplicationGuard,
    repository: Arc<R>,
    notifications: Arc<N>,
}

impl<R, N> ApplicationService<R, N>
where
    R: ApplicationRepository + ApplicantRepository + ?Sized + 'static,
    N: NotificationPublisher + ?Sized + 'static,
{
    pub fn new(repository: Arc<R>, notifications: Arc<N>, fees: FeeSchedule) -> Self {
        Self {
            guard: ApplicationGuard::with_fees(fees),
            repository,
            notifications,
        }
    }

    pub fn create_new(
        &self,
        input: NewApplicationInput,
    ) -> Result<ApplicationRecord, ApplicationServiceError> {
        let now = Utc::now();
        let draft = self.guard.draft_new(input, now.date_naive())?;
        let record = self.repository.insert_application(draft, now)?;
        info!(application_id = %record.id, "new application received");
        self.notify(&record, NotificationTemplate::ApplicationReceived, BTreeMap::new());
        Ok(record)
    }

    pub fn create_renewal(
        &self,
        mut input: RenewalApplicationInput,
        submitter: Submitter,
    ) -> Result<ApplicationRecord, ApplicationServiceError> {
        if submitter == Submitter::Applicant {
            input.payment = self.guard.self_service_payment(input.payment);
        }
        let draft = self.guard.draft_renewal(input)?;
        if let Some(applicant_id) = draft.details.applicant_id() {
            self.active_holder(applicant_id)?;
        }

        let record = self.repository.insert_application(draft, Utc::now())?;
        info!(application_id = %record.id, ?submitter, "renewal application received");
        self.notify(&record, NotificationTemplate::ApplicationReceived, BTreeMap::new());
        Ok(record)
    }

    pub fn create_replacement(
        &self,
        input: ReplacementApplicationInput,
    ) -> Result<ApplicationRecord, ApplicationServiceError> {
        let applicant_id = ApplicantId(input.applicant_id);
        let permit_type = if input.applicant_id > 0 {
            let holder = self.active_holder(applicant_id)?;
            let permit = self
                .repository
                .active_permit(holder.id)?
                .ok_or(ApplicationServiceError::NoActivePermit(holder.id))?;
            permit.permit_type
        } else {
            // Let the guard report the missing applicant alongside any other field errors.
            PermitType::Permanent
        };

        let draft = self.guard.draft_replacement(input, permit_type)?;
        let record = self.repository.insert_application(draft, Utc::now())?;
        info!(application_id = %record.id, "replacement application received");
        self.notify(&record, NotificationTemplate::ApplicationReceived, BTreeMap::new());
        Ok(record)
    }

    /// Fetch an application and current status for API responses.
    pub fn get(&self, id: ApplicationId) -> Result<ApplicationRecord, ApplicationServiceError> {
        let record = self
            .repository
            .fetch_application(id)?
            .ok_or(RepositoryError::NotFound)?;
        Ok(record)
    }

    pub fn search(
        &self,
        filter: &ApplicationFilter,
        page: PageRequest,
    ) -> Result<Page<ApplicationRecord>, ApplicationServiceError> {
        Ok(self.repository.search_applications(filter, page)?)
    }

    pub fn approve(
        &self,
        id: ApplicationId,
        actor: EmployeeId,
    ) -> Result<ApplicationRecord, ApplicationServiceError> {
        let mut record = self.get(id)?;
        let last_seen = record.updated_at;
        let now = Utc::now();
        record.processing.approve(actor, now)?;
        record.updated_at = now;
        self.repository.update_application(&record, last_seen)?;
        info!(application_id = %id, employee_id = %actor, "application approved");
        Ok(record)
    }

    pub fn reject(
        &self,
        id: ApplicationId,
        reason: &str,
        actor: EmployeeId,
    ) -> Result<ApplicationRecord, ApplicationServiceError> {
        let mut record = self.get(id)?;
        let last_seen = record.updated_at;
        let now = Utc::now();
        record.processing.reject(reason, actor, now)?;
        record.updated_at = now;
        self.repository.update_application(&record, last_seen)?;
        info!(application_id = %id, employee_id = %actor, "application rejected");

        let mut details = BTreeMap::new();
        if let Some(reason) = record.processing.rejected_reason.as_ref() {
            details.insert("reason".to_string(), reason.clone());
        }
        self.notify(&record, NotificationTemplate::ApplicationRejected, details);
        Ok(record)
    }

    pub fn reopen(
        &self,
        id: ApplicationId,
        actor: EmployeeId,
    ) -> Result<ApplicationRecord, ApplicationServiceError> {
        let mut record = self.get(id)?;
        let last_seen = record.updated_at;
        let now = Utc::now();
        record.processing.reopen(actor, now)?;
        record.updated_at = now;
        self.repository.update_application(&record, last_seen)?;
        info!(application_id = %id, employee_id = %actor, "application reopened");
        Ok(record)
    }

    pub fn update_task(
        &self,
        id: ApplicationId,
        update: TaskUpdate,
        actor: EmployeeId,
    ) -> Result<ApplicationRecord, ApplicationServiceError> {
        let mut record = self.get(id)?;
        let last_seen = record.updated_at;

        if update.task == ProcessingTask::AssignAppNumber && update.done {
            if let Some(app_number) = update.app_number {
                if self.repository.app_number_in_use(app_number, id)? {
                    return Err(ApplicationServiceError::AppNumberInUse(app_number));
                }
            }
        }

        let invoice_number = if update.task == ProcessingTask::GenerateInvoice
            && update.done
            && record.processing.invoice_number.is_none()
        {
            Some(self.repository.next_invoice_number()?)
        } else {
            record.processing.invoice_number
        };

        let now = Utc::now();
        record
            .processing
            .apply(&update, invoice_number, actor, now)?;
        record.updated_at = now;
        self.repository.update_application(&record, last_seen)?;
        info!(
            application_id = %id,
            employee_id = %actor,
            task = update.task.label(),
            done = update.done,
            "processing task updated"
        );
        Ok(record)
    }

    /// Issue the permit: upsert holder, physician, guardian and permit in one transaction.
    pub fn complete(
        &self,
        id: ApplicationId,
        actor: EmployeeId,
    ) -> Result<CompletionReceipt, ApplicationServiceError> {
        let record = self.get(id)?;

        let (applicant, active_permit) = match record.details.applicant_id() {
            Some(applicant_id) => {
                let applicant = self.repository.fetch_applicant(applicant_id)?;
                let permit = self.repository.active_permit(applicant_id)?;
                (applicant, permit)
            }
            None => (None, None),
        };

        if let Some(app_number) = record.processing.app_number {
            if self.repository.app_number_in_use(app_number, id)? {
                return Err(ApplicationServiceError::AppNumberInUse(app_number));
            }
        }

        let plan = plan_completion(
            &record,
            applicant.as_ref(),
            active_permit.as_ref(),
            actor,
            Utc::now(),
        )?;
        let receipt = self.repository.complete_application(&plan)?;
        info!(
            application_id = %id,
            applicant_id = %receipt.applicant_id,
            rcd_permit_id = receipt.rcd_permit_id,
            "application completed"
        );

        let mut details = BTreeMap::new();
        details.insert(
            "rcd_permit_id".to_string(),
            receipt.rcd_permit_id.to_string(),
        );
        details.insert("expiry_date".to_string(), receipt.expiry_date.to_string());
        self.notify(&record, NotificationTemplate::PermitIssued, details);
        Ok(receipt)
    }

    /// Correct personal or payment details on an application that is not yet completed.
    pub fn amend(
        &self,
        id: ApplicationId,
        amendment: ApplicationAmendment,
    ) -> Result<ApplicationRecord, ApplicationServiceError> {
        let mut record = self.get(id)?;
        let last_seen = record.updated_at;
        if record.status().is_terminal() {
            return Err(ApplicationServiceError::Locked(record.status()));
        }

        let mut errors = ValidationErrors::new();
        if let Some(personal) = amendment.personal.as_ref() {
            errors.check_personal("personal", personal);
        }
        if let Some(payment) = amendment.payment.as_ref() {
            check_payment(&mut errors, payment);
        }
        errors.into_result()?;

        if let Some(personal) = amendment.personal {
            record.personal = normalize_personal(personal);
        }
        if let Some(payment) = amendment.payment {
            record.payment = normalize_payment(payment);
        }
        record.updated_at = Utc::now();
        self.repository.update_application(&record, last_seen)?;
        Ok(record)
    }

    /// Remove an application that never reached fulfillment.
    pub fn delete(&self, id: ApplicationId) -> Result<(), ApplicationServiceError> {
        let record = self.get(id)?;
        if !matches!(
            record.status(),
            ApplicationStatus::Pending | ApplicationStatus::Rejected
        ) {
            return Err(ApplicationServiceError::Locked(record.status()));
        }
        self.repository.delete_application(id)?;
        info!(application_id = %id, "application deleted");
        Ok(())
    }

    fn active_holder(
        &self,
        applicant_id: ApplicantId,
    ) -> Result<ApplicantRecord, ApplicationServiceError> {
        let holder = self
            .repository
            .fetch_applicant(applicant_id)?
            .ok_or(ApplicationServiceError::UnknownApplicant(applicant_id))?;
        if !holder.is_active() {
            return Err(ApplicationServiceError::ApplicantInactive(applicant_id));
        }
        Ok(holder)
    }

    fn notify(
        &self,
        record: &ApplicationRecord,
        template: NotificationTemplate,
        details: BTreeMap<String, String>,
    ) {
        let Some(recipient) = record.personal.notification_email() else {
            return;
        };

        let notification = ApplicantNotification {
            template,
            application_id: record.id,
            recipient: recipient.to_string(),
            details,
        };
        if let Err(err) = self.notifications.publish(notification) {
            warn!(application_id = %record.id, ?template, error = %err, "applicant notification failed");
        }
    }
}

/// Error raised by the application service.
#[derive(Debug, thiserror::Error)]
pub enum ApplicationServiceError {
    #[error(transparent)]
    Validation(#[from] ValidationErrors),
    #[error(transparent)]
    Processing(#[from] ProcessingError),
    #[error(transparent)]
    Completion(#[from] CompletionError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error("applicant {0} does not exist")]
    UnknownApplicant(ApplicantId),
    #[error("applicant {0} is inactive")]
    ApplicantInactive(ApplicantId),
    #[error("applicant {0} has no active permit")]
    NoActivePermit(ApplicantId),
    #[error("APP number {0} is already assigned")]
    AppNumberInUse(i64),
    #[error("application is {} and can no longer be changed", .0.label())]
    Locked(ApplicationStatus),
}
