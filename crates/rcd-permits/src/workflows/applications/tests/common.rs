use std::sync::{Arc, Mutex};

use chrono::{Months, NaiveDate, Utc};

use crate::storage::SqliteStore;
use crate::workflows::applicants::domain::{MedicalAssessment, MobilityAid, PatientCondition};
use crate::workflows::applications::domain::{
    ApplicationId, NewApplicationDetails, NewApplicationInput, PaymentInformation, PaymentMethod,
    PermitType, RenewalApplicationDetails, RenewalApplicationInput, ReplacementApplicationDetails,
    ReplacementApplicationInput, ReplacementReason,
};
use crate::workflows::applications::processing::{ProcessingTask, TaskUpdate};
use crate::workflows::applications::repository::{
    ApplicantNotification, NotificationError, NotificationPublisher,
};
use crate::workflows::applications::{ApplicationService, FeeSchedule};
use crate::workflows::applicants::domain::ApplicantId;
use crate::workflows::employees::EmployeeId;
use crate::workflows::people::{Address, Gender, Guardian, PersonalInformation, Province};
use crate::workflows::physicians::PhysicianDetails;

pub(super) const STAFF: EmployeeId = EmployeeId(7);

pub(super) fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
}

pub(super) fn today() -> NaiveDate {
    Utc::now().date_naive()
}

pub(super) fn months_from_today(months: u32) -> NaiveDate {
    today()
        .checked_add_months(Months::new(months))
        .expect("date in range")
}

pub(super) fn address() -> Address {
    Address {
        line1: "8100 Granville Ave".to_string(),
        line2: Some("Unit 4".to_string()),
        city: "Richmond".to_string(),
        province: Province::Bc,
        postal_code: "v6y 1p3".to_string(),
    }
}

pub(super) fn personal() -> PersonalInformation {
    PersonalInformation {
        first_name: " Margaret ".to_string(),
        middle_name: None,
        last_name: "Chan".to_string(),
        phone: "(604) 555-0142".to_string(),
        email: Some("margaret.chan@example.com".to_string()),
        receive_email_updates: true,
        address: address(),
    }
}

pub(super) fn payment() -> PaymentInformation {
    PaymentInformation {
        payment_method: PaymentMethod::Visa,
        processing_fee_cents: 2600,
        donation_cents: 500,
        paid_through_shopify: false,
        shopify_order_number: None,
        ship_to_same_address: true,
        shipping_address: None,
        bill_to_same_address: true,
        billing_address: None,
    }
}

pub(super) fn physician(msp: &str) -> PhysicianDetails {
    PhysicianDetails {
        msp_number: msp.to_string(),
        first_name: "Amrit".to_string(),
        last_name: "Dhillon".to_string(),
        phone: "604-555-0190".to_string(),
        address: Address {
            line1: "6091 Gilbert Rd".to_string(),
            line2: None,
            city: "Richmond".to_string(),
            province: Province::Bc,
            postal_code: "V7C 3V7".to_string(),
        },
        notes: None,
    }
}

pub(super) fn medical() -> MedicalAssessment {
    MedicalAssessment {
        disability: "Severe osteoarthritis in both knees".to_string(),
        disability_certification_date: date(2025, 3, 14),
        patient_condition: PatientCondition::CannotWalk100m,
        mobility_aids: vec![MobilityAid::Walker],
        notes: None,
    }
}

pub(super) fn guardian() -> Guardian {
    Guardian {
        first_name: "Daniel".to_string(),
        middle_name: None,
        last_name: "Chan".to_string(),
        phone: "604 555 0143".to_string(),
        relationship: "Son".to_string(),
        address: address(),
        poa_form_reference: None,
    }
}

pub(super) fn new_input(permit_type: PermitType) -> NewApplicationInput {
    NewApplicationInput {
        permit_type,
        personal: personal(),
        payment: payment(),
        details: NewApplicationDetails {
            date_of_birth: date(1948, 6, 2),
            gender: Gender::Female,
            other_gender: None,
            medical: medical(),
            physician: physician("40213"),
            omit_guardian: true,
            guardian: None,
            requested_expiry: match permit_type {
                PermitType::Permanent => None,
                PermitType::Temporary => Some(months_from_today(4)),
            },
            uses_accessible_converted_van: false,
            requires_wider_parking_space: true,
        },
    }
}

pub(super) fn renewal_input(applicant_id: ApplicantId) -> RenewalApplicationInput {
    RenewalApplicationInput {
        applicant_id: applicant_id.0,
        personal: personal(),
        payment: payment(),
        details: RenewalApplicationDetails {
            applicant_id: ApplicantId::default(),
            physician_changed: false,
            physician: None,
            uses_accessible_converted_van: false,
            requires_wider_parking_space: false,
        },
    }
}

pub(super) fn replacement_input(
    applicant_id: ApplicantId,
    reason: ReplacementReason,
) -> ReplacementApplicationInput {
    ReplacementApplicationInput {
        applicant_id: applicant_id.0,
        personal: personal(),
        payment: payment(),
        details: ReplacementApplicationDetails {
            applicant_id: ApplicantId::default(),
            reason,
            lost_timestamp: None,
            lost_location: None,
            stolen_police_file_number: Some("RCMP-2026-4471".to_string()),
            stolen_jurisdiction: Some("Richmond".to_string()),
            event_description: None,
        },
    }
}

pub(super) type TestService = ApplicationService<SqliteStore, MemoryNotifier>;

pub(super) fn build_service() -> (TestService, Arc<SqliteStore>, Arc<MemoryNotifier>) {
    let store = Arc::new(SqliteStore::open_in_memory().expect("in-memory store"));
    let notifier = Arc::new(MemoryNotifier::default());
    let service = ApplicationService::new(store.clone(), notifier.clone(), FeeSchedule::default());
    (service, store, notifier)
}

/// Approve the application and tick every fulfillment task.
pub(super) fn fulfil(service: &TestService, id: ApplicationId, app_number: i64) {
    service.approve(id, STAFF).expect("approve");
    service
        .update_task(
            id,
            TaskUpdate {
                app_number: Some(app_number),
                ..TaskUpdate::done(ProcessingTask::AssignAppNumber)
            },
            STAFF,
        )
        .expect("assign app number");
    for task in [
        ProcessingTask::HolePunch,
        ProcessingTask::CreateWalletCard,
        ProcessingTask::ReviewRequest,
        ProcessingTask::GenerateInvoice,
    ] {
        service
            .update_task(id, TaskUpdate::done(task), STAFF)
            .expect("task done");
    }
    service
        .update_task(
            id,
            TaskUpdate {
                documents_url: Some(format!("documents/{id}/bundle.pdf")),
                ..TaskUpdate::done(ProcessingTask::UploadDocuments)
            },
            STAFF,
        )
        .expect("upload documents");
    service
        .update_task(id, TaskUpdate::done(ProcessingTask::MailOut), STAFF)
        .expect("mail out");
}

/// Run a new permanent application through completion and return the new holder.
pub(super) fn issue_permit(service: &TestService, app_number: i64) -> ApplicantId {
    let record = service
        .create_new(new_input(PermitType::Permanent))
        .expect("application created");
    fulfil(service, record.id, app_number);
    service
        .complete(record.id, STAFF)
        .expect("application completed")
        .applicant_id
}

#[derive(Default)]
pub(super) struct MemoryNotifier {
    sent: Mutex<Vec<ApplicantNotification>>,
}

impl MemoryNotifier {
    pub(super) fn sent(&self) -> Vec<ApplicantNotification> {
        self.sent.lock().expect("notifier mutex poisoned").clone()
    }
}

impl NotificationPublisher for MemoryNotifier {
    fn publish(&self, notification: ApplicantNotification) -> Result<(), NotificationError> {
        self.sent
            .lock()
            .expect("notifier mutex poisoned")
            .push(notification);
        Ok(())
    }
}

pub(super) struct UnreachableNotifier;

impl NotificationPublisher for UnreachableNotifier {
    fn publish(&self, _notification: ApplicantNotification) -> Result<(), NotificationError> {
        Err(NotificationError::Transport("smtp relay offline".to_string()))
    }
}
