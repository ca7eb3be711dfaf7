//! End-to-end permit scenarios driven through the public services over a SQLite store.
//!
//! Each scenario submits applications, walks them through review and fulfillment, and checks
//! the permit holder records and reports that completion leaves behind.

mod common {
    use std::sync::Arc;

    use chrono::{Months, NaiveDate, Utc};

    use rcd_permits::storage::SqliteStore;
    use rcd_permits::workflows::applicants::{
        ApplicantId, MedicalAssessment, MobilityAid, PatientCondition,
    };
    use rcd_permits::workflows::applications::{
        ApplicantNotification, ApplicationId, ApplicationService, FeeSchedule,
        NewApplicationDetails, NewApplicationInput, NotificationError, NotificationPublisher,
        PaymentInformation, PaymentMethod, PermitType, ProcessingTask, RenewalApplicationDetails,
        RenewalApplicationInput, ReplacementApplicationDetails, ReplacementApplicationInput,
        ReplacementReason, TaskUpdate,
    };
    use rcd_permits::workflows::employees::EmployeeId;
    use rcd_permits::workflows::people::{Address, Gender, PersonalInformation, Province};
    use rcd_permits::workflows::physicians::PhysicianDetails;

    pub(super) const STAFF: EmployeeId = EmployeeId(3);

    pub(super) struct SilentNotifier;

    impl NotificationPublisher for SilentNotifier {
        fn publish(&self, _notification: ApplicantNotification) -> Result<(), NotificationError> {
            Ok(())
        }
    }

    pub(super) type Service = ApplicationService<SqliteStore, SilentNotifier>;

    pub(super) fn open() -> (Service, Arc<SqliteStore>) {
        let store = Arc::new(SqliteStore::open(":memory:").expect("store opens"));
        let service = ApplicationService::new(
            store.clone(),
            Arc::new(SilentNotifier),
            FeeSchedule::default(),
        );
        (service, store)
    }

    pub(super) fn today() -> NaiveDate {
        Utc::now().date_naive()
    }

    fn address(line1: &str, postal_code: &str) -> Address {
        Address {
            line1: line1.to_string(),
            line2: None,
            city: "Richmond".to_string(),
            province: Province::Bc,
            postal_code: postal_code.to_string(),
        }
    }

    pub(super) fn personal() -> PersonalInformation {
        PersonalInformation {
            first_name: "Harold".to_string(),
            middle_name: Some("James".to_string()),
            last_name: "Whitfield".to_string(),
            phone: "778-555-0163".to_string(),
            email: None,
            receive_email_updates: false,
            address: address("7400 Westminster Hwy", "V6X 1A1"),
        }
    }

    pub(super) fn payment(method: PaymentMethod, donation_cents: i64) -> PaymentInformation {
        PaymentInformation {
            payment_method: method,
            processing_fee_cents: 2600,
            donation_cents,
            paid_through_shopify: false,
            shopify_order_number: None,
            ship_to_same_address: true,
            shipping_address: None,
            bill_to_same_address: true,
            billing_address: None,
        }
    }

    pub(super) fn physician(msp_number: &str, last_name: &str) -> PhysicianDetails {
        PhysicianDetails {
            msp_number: msp_number.to_string(),
            first_name: "Priya".to_string(),
            last_name: last_name.to_string(),
            phone: "604 555 0177".to_string(),
            address: address("3580 Moncton St", "V7E 3A4"),
            notes: None,
        }
    }

    pub(super) fn new_application(permit_type: PermitType) -> NewApplicationInput {
        NewApplicationInput {
            permit_type,
            personal: personal(),
            payment: payment(PaymentMethod::Cheque, 0),
            details: NewApplicationDetails {
                date_of_birth: NaiveDate::from_ymd_opt(1944, 11, 30).expect("valid date"),
                gender: Gender::Male,
                other_gender: None,
                medical: MedicalAssessment {
                    disability: "Parkinson's disease".to_string(),
                    disability_certification_date: today(),
                    patient_condition: PatientCondition::MobilityAidRequired,
                    mobility_aids: vec![MobilityAid::Cane, MobilityAid::Scooter],
                    notes: None,
                },
                physician: physician("70011", "Raman"),
                omit_guardian: true,
                guardian: None,
                requested_expiry: match permit_type {
                    PermitType::Permanent => None,
                    PermitType::Temporary => Some(
                        today()
                            .checked_add_months(Months::new(6))
                            .expect("date in range"),
                    ),
                },
                uses_accessible_converted_van: true,
                requires_wider_parking_space: true,
            },
        }
    }

    pub(super) fn renewal(applicant_id: ApplicantId) -> RenewalApplicationInput {
        RenewalApplicationInput {
            applicant_id: applicant_id.0,
            personal: personal(),
            payment: payment(PaymentMethod::Etransfer, 2500),
            details: RenewalApplicationDetails {
                applicant_id: ApplicantId::default(),
                physician_changed: true,
                physician: Some(physician("70099", "Osei")),
                uses_accessible_converted_van: true,
                requires_wider_parking_space: false,
            },
        }
    }

    pub(super) fn lost_replacement(applicant_id: ApplicantId) -> ReplacementApplicationInput {
        ReplacementApplicationInput {
            applicant_id: applicant_id.0,
            personal: personal(),
            payment: payment(PaymentMethod::Cash, 0),
            details: ReplacementApplicationDetails {
                applicant_id: ApplicantId::default(),
                reason: ReplacementReason::Lost,
                lost_timestamp: Some(Utc::now()),
                lost_location: Some("Richmond Centre parkade".to_string()),
                stolen_police_file_number: None,
                stolen_jurisdiction: None,
                event_description: None,
            },
        }
    }

    pub(super) fn process(service: &Service, id: ApplicationId, app_number: i64) {
        service.approve(id, STAFF).expect("approved");
        for task in ProcessingTask::fulfillment() {
            let mut update = TaskUpdate::done(task);
            if task == ProcessingTask::AssignAppNumber {
                update.app_number = Some(app_number);
            }
            if task == ProcessingTask::UploadDocuments {
                update.documents_url = Some(format!("https://files.rcd.example/{app_number}"));
            }
            service
                .update_task(id, update, STAFF)
                .unwrap_or_else(|err| panic!("{} failed: {err}", task.label()));
        }
    }
}

use chrono::Months;

use rcd_permits::workflows::applicants::{
    ApplicantRepository, ApplicantService, ApplicantServiceError, IdentityClaim,
    IdentityVerificationFailure,
};
use rcd_permits::workflows::applications::{
    ApplicationStatus, PaymentMethod, PermitType, Submitter,
};
use rcd_permits::workflows::physicians::PhysicianRepository;
use rcd_permits::workflows::reports::{ReportRange, ReportService};

use common::*;

#[test]
fn renewal_replaces_the_active_permit_and_physician() {
    let (service, store) = open();

    let first = service
        .create_new(new_application(PermitType::Permanent))
        .expect("new application stored");
    process(&service, first.id, 30_100);
    let issued = service.complete(first.id, STAFF).expect("permit issued");

    let renewal = service
        .create_renewal(renewal(issued.applicant_id), Submitter::Employee(STAFF))
        .expect("renewal stored");
    process(&service, renewal.id, 30_250);
    let renewed = service.complete(renewal.id, STAFF).expect("renewal issued");
    assert_eq!(renewed.applicant_id, issued.applicant_id);

    let permits = store
        .applicant_permits(issued.applicant_id)
        .expect("permits listed");
    assert_eq!(permits.len(), 2);
    assert_eq!(permits[0].rcd_permit_id, 30_250);
    assert!(permits[0].active);
    assert!(!permits[1].active);

    let holder = store
        .fetch_applicant(issued.applicant_id)
        .expect("fetch")
        .expect("holder exists");
    assert_eq!(holder.rcd_user_id, 30_100);
    assert_eq!(holder.physician_msp_number, "70099");
    assert!(store
        .fetch_physician("70099")
        .expect("fetch physician")
        .is_some());

    let stored = service.get(renewal.id).expect("renewal reloads");
    assert_eq!(stored.status(), ApplicationStatus::Completed);
    assert_eq!(stored.applicant_id, Some(issued.applicant_id));
}

#[test]
fn replacement_keeps_temporary_permit_terms() {
    let (service, store) = open();

    let first = service
        .create_new(new_application(PermitType::Temporary))
        .expect("new application stored");
    process(&service, first.id, 41_000);
    let issued = service.complete(first.id, STAFF).expect("permit issued");

    let replacement = service
        .create_replacement(lost_replacement(issued.applicant_id))
        .expect("replacement stored");
    assert_eq!(replacement.permit_type, PermitType::Temporary);
    process(&service, replacement.id, 41_001);
    let replaced = service
        .complete(replacement.id, STAFF)
        .expect("replacement issued");

    assert_eq!(replaced.expiry_date, issued.expiry_date);
    let active = store
        .active_permit(issued.applicant_id)
        .expect("lookup")
        .expect("active permit");
    assert_eq!(active.rcd_permit_id, 41_001);
    assert_eq!(active.permit_type, PermitType::Temporary);
}

#[test]
fn identity_check_explains_why_renewal_is_unavailable() {
    let (service, store) = open();
    let applicants = ApplicantService::new(store.clone());

    let permanent = service
        .create_new(new_application(PermitType::Permanent))
        .expect("stored");
    process(&service, permanent.id, 52_000);
    service.complete(permanent.id, STAFF).expect("issued");

    let claim = IdentityClaim {
        rcd_user_id: 52_000,
        phone_suffix: "0163".to_string(),
        date_of_birth: chrono::NaiveDate::from_ymd_opt(1944, 11, 30).expect("valid date"),
    };
    let outcome = applicants.verify_identity(&claim, today());
    assert!(matches!(
        outcome,
        Err(ApplicantServiceError::Identity(
            IdentityVerificationFailure::PermitNotExpiringSoon
        ))
    ));

    let near_expiry = today()
        .checked_add_months(Months::new(36))
        .expect("date in range");
    let verified = applicants
        .verify_identity(&claim, near_expiry)
        .expect("eligible near expiry");
    assert_eq!(verified.rcd_user_id, 52_000);

    let wrong_phone = IdentityClaim {
        phone_suffix: "9999".to_string(),
        ..claim
    };
    assert!(matches!(
        applicants.verify_identity(&wrong_phone, near_expiry),
        Err(ApplicantServiceError::Identity(
            IdentityVerificationFailure::IdentityMismatch
        ))
    ));
}

#[test]
fn reports_cover_completed_work() {
    let (service, store) = open();
    let reports = ReportService::new(store);

    let first = service
        .create_new(new_application(PermitType::Permanent))
        .expect("stored");
    process(&service, first.id, 60_000);
    let issued = service.complete(first.id, STAFF).expect("issued");

    let pending = service
        .create_new(new_application(PermitType::Permanent))
        .expect("second stored");

    let range = ReportRange::new(today(), today());
    let applications = reports
        .applications_report(range)
        .expect("applications report");
    assert_eq!(applications.len(), 2);
    assert!(applications
        .iter()
        .any(|row| row.application_id == pending.id.0 && row.app_number.is_none()));

    let accountant = reports.accountant_report(range).expect("accountant report");
    let cheque = accountant
        .rows
        .iter()
        .find(|row| row.payment_method == PaymentMethod::Cheque)
        .expect("cheque row");
    assert_eq!(cheque.application_count, 1);
    assert_eq!(accountant.totals.total_cents, 2600);

    let expiry = ReportRange::new(issued.expiry_date, issued.expiry_date);
    let holders = reports
        .permit_holders_report(expiry)
        .expect("permit holders report");
    assert_eq!(holders.len(), 1);
    assert_eq!(holders[0].rcd_permit_id, 60_000);
    assert_eq!(holders[0].applicant_name, "Harold James Whitfield");
}
