use std::sync::Arc;

use chrono::{Duration, Utc};

use super::common::*;
use crate::pagination::PageRequest;
use crate::storage::{RepositoryError, SqliteStore};
use crate::workflows::applicants::domain::{ApplicantFilter, ApplicantId, ApplicantStatus};
use crate::workflows::applicants::ApplicantRepository;
use crate::workflows::applications::domain::{
    ApplicationAmendment, ApplicationFilter, ApplicationStatus, ApplicationType, PermitType,
    ReplacementReason,
};
use crate::workflows::applications::processing::{ProcessingTask, TaskUpdate};
use crate::workflows::applications::repository::{ApplicationRepository, NotificationTemplate};
use crate::workflows::applications::{
    ApplicationService, ApplicationServiceError, FeeSchedule, Submitter,
};
use crate::workflows::physicians::PhysicianRepository;

#[test]
fn completing_new_application_creates_holder_and_permit() {
    let (service, store, notifier) = build_service();

    let record = service
        .create_new(new_input(PermitType::Permanent))
        .expect("created");
    assert_eq!(record.status(), ApplicationStatus::Pending);
    assert!(record.applicant_id.is_none());

    fulfil(&service, record.id, 30117);
    let receipt = service.complete(record.id, STAFF).expect("completed");

    let applicant = store
        .fetch_applicant(receipt.applicant_id)
        .expect("fetch")
        .expect("holder created");
    assert_eq!(applicant.rcd_user_id, 30117);
    assert_eq!(applicant.physician_msp_number, "40213");
    assert_eq!(applicant.status, ApplicantStatus::Active);

    let permit = store
        .active_permit(receipt.applicant_id)
        .expect("fetch")
        .expect("permit issued");
    assert_eq!(permit.rcd_permit_id, 30117);
    assert_eq!(permit.expiry_date, receipt.expiry_date);
    assert_eq!(permit.application_id, record.id);

    assert!(store.fetch_physician("40213").expect("fetch").is_some());

    let stored = service.get(record.id).expect("stored");
    assert_eq!(stored.status(), ApplicationStatus::Completed);
    assert_eq!(stored.applicant_id, Some(receipt.applicant_id));

    let templates: Vec<_> = notifier.sent().into_iter().map(|n| n.template).collect();
    assert_eq!(
        templates,
        vec![
            NotificationTemplate::ApplicationReceived,
            NotificationTemplate::PermitIssued
        ]
    );
}

#[test]
fn renewal_replaces_active_permit() {
    let (service, store, _) = build_service();
    let applicant_id = issue_permit(&service, 30200);

    let renewal = service
        .create_renewal(renewal_input(applicant_id), Submitter::Employee(STAFF))
        .expect("renewal created");
    assert_eq!(renewal.application_type, ApplicationType::Renewal);
    assert_eq!(renewal.applicant_id, Some(applicant_id));

    fulfil(&service, renewal.id, 30201);
    service.complete(renewal.id, STAFF).expect("renewed");

    let permits = store.applicant_permits(applicant_id).expect("permits");
    assert_eq!(permits.len(), 2);
    assert_eq!(permits[0].rcd_permit_id, 30201);
    assert!(permits[0].active);
    assert!(!permits[1].active, "previous permit deactivated");

    let applicant = store
        .fetch_applicant(applicant_id)
        .expect("fetch")
        .expect("holder");
    assert_eq!(applicant.rcd_user_id, 30200, "holder number is stable");
}

#[test]
fn self_service_renewal_charges_scheduled_fee() {
    let (service, _, _) = build_service();
    let applicant_id = issue_permit(&service, 30300);

    let mut input = renewal_input(applicant_id);
    input.payment.processing_fee_cents = 0;
    let record = service
        .create_renewal(input, Submitter::Applicant)
        .expect("renewal created");
    assert_eq!(record.payment.processing_fee_cents, 2600);
}

#[test]
fn renewal_for_unknown_or_inactive_holder_fails() {
    let (service, store, _) = build_service();

    match service.create_renewal(renewal_input(ApplicantId(404)), Submitter::Applicant) {
        Err(ApplicationServiceError::UnknownApplicant(ApplicantId(404))) => {}
        other => panic!("expected unknown applicant, got {other:?}"),
    }

    let applicant_id = issue_permit(&service, 30400);
    let mut holder = store
        .fetch_applicant(applicant_id)
        .expect("fetch")
        .expect("holder");
    holder.status = ApplicantStatus::Inactive;
    store.update_applicant(&holder).expect("deactivate");

    assert!(matches!(
        service.create_renewal(renewal_input(applicant_id), Submitter::Employee(STAFF)),
        Err(ApplicationServiceError::ApplicantInactive(_))
    ));
}

#[test]
fn replacement_mirrors_active_permit_type() {
    let (service, store, _) = build_service();
    let record = service
        .create_new(new_input(PermitType::Temporary))
        .expect("created");
    fulfil(&service, record.id, 30500);
    let receipt = service.complete(record.id, STAFF).expect("completed");

    let replacement = service
        .create_replacement(replacement_input(
            receipt.applicant_id,
            ReplacementReason::Stolen,
        ))
        .expect("replacement created");
    assert_eq!(replacement.permit_type, PermitType::Temporary);

    fulfil(&service, replacement.id, 30501);
    let replaced = service.complete(replacement.id, STAFF).expect("replaced");
    assert_eq!(replaced.expiry_date, receipt.expiry_date);

    let active = store
        .active_permit(receipt.applicant_id)
        .expect("fetch")
        .expect("active permit");
    assert_eq!(active.rcd_permit_id, 30501);
}

#[test]
fn app_numbers_are_unique() {
    let (service, _, _) = build_service();
    issue_permit(&service, 30700);

    let record = service
        .create_new(new_input(PermitType::Permanent))
        .expect("created");
    service.approve(record.id, STAFF).expect("approve");

    let update = TaskUpdate {
        app_number: Some(30700),
        ..TaskUpdate::done(ProcessingTask::AssignAppNumber)
    };
    match service.update_task(record.id, update, STAFF) {
        Err(ApplicationServiceError::AppNumberInUse(30700)) => {}
        other => panic!("expected app number conflict, got {other:?}"),
    }
}

#[test]
fn invoice_numbers_are_sequential_and_kept() {
    let (service, _, _) = build_service();
    let mut invoices = Vec::new();
    for _ in 0..2 {
        let record = service
            .create_new(new_input(PermitType::Permanent))
            .expect("created");
        service.approve(record.id, STAFF).expect("approve");
        service
            .update_task(
                record.id,
                TaskUpdate::done(ProcessingTask::ReviewRequest),
                STAFF,
            )
            .expect("review");
        let invoiced = service
            .update_task(
                record.id,
                TaskUpdate::done(ProcessingTask::GenerateInvoice),
                STAFF,
            )
            .expect("invoice");
        invoices.push(invoiced.processing.invoice_number.expect("invoice number"));
    }

    assert_eq!(invoices[1], invoices[0] + 1);
}

#[test]
fn rejection_notifies_and_refund_blocks_reopen() {
    let (service, _, notifier) = build_service();
    let record = service
        .create_new(new_input(PermitType::Permanent))
        .expect("created");

    let rejected = service
        .reject(record.id, "Medical certification expired", STAFF)
        .expect("rejected");
    assert_eq!(rejected.status(), ApplicationStatus::Rejected);
    let last = notifier.sent().pop().expect("notification sent");
    assert_eq!(last.template, NotificationTemplate::ApplicationRejected);
    assert_eq!(
        last.details.get("reason").map(String::as_str),
        Some("Medical certification expired")
    );
    assert_eq!(last.recipient, "margaret.chan@example.com");

    service
        .update_task(
            record.id,
            TaskUpdate::done(ProcessingTask::RefundPayment),
            STAFF,
        )
        .expect("refund");
    assert!(matches!(
        service.reopen(record.id, STAFF),
        Err(ApplicationServiceError::Processing(_))
    ));
}

#[test]
fn notification_failures_do_not_fail_requests() {
    let store = Arc::new(SqliteStore::open_in_memory().expect("store"));
    let service = ApplicationService::new(
        store,
        Arc::new(UnreachableNotifier),
        FeeSchedule::default(),
    );

    service
        .create_new(new_input(PermitType::Permanent))
        .expect("created despite notification failure");
}

#[test]
fn opted_out_applicants_get_no_mail() {
    let (service, _, notifier) = build_service();
    let mut input = new_input(PermitType::Permanent);
    input.personal.receive_email_updates = false;

    service.create_new(input).expect("created");
    assert!(notifier.sent().is_empty());
}

#[test]
fn delete_only_before_fulfillment() {
    let (service, store, _) = build_service();
    let pending = service
        .create_new(new_input(PermitType::Permanent))
        .expect("created");
    service.delete(pending.id).expect("pending deleted");
    assert!(store.fetch_application(pending.id).expect("fetch").is_none());

    let approved = service
        .create_new(new_input(PermitType::Permanent))
        .expect("created");
    service.approve(approved.id, STAFF).expect("approve");
    match service.delete(approved.id) {
        Err(ApplicationServiceError::Locked(ApplicationStatus::InProgress)) => {}
        other => panic!("expected locked, got {other:?}"),
    }
}

#[test]
fn amend_validates_and_locks_after_completion() {
    let (service, _, _) = build_service();
    let record = service
        .create_new(new_input(PermitType::Permanent))
        .expect("created");

    let mut invalid = personal();
    invalid.phone = "12".to_string();
    match service.amend(
        record.id,
        ApplicationAmendment {
            personal: Some(invalid),
            payment: None,
        },
    ) {
        Err(ApplicationServiceError::Validation(errors)) => {
            assert!(errors.contains("personal.phone"));
        }
        other => panic!("expected validation error, got {other:?}"),
    }

    let mut renamed = personal();
    renamed.last_name = "Chan-Wong".to_string();
    let amended = service
        .amend(
            record.id,
            ApplicationAmendment {
                personal: Some(renamed),
                payment: None,
            },
        )
        .expect("amended");
    assert_eq!(amended.personal.last_name, "Chan-Wong");

    fulfil(&service, record.id, 30800);
    service.complete(record.id, STAFF).expect("completed");
    assert!(matches!(
        service.amend(record.id, ApplicationAmendment::default()),
        Err(ApplicationServiceError::Locked(ApplicationStatus::Completed))
    ));
}

#[test]
fn search_filters_and_pages() {
    let (service, _, _) = build_service();
    for _ in 0..3 {
        service
            .create_new(new_input(PermitType::Permanent))
            .expect("created");
    }
    let temporary = service
        .create_new(new_input(PermitType::Temporary))
        .expect("created");

    let page = service
        .search(
            &ApplicationFilter {
                permit_type: Some(PermitType::Temporary),
                ..ApplicationFilter::default()
            },
            PageRequest::default(),
        )
        .expect("search");
    assert_eq!(page.total_count, 1);
    assert_eq!(page.items[0].id, temporary.id);

    let page = service
        .search(
            &ApplicationFilter {
                search: Some("chan".to_string()),
                ..ApplicationFilter::default()
            },
            PageRequest::new(Some(0), Some(2)),
        )
        .expect("search");
    assert_eq!(page.total_count, 4);
    assert_eq!(page.items.len(), 2);
    assert!(page.has_next_page());
    assert_eq!(page.items[0].id, temporary.id, "newest first");
}

#[test]
fn missing_application_is_not_found() {
    let (service, _, _) = build_service();
    match service.approve(crate::workflows::applications::ApplicationId(999), STAFF) {
        Err(ApplicationServiceError::Repository(RepositoryError::NotFound)) => {}
        other => panic!("expected not found, got {other:?}"),
    }
}

#[test]
fn stale_write_cannot_undo_a_concurrent_rejection() {
    let (service, store, _) = build_service();
    let record = service
        .create_new(new_input(PermitType::Permanent))
        .expect("created");
    service.approve(record.id, STAFF).expect("approve");

    let stale = service.get(record.id).expect("in progress");
    service
        .reject(record.id, "Duplicate of an earlier request", STAFF)
        .expect("rejected");

    let mut overwrite = stale.clone();
    overwrite.updated_at = Utc::now();
    let err = store
        .update_application(&overwrite, stale.updated_at)
        .expect_err("stale write refused");
    assert!(matches!(err, RepositoryError::Conflict(_)), "{err:?}");

    let stored = service.get(record.id).expect("stored");
    assert_eq!(stored.status(), ApplicationStatus::Rejected);
    assert!(matches!(
        service.update_task(record.id, TaskUpdate::done(ProcessingTask::ReviewRequest), STAFF),
        Err(ApplicationServiceError::Processing(_))
    ));
}

#[test]
fn search_matches_creation_dates_and_holder_rcd_user_id() {
    let (service, _, _) = build_service();
    let holder = issue_permit(&service, 30555);
    let renewal = service
        .create_renewal(renewal_input(holder), Submitter::Employee(STAFF))
        .expect("renewal created");
    service
        .create_new(new_input(PermitType::Permanent))
        .expect("unrelated application");

    let by_rcd_user_id = service
        .search(
            &ApplicationFilter {
                search: Some("30555".to_string()),
                ..ApplicationFilter::default()
            },
            PageRequest::default(),
        )
        .expect("search");
    assert_eq!(by_rcd_user_id.total_count, 2);
    assert_eq!(by_rcd_user_id.items[0].id, renewal.id);
    assert!(by_rcd_user_id
        .items
        .iter()
        .all(|record| record.applicant_id == Some(holder)));

    let created_today = Utc::now().date_naive();
    let within = service
        .search(
            &ApplicationFilter {
                created_from: Some(created_today),
                created_to: Some(created_today),
                ..ApplicationFilter::default()
            },
            PageRequest::default(),
        )
        .expect("search");
    assert_eq!(within.total_count, 3);

    for filter in [
        ApplicationFilter {
            created_from: Some(created_today + Duration::days(1)),
            ..ApplicationFilter::default()
        },
        ApplicationFilter {
            created_to: Some(created_today - Duration::days(1)),
            ..ApplicationFilter::default()
        },
    ] {
        let page = service
            .search(&filter, PageRequest::default())
            .expect("search");
        assert_eq!(page.total_count, 0, "{filter:?}");
    }
}

#[test]
fn applicants_filter_on_active_permit_expiry() {
    let (service, store, _) = build_service();
    let permanent = issue_permit(&service, 30601);

    let temporary_application = service
        .create_new(new_input(PermitType::Temporary))
        .expect("created");
    fulfil(&service, temporary_application.id, 30602);
    let temporary = service
        .complete(temporary_application.id, STAFF)
        .expect("completed")
        .applicant_id;

    let expiring = |from, to| {
        store
            .search_applicants(
                &ApplicantFilter {
                    permit_expiry_from: from,
                    permit_expiry_to: to,
                    ..ApplicantFilter::default()
                },
                PageRequest::default(),
            )
            .expect("search")
            .items
            .into_iter()
            .map(|applicant| applicant.id)
            .collect::<Vec<_>>()
    };

    assert_eq!(
        expiring(Some(today()), Some(months_from_today(12))),
        vec![temporary]
    );
    assert_eq!(expiring(Some(months_from_today(12)), None), vec![permanent]);
    assert!(expiring(None, Some(today())).is_empty());
}
