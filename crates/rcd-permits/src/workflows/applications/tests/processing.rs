use chrono::Utc;

use super::common::STAFF;
use crate::workflows::applications::domain::ApplicationStatus;
use crate::workflows::applications::processing::{
    ApplicationProcessing, ProcessingError, ProcessingTask, TaskUpdate,
};

fn in_progress() -> ApplicationProcessing {
    let mut processing = ApplicationProcessing::new();
    processing.approve(STAFF, Utc::now()).expect("approve");
    processing
}

fn assign(processing: &mut ApplicationProcessing, app_number: i64) {
    let update = TaskUpdate {
        app_number: Some(app_number),
        ..TaskUpdate::done(ProcessingTask::AssignAppNumber)
    };
    processing
        .apply(&update, None, STAFF, Utc::now())
        .expect("assign app number");
}

#[test]
fn approve_only_from_pending() {
    let mut processing = in_progress();
    assert_eq!(processing.status, ApplicationStatus::InProgress);
    assert!(processing.status_changed.is_some());

    match processing.approve(STAFF, Utc::now()) {
        Err(ProcessingError::InvalidTransition {
            from: ApplicationStatus::InProgress,
            action: "approve",
        }) => {}
        other => panic!("expected invalid transition, got {other:?}"),
    }
}

#[test]
fn reject_requires_reason_and_reopen_clears_it() {
    let mut processing = ApplicationProcessing::new();
    assert_eq!(
        processing.reject("  ", STAFF, Utc::now()),
        Err(ProcessingError::MissingRejectionReason)
    );

    processing
        .reject(" Physician signature missing ", STAFF, Utc::now())
        .expect("reject");
    assert_eq!(processing.status, ApplicationStatus::Rejected);
    assert_eq!(
        processing.rejected_reason.as_deref(),
        Some("Physician signature missing")
    );

    processing.reopen(STAFF, Utc::now()).expect("reopen");
    assert_eq!(processing.status, ApplicationStatus::Pending);
    assert!(processing.rejected_reason.is_none());
}

#[test]
fn refunded_application_stays_rejected() {
    let mut processing = in_progress();
    processing
        .reject("Duplicate request", STAFF, Utc::now())
        .expect("reject");
    processing
        .apply(
            &TaskUpdate::done(ProcessingTask::RefundPayment),
            None,
            STAFF,
            Utc::now(),
        )
        .expect("refund");

    assert_eq!(
        processing.reopen(STAFF, Utc::now()),
        Err(ProcessingError::AlreadyRefunded)
    );
}

#[test]
fn tasks_locked_outside_in_progress() {
    let mut processing = ApplicationProcessing::new();
    match processing.apply(
        &TaskUpdate::done(ProcessingTask::ReviewRequest),
        None,
        STAFF,
        Utc::now(),
    ) {
        Err(ProcessingError::TaskUnavailable {
            task: ProcessingTask::ReviewRequest,
            status: ApplicationStatus::Pending,
        }) => {}
        other => panic!("expected task unavailable, got {other:?}"),
    }

    let mut approved = in_progress();
    assert!(matches!(
        approved.apply(
            &TaskUpdate::done(ProcessingTask::RefundPayment),
            None,
            STAFF,
            Utc::now()
        ),
        Err(ProcessingError::TaskUnavailable { .. })
    ));
}

#[test]
fn prerequisites_gate_tasks() {
    let mut processing = in_progress();
    match processing.apply(
        &TaskUpdate::done(ProcessingTask::HolePunch),
        None,
        STAFF,
        Utc::now(),
    ) {
        Err(ProcessingError::PrerequisiteMissing {
            task: ProcessingTask::HolePunch,
            missing: ProcessingTask::AssignAppNumber,
        }) => {}
        other => panic!("expected prerequisite error, got {other:?}"),
    }

    assign(&mut processing, 41877);
    processing
        .apply(
            &TaskUpdate::done(ProcessingTask::HolePunch),
            None,
            STAFF,
            Utc::now(),
        )
        .expect("hole punch after app number");
    assert!(processing.app_holepunched);
    assert!(processing
        .task_changes
        .contains_key(&ProcessingTask::HolePunch));
}

#[test]
fn undo_blocked_by_done_dependents() {
    let mut processing = in_progress();
    assign(&mut processing, 41877);
    processing
        .apply(
            &TaskUpdate::done(ProcessingTask::CreateWalletCard),
            None,
            STAFF,
            Utc::now(),
        )
        .expect("wallet card");

    match processing.apply(
        &TaskUpdate::undo(ProcessingTask::AssignAppNumber),
        None,
        STAFF,
        Utc::now(),
    ) {
        Err(ProcessingError::DependentTaskDone {
            dependent: ProcessingTask::CreateWalletCard,
            ..
        }) => {}
        other => panic!("expected dependent error, got {other:?}"),
    }
}

#[test]
fn valued_tasks_need_values() {
    let mut processing = in_progress();
    assert!(matches!(
        processing.apply(
            &TaskUpdate::done(ProcessingTask::AssignAppNumber),
            None,
            STAFF,
            Utc::now()
        ),
        Err(ProcessingError::MissingValue {
            field: "appNumber",
            ..
        })
    ));
    assert!(matches!(
        processing.apply(
            &TaskUpdate::done(ProcessingTask::UploadDocuments),
            None,
            STAFF,
            Utc::now()
        ),
        Err(ProcessingError::MissingValue {
            field: "documentsUrl",
            ..
        })
    ));

    processing
        .apply(
            &TaskUpdate::done(ProcessingTask::ReviewRequest),
            None,
            STAFF,
            Utc::now(),
        )
        .expect("review");
    processing
        .apply(
            &TaskUpdate::done(ProcessingTask::GenerateInvoice),
            Some(12),
            STAFF,
            Utc::now(),
        )
        .expect("invoice");
    assert_eq!(processing.invoice_number, Some(12));
}

#[test]
fn completion_needs_every_fulfillment_task() {
    let mut processing = in_progress();
    assign(&mut processing, 41877);

    match processing.ready_for_completion() {
        Err(ProcessingError::IncompleteTasks(outstanding)) => {
            assert_eq!(outstanding.len(), 6);
            assert!(!outstanding.contains(&ProcessingTask::AssignAppNumber));
        }
        other => panic!("expected incomplete tasks, got {other:?}"),
    }
    assert_eq!(processing.outstanding_tasks().first(), Some(&ProcessingTask::HolePunch));
}

#[test]
fn app_number_cannot_change_under_a_punched_permit() {
    let mut processing = in_progress();
    assign(&mut processing, 41877);

    // Nothing depends on the number yet, so a correction is fine.
    assign(&mut processing, 41878);
    assert_eq!(processing.app_number, Some(41878));

    processing
        .apply(
            &TaskUpdate::done(ProcessingTask::HolePunch),
            None,
            STAFF,
            Utc::now(),
        )
        .expect("hole punch");

    let renumber = TaskUpdate {
        app_number: Some(41879),
        ..TaskUpdate::done(ProcessingTask::AssignAppNumber)
    };
    assert_eq!(
        processing.apply(&renumber, None, STAFF, Utc::now()),
        Err(ProcessingError::DependentTaskDone {
            task: ProcessingTask::AssignAppNumber,
            dependent: ProcessingTask::HolePunch,
        })
    );
    assert_eq!(processing.app_number, Some(41878));

    // Re-confirming the same number changes nothing.
    assign(&mut processing, 41878);
}
