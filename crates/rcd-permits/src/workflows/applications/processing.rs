//! Review and fulfillment state carried by every application.
//!
//! Status moves `Pending -> InProgress -> Completed`, with `Rejected` reachable from
//! `Pending` or `InProgress` and reopenable until the payment is refunded. Fulfillment
//! tasks are only editable while `InProgress`; the refund task only while `Rejected`.

use std::collections::BTreeMap;

use async_graphql::{Enum, InputObject};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::ApplicationStatus;
use crate::workflows::employees::EmployeeId;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Enum,
)]
#[serde(rename_all = "snake_case")]
pub enum ProcessingTask {
    AssignAppNumber,
    HolePunch,
    CreateWalletCard,
    ReviewRequest,
    GenerateInvoice,
    UploadDocuments,
    MailOut,
    RefundPayment,
}

impl ProcessingTask {
    /// Tasks that must all be done before an application can be completed, in display order.
    pub const fn fulfillment() -> [Self; 7] {
        [
            Self::AssignAppNumber,
            Self::HolePunch,
            Self::CreateWalletCard,
            Self::ReviewRequest,
            Self::GenerateInvoice,
            Self::UploadDocuments,
            Self::MailOut,
        ]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::AssignAppNumber => "Assign new APP number",
            Self::HolePunch => "Hole punch parking permit",
            Self::CreateWalletCard => "Create new wallet card",
            Self::ReviewRequest => "Review request information",
            Self::GenerateInvoice => "Generate invoice",
            Self::UploadDocuments => "Upload documents",
            Self::MailOut => "Mail out APP",
            Self::RefundPayment => "Refund payment",
        }
    }

    pub const fn prerequisites(self) -> &'static [ProcessingTask] {
        match self {
            Self::HolePunch | Self::CreateWalletCard => &[Self::AssignAppNumber],
            Self::GenerateInvoice => &[Self::ReviewRequest],
            Self::MailOut => &[
                Self::AssignAppNumber,
                Self::HolePunch,
                Self::CreateWalletCard,
                Self::ReviewRequest,
                Self::GenerateInvoice,
                Self::UploadDocuments,
            ],
            Self::AssignAppNumber
            | Self::ReviewRequest
            | Self::UploadDocuments
            | Self::RefundPayment => &[],
        }
    }

    /// Tasks that list `self` as a prerequisite.
    pub fn dependents(self) -> Vec<ProcessingTask> {
        Self::fulfillment()
            .into_iter()
            .filter(|task| task.prerequisites().contains(&self))
            .collect()
    }
}

/// Who last changed a task or status, and when.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribution {
    pub employee_id: EmployeeId,
    pub at: DateTime<Utc>,
}

/// Requested change to one processing task.
#[derive(Debug, Clone, PartialEq, Eq, InputObject)]
pub struct TaskUpdate {
    pub task: ProcessingTask,
    pub done: bool,
    /// Required when assigning the APP number.
    pub app_number: Option<i64>,
    /// Required when marking documents uploaded.
    pub documents_url: Option<String>,
}

impl TaskUpdate {
    pub fn done(task: ProcessingTask) -> Self {
        Self {
            task,
            done: true,
            app_number: None,
            documents_url: None,
        }
    }

    pub fn undo(task: ProcessingTask) -> Self {
        Self {
            done: false,
            ..Self::done(task)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationProcessing {
    pub status: ApplicationStatus,
    pub rejected_reason: Option<String>,
    pub app_number: Option<i64>,
    pub app_holepunched: bool,
    pub wallet_card_created: bool,
    pub review_request_completed: bool,
    pub invoice_number: Option<i64>,
    pub documents_url: Option<String>,
    pub app_mailed: bool,
    pub payment_refunded: bool,
    pub status_changed: Option<Attribution>,
    pub task_changes: BTreeMap<ProcessingTask, Attribution>,
}

impl Default for ApplicationProcessing {
    fn default() -> Self {
        Self::new()
    }
}

impl ApplicationProcessing {
    pub fn new() -> Self {
        Self {
            status: ApplicationStatus::Pending,
            rejected_reason: None,
            app_number: None,
            app_holepunched: false,
            wallet_card_created: false,
            review_request_completed: false,
            invoice_number: None,
            documents_url: None,
            app_mailed: false,
            payment_refunded: false,
            status_changed: None,
            task_changes: BTreeMap::new(),
        }
    }

    pub fn is_done(&self, task: ProcessingTask) -> bool {
        match task {
            ProcessingTask::AssignAppNumber => self.app_number.is_some(),
            ProcessingTask::HolePunch => self.app_holepunched,
            ProcessingTask::CreateWalletCard => self.wallet_card_created,
            ProcessingTask::ReviewRequest => self.review_request_completed,
            ProcessingTask::GenerateInvoice => self.invoice_number.is_some(),
            ProcessingTask::UploadDocuments => self.documents_url.is_some(),
            ProcessingTask::MailOut => self.app_mailed,
            ProcessingTask::RefundPayment => self.payment_refunded,
        }
    }

    pub fn outstanding_tasks(&self) -> Vec<ProcessingTask> {
        ProcessingTask::fulfillment()
            .into_iter()
            .filter(|task| !self.is_done(*task))
            .collect()
    }

    pub fn approve(&mut self, actor: EmployeeId, at: DateTime<Utc>) -> Result<(), ProcessingError> {
        self.transition(ApplicationStatus::Pending, "approve")?;
        self.status = ApplicationStatus::InProgress;
        self.status_changed = Some(Attribution {
            employee_id: actor,
            at,
        });
        Ok(())
    }

    pub fn reject(
        &mut self,
        reason: &str,
        actor: EmployeeId,
        at: DateTime<Utc>,
    ) -> Result<(), ProcessingError> {
        if !matches!(
            self.status,
            ApplicationStatus::Pending | ApplicationStatus::InProgress
        ) {
            return Err(ProcessingError::InvalidTransition {
                from: self.status,
                action: "reject",
            });
        }
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(ProcessingError::MissingRejectionReason);
        }

        self.status = ApplicationStatus::Rejected;
        self.rejected_reason = Some(reason.to_string());
        self.status_changed = Some(Attribution {
            employee_id: actor,
            at,
        });
        Ok(())
    }

    /// Return a rejected application to review; fulfillment progress is kept.
    pub fn reopen(&mut self, actor: EmployeeId, at: DateTime<Utc>) -> Result<(), ProcessingError> {
        self.transition(ApplicationStatus::Rejected, "reopen")?;
        if self.payment_refunded {
            return Err(ProcessingError::AlreadyRefunded);
        }
        self.status = ApplicationStatus::Pending;
        self.rejected_reason = None;
        self.status_changed = Some(Attribution {
            employee_id: actor,
            at,
        });
        Ok(())
    }

    /// Apply a task change. `invoice_number` is allocated by the caller for `GenerateInvoice`.
    pub fn apply(
        &mut self,
        update: &TaskUpdate,
        invoice_number: Option<i64>,
        actor: EmployeeId,
        at: DateTime<Utc>,
    ) -> Result<(), ProcessingError> {
        let task = update.task;
        let allowed_status = if task == ProcessingTask::RefundPayment {
            ApplicationStatus::Rejected
        } else {
            ApplicationStatus::InProgress
        };
        if self.status != allowed_status {
            return Err(ProcessingError::TaskUnavailable {
                task,
                status: self.status,
            });
        }

        if update.done {
            if let Some(missing) = task
                .prerequisites()
                .iter()
                .copied()
                .find(|prerequisite| !self.is_done(*prerequisite))
            {
                return Err(ProcessingError::PrerequisiteMissing { task, missing });
            }
        }
        if !update.done || self.replaces_value(update) {
            if let Some(dependent) = task
                .dependents()
                .into_iter()
                .find(|dependent| self.is_done(*dependent))
            {
                return Err(ProcessingError::DependentTaskDone { task, dependent });
            }
        }

        match task {
            ProcessingTask::AssignAppNumber => {
                self.app_number = if update.done {
                    match update.app_number {
                        Some(number) if number > 0 => Some(number),
                        _ => {
                            return Err(ProcessingError::MissingValue {
                                task,
                                field: "appNumber",
                            })
                        }
                    }
                } else {
                    None
                };
            }
            ProcessingTask::HolePunch => self.app_holepunched = update.done,
            ProcessingTask::CreateWalletCard => self.wallet_card_created = update.done,
            ProcessingTask::ReviewRequest => self.review_request_completed = update.done,
            ProcessingTask::GenerateInvoice => {
                self.invoice_number = if update.done {
                    Some(invoice_number.ok_or(ProcessingError::MissingValue {
                        task,
                        field: "invoiceNumber",
                    })?)
                } else {
                    None
                };
            }
            ProcessingTask::UploadDocuments => {
                self.documents_url = if update.done {
                    match update.documents_url.as_deref().map(str::trim) {
                        Some(url) if !url.is_empty() => Some(url.to_string()),
                        _ => {
                            return Err(ProcessingError::MissingValue {
                                task,
                                field: "documentsUrl",
                            })
                        }
                    }
                } else {
                    None
                };
            }
            ProcessingTask::MailOut => self.app_mailed = update.done,
            ProcessingTask::RefundPayment => self.payment_refunded = update.done,
        }

        self.task_changes.insert(
            task,
            Attribution {
                employee_id: actor,
                at,
            },
        );
        Ok(())
    }

    /// Whether a done update would overwrite a value later tasks were carried out against.
    fn replaces_value(&self, update: &TaskUpdate) -> bool {
        match update.task {
            ProcessingTask::AssignAppNumber => {
                self.app_number.is_some() && self.app_number != update.app_number
            }
            ProcessingTask::UploadDocuments => {
                self.documents_url.is_some()
                    && self.documents_url.as_deref()
                        != update.documents_url.as_deref().map(str::trim)
            }
            _ => false,
        }
    }

    /// Check the application may be completed and return its APP number.
    pub fn ready_for_completion(&self) -> Result<i64, ProcessingError> {
        self.transition(ApplicationStatus::InProgress, "complete")?;
        let outstanding = self.outstanding_tasks();
        if !outstanding.is_empty() {
            return Err(ProcessingError::IncompleteTasks(outstanding));
        }
        self.app_number.ok_or(ProcessingError::MissingValue {
            task: ProcessingTask::AssignAppNumber,
            field: "appNumber",
        })
    }

    pub fn mark_completed(
        &mut self,
        actor: EmployeeId,
        at: DateTime<Utc>,
    ) -> Result<(), ProcessingError> {
        self.ready_for_completion()?;
        self.status = ApplicationStatus::Completed;
        self.status_changed = Some(Attribution {
            employee_id: actor,
            at,
        });
        Ok(())
    }

    fn transition(
        &self,
        expected: ApplicationStatus,
        action: &'static str,
    ) -> Result<(), ProcessingError> {
        if self.status == expected {
            Ok(())
        } else {
            Err(ProcessingError::InvalidTransition {
                from: self.status,
                action,
            })
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProcessingError {
    #[error("cannot {action} an application that is {}", .from.label())]
    InvalidTransition {
        from: ApplicationStatus,
        action: &'static str,
    },
    #[error("task '{}' is not available while the application is {}", .task.label(), .status.label())]
    TaskUnavailable {
        task: ProcessingTask,
        status: ApplicationStatus,
    },
    #[error("task '{}' requires '{}' first", .task.label(), .missing.label())]
    PrerequisiteMissing {
        task: ProcessingTask,
        missing: ProcessingTask,
    },
    #[error("task '{}' cannot be undone while '{}' is done", .task.label(), .dependent.label())]
    DependentTaskDone {
        task: ProcessingTask,
        dependent: ProcessingTask,
    },
    #[error("task '{}' requires {field}", .task.label())]
    MissingValue {
        task: ProcessingTask,
        field: &'static str,
    },
    #[error("outstanding tasks: {}", .0.iter().map(|task| task.label()).collect::<Vec<_>>().join(", "))]
    IncompleteTasks(Vec<ProcessingTask>),
    #[error("a rejection reason is required")]
    MissingRejectionReason,
    #[error("payment was already refunded; the application cannot be reopened")]
    AlreadyRefunded,
}
