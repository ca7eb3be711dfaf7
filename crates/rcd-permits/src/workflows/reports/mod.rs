//! Read-only reports for staff and accounting. Rows are structured for the API; file
//! rendering happens elsewhere.

pub mod domain;
pub mod ledger;
pub mod repository;
pub mod service;

pub use domain::{
    AccountantReport, AccountantRow, AccountantTotals, ApplicationsReportRow, PermitHolderRow,
    ReportRange,
};
pub use ledger::AccountantLedger;
pub use repository::ReportRepository;
pub use service::{ReportService, ReportServiceError};
