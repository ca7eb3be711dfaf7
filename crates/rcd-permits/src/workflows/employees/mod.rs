//! Staff accounts and the role matrix used to gate portal operations.

pub mod domain;
pub mod repository;
pub mod service;

pub use domain::{EmployeeId, EmployeeInput, EmployeeRecord, Permission, Role};
pub use repository::EmployeeRepository;
pub use service::{EmployeeService, EmployeeServiceError};
