//! Physician directory keyed by MSP billing number.

pub mod domain;
pub mod repository;
pub mod service;

pub use domain::{PhysicianDetails, PhysicianFilter, PhysicianRecord, PhysicianStatus};
pub use repository::PhysicianRepository;
pub use service::{PhysicianService, PhysicianServiceError};
