pub mod applicants;
pub mod applications;
pub mod employees;
pub mod people;
pub mod physicians;
pub mod reports;
pub mod validation;
