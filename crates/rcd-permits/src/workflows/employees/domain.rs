use std::fmt;

use async_graphql::{Enum, InputObject};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EmployeeId(pub i64);

impl fmt::Display for EmployeeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Enum)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Secretary,
    Accounting,
}

/// Operations the portal gates by role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Permission {
    ViewRecords,
    ManageApplications,
    ManageApplicants,
    ManagePhysicians,
    RefundPayments,
    ManageEmployees,
    ViewReports,
}

impl Role {
    pub const fn label(self) -> &'static str {
        match self {
            Role::Admin => "Admin",
            Role::Secretary => "Secretary",
            Role::Accounting => "Accounting",
        }
    }

    pub const fn can(self, permission: Permission) -> bool {
        match self {
            Role::Admin => true,
            Role::Secretary => matches!(
                permission,
                Permission::ViewRecords
                    | Permission::ManageApplications
                    | Permission::ManageApplicants
                    | Permission::ManagePhysicians
            ),
            Role::Accounting => matches!(
                permission,
                Permission::ViewRecords | Permission::RefundPayments | Permission::ViewReports
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, InputObject)]
pub struct EmployeeInput {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmployeeRecord {
    pub id: EmployeeId,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
    pub active: bool,
}

impl EmployeeRecord {
    pub fn can(&self, permission: Permission) -> bool {
        self.active && self.role.can(permission)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_matrix_matches_portal_access() {
        assert!(Role::Admin.can(Permission::ManageEmployees));
        assert!(Role::Secretary.can(Permission::ManageApplications));
        assert!(!Role::Secretary.can(Permission::ViewReports));
        assert!(!Role::Secretary.can(Permission::RefundPayments));
        assert!(Role::Accounting.can(Permission::ViewReports));
        assert!(Role::Accounting.can(Permission::RefundPayments));
        assert!(!Role::Accounting.can(Permission::ManageApplicants));
    }

    #[test]
    fn inactive_employees_have_no_permissions() {
        let employee = EmployeeRecord {
            id: EmployeeId(1),
            email: "admin@rcd.example".to_string(),
            first_name: "Ari".to_string(),
            last_name: "Chen".to_string(),
            role: Role::Admin,
            active: false,
        };
        assert!(!employee.can(Permission::ViewRecords));
    }
}
