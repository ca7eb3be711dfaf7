use async_graphql::{Enum, InputObject, SimpleObject};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::workflows::people::{normalize_phone, Address};
use crate::workflows::validation::{normalize_address, ValidationErrors};

/// Physician as entered on a medical certification; `msp_number` is the natural key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, SimpleObject, InputObject)]
#[graphql(input_name = "PhysicianInput")]
pub struct PhysicianDetails {
    pub msp_number: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub address: Address,
    pub notes: Option<String>,
}

impl PhysicianDetails {
    pub fn validate(&self, prefix: &str, errors: &mut ValidationErrors) {
        let field = format!("{prefix}.mspNumber");
        let msp = self.msp_number.trim();
        if msp.is_empty() {
            errors.push(field, "is required");
        } else if !msp.chars().all(|c| c.is_ascii_digit()) {
            errors.push(field, "must be numeric");
        }
        errors.require_text(&format!("{prefix}.firstName"), &self.first_name);
        errors.require_text(&format!("{prefix}.lastName"), &self.last_name);
        errors.check_phone(&format!("{prefix}.phone"), &self.phone);
        errors.check_address(&format!("{prefix}.address"), &self.address);
    }

    pub fn normalized(mut self) -> Self {
        self.msp_number = self.msp_number.trim().to_string();
        self.first_name = self.first_name.trim().to_string();
        self.last_name = self.last_name.trim().to_string();
        if let Some(phone) = normalize_phone(&self.phone) {
            self.phone = phone;
        }
        self.address = normalize_address(self.address);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Enum)]
#[serde(rename_all = "snake_case")]
pub enum PhysicianStatus {
    Active,
    Inactive,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhysicianRecord {
    pub details: PhysicianDetails,
    pub status: PhysicianStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PhysicianRecord {
    pub fn full_name(&self) -> String {
        format!("Dr. {} {}", self.details.first_name, self.details.last_name)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, InputObject)]
pub struct PhysicianFilter {
    /// Matches MSP number, first or last name.
    pub search: Option<String>,
    pub status: Option<PhysicianStatus>,
}
