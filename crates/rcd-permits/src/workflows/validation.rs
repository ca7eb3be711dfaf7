use std::fmt;

use serde::Serialize;

use super::people::{
    normalize_phone, normalize_postal_code, Address, Guardian, PersonalInformation,
};

/// A single rejected form field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

/// Every field problem found in one submission, reported together.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationErrors {
    pub errors: Vec<FieldError>,
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "submission failed validation")?;
        for (index, error) in self.errors.iter().enumerate() {
            let separator = if index == 0 { ": " } else { "; " };
            write!(f, "{separator}{} {}", error.field, error.message)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(FieldError {
            field: field.into(),
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn contains(&self, field: &str) -> bool {
        self.errors.iter().any(|error| error.field == field)
    }

    pub fn fields(&self) -> Vec<&str> {
        self.errors.iter().map(|error| error.field.as_str()).collect()
    }

    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }

    pub fn require_text(&mut self, field: &str, value: &str) {
        if value.trim().is_empty() {
            self.push(field, "is required");
        }
    }

    pub fn require_present<T>(&mut self, field: &str, value: Option<&T>) {
        if value.is_none() {
            self.push(field, "is required");
        }
    }

    pub fn check_phone(&mut self, field: &str, value: &str) {
        if normalize_phone(value).is_none() {
            self.push(field, "must contain exactly 10 digits and only phone separators");
        }
    }

    pub fn check_address(&mut self, prefix: &str, address: &Address) {
        self.require_text(&format!("{prefix}.line1"), &address.line1);
        self.require_text(&format!("{prefix}.city"), &address.city);
        if normalize_postal_code(&address.postal_code).is_none() {
            self.push(
                format!("{prefix}.postalCode"),
                "must be a Canadian postal code (A1A 1A1)",
            );
        }
    }

    pub fn check_personal(&mut self, prefix: &str, personal: &PersonalInformation) {
        self.require_text(&format!("{prefix}.firstName"), &personal.first_name);
        self.require_text(&format!("{prefix}.lastName"), &personal.last_name);
        self.check_phone(&format!("{prefix}.phone"), &personal.phone);
        if let Some(email) = personal.email.as_deref() {
            if !email.trim().is_empty() && !email.contains('@') {
                self.push(format!("{prefix}.email"), "must be an e-mail address");
            }
        }
        if personal.receive_email_updates && personal.notification_email().is_none() {
            self.push(
                format!("{prefix}.email"),
                "is required to receive e-mail updates",
            );
        }
        self.check_address(&format!("{prefix}.address"), &personal.address);
    }

    pub fn check_guardian(&mut self, prefix: &str, guardian: &Guardian) {
        self.require_text(&format!("{prefix}.firstName"), &guardian.first_name);
        self.require_text(&format!("{prefix}.lastName"), &guardian.last_name);
        self.require_text(&format!("{prefix}.relationship"), &guardian.relationship);
        self.check_phone(&format!("{prefix}.phone"), &guardian.phone);
        self.check_address(&format!("{prefix}.address"), &guardian.address);
    }
}

/// Trim names and canonicalise phone/postal code after validation succeeded.
pub fn normalize_personal(mut personal: PersonalInformation) -> PersonalInformation {
    personal.first_name = personal.first_name.trim().to_string();
    personal.last_name = personal.last_name.trim().to_string();
    personal.middle_name = personal
        .middle_name
        .map(|middle| middle.trim().to_string())
        .filter(|middle| !middle.is_empty());
    if let Some(phone) = normalize_phone(&personal.phone) {
        personal.phone = phone;
    }
    personal.email = personal
        .email
        .map(|email| email.trim().to_string())
        .filter(|email| !email.is_empty());
    personal.address = normalize_address(personal.address);
    personal
}

pub fn normalize_address(mut address: Address) -> Address {
    if let Some(postal_code) = normalize_postal_code(&address.postal_code) {
        address.postal_code = postal_code;
    }
    address.line1 = address.line1.trim().to_string();
    address.city = address.city.trim().to_string();
    address
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::people::Province;

    fn address() -> Address {
        Address {
            line1: "5671 No. 3 Rd".to_string(),
            line2: None,
            city: "Richmond".to_string(),
            province: Province::Bc,
            postal_code: "v6x2c7".to_string(),
        }
    }

    #[test]
    fn collects_every_failing_field() {
        let mut errors = ValidationErrors::new();
        let mut bad = address();
        bad.line1 = "  ".to_string();
        bad.postal_code = "12345".to_string();
        errors.check_address("personal.address", &bad);
        errors.check_phone("personal.phone", "555-0199");

        assert_eq!(
            errors.fields(),
            vec![
                "personal.address.line1",
                "personal.address.postalCode",
                "personal.phone"
            ]
        );
        assert!(errors.to_string().contains("personal.phone must contain"));
    }

    #[test]
    fn phone_with_letters_is_rejected() {
        let mut errors = ValidationErrors::new();
        errors.check_phone("personal.phone", "604-CALL-555-0199x");
        errors.check_phone("guardian.phone", "(604) 555-0199");
        assert_eq!(errors.fields(), vec!["personal.phone"]);
    }

    #[test]
    fn normalize_address_canonicalises_postal_code() {
        let normalized = normalize_address(address());
        assert_eq!(normalized.postal_code, "V6X 2C7");
    }

    #[test]
    fn empty_errors_convert_to_ok() {
        assert!(ValidationErrors::new().into_result().is_ok());
    }
}
