//! Contact and identity shapes shared by applications, applicants and guardians.

use async_graphql::{Enum, InputObject, SimpleObject};
use serde::{Deserialize, Serialize};

/// Canadian province or territory, stored as its two-letter code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Enum)]
#[serde(rename_all = "snake_case")]
pub enum Province {
    #[default]
    Bc,
    Ab,
    Sk,
    Mb,
    On,
    Qc,
    Nb,
    Ns,
    Pe,
    Nl,
    Yt,
    Nt,
    Nu,
}

impl Province {
    pub const fn code(self) -> &'static str {
        match self {
            Self::Bc => "BC",
            Self::Ab => "AB",
            Self::Sk => "SK",
            Self::Mb => "MB",
            Self::On => "ON",
            Self::Qc => "QC",
            Self::Nb => "NB",
            Self::Ns => "NS",
            Self::Pe => "PE",
            Self::Nl => "NL",
            Self::Yt => "YT",
            Self::Nt => "NT",
            Self::Nu => "NU",
        }
    }
}

/// Mailing address used for homes, shipping, billing, physicians and guardians.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, SimpleObject, InputObject)]
#[graphql(input_name = "AddressInput")]
pub struct Address {
    pub line1: String,
    pub line2: Option<String>,
    pub city: String,
    pub province: Province,
    pub postal_code: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Enum)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    Male,
    Female,
    Other,
}

/// Name and contact details captured on every application and copied onto the applicant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, SimpleObject, InputObject)]
#[graphql(input_name = "PersonalInformationInput")]
pub struct PersonalInformation {
    pub first_name: String,
    pub middle_name: Option<String>,
    pub last_name: String,
    pub phone: String,
    pub email: Option<String>,
    pub receive_email_updates: bool,
    pub address: Address,
}

impl PersonalInformation {
    pub fn full_name(&self) -> String {
        match self.middle_name.as_deref().map(str::trim) {
            Some(middle) if !middle.is_empty() => {
                format!("{} {} {}", self.first_name, middle, self.last_name)
            }
            _ => format!("{} {}", self.first_name, self.last_name),
        }
    }

    /// Address an applicant opted into status e-mails at, if any.
    pub fn notification_email(&self) -> Option<&str> {
        if !self.receive_email_updates {
            return None;
        }
        self.email
            .as_deref()
            .map(str::trim)
            .filter(|email| !email.is_empty())
    }
}

/// Legal guardian or power of attorney acting for a permit holder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, SimpleObject, InputObject)]
#[graphql(input_name = "GuardianInput")]
pub struct Guardian {
    pub first_name: String,
    pub middle_name: Option<String>,
    pub last_name: String,
    pub phone: String,
    pub relationship: String,
    pub address: Address,
    /// Opaque reference to the uploaded power-of-attorney form.
    pub poa_form_reference: Option<String>,
}

/// Strip separators so phone numbers compare by digits only.
pub fn phone_digits(raw: &str) -> String {
    raw.chars().filter(char::is_ascii_digit).collect()
}

/// Ten-digit form of a phone number written with the usual separators, or `None`
/// when it holds anything else or the wrong number of digits.
pub fn normalize_phone(raw: &str) -> Option<String> {
    let separators_only = raw
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, ' ' | '-' | '(' | ')' | '.' | '+'));
    if !separators_only {
        return None;
    }
    let digits = phone_digits(raw);
    (digits.len() == 10).then_some(digits)
}

/// Canonical `A1A 1A1` form of a Canadian postal code, or `None` when malformed.
pub fn normalize_postal_code(raw: &str) -> Option<String> {
    let compact: Vec<char> = raw
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| c.to_ascii_uppercase())
        .collect();

    if compact.len() != 6 {
        return None;
    }

    let shape_ok = compact.iter().enumerate().all(|(index, c)| {
        if index % 2 == 0 {
            c.is_ascii_alphabetic()
        } else {
            c.is_ascii_digit()
        }
    });
    if !shape_ok {
        return None;
    }

    let (head, tail) = compact.split_at(3);
    Some(format!(
        "{} {}",
        head.iter().collect::<String>(),
        tail.iter().collect::<String>()
    ))
}
