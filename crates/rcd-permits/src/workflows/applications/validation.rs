use chrono::{Months, NaiveDate};

use super::domain::{
    ApplicationDetails, ApplicationDraft, NewApplicationInput, PaymentInformation, PaymentMethod,
    PermitType, RenewalApplicationInput, ReplacementApplicationInput, ReplacementReason,
};
use crate::workflows::applicants::domain::{ApplicantId, PatientCondition};
use crate::workflows::people::Gender;
use crate::workflows::validation::{normalize_address, normalize_personal, ValidationErrors};

pub const DEFAULT_PROCESSING_FEE_CENTS: i64 = 2600;
/// Longest a temporary permit may run, counted from the application date.
pub const TEMPORARY_PERMIT_MAX_MONTHS: u32 = 12;

/// Fee dial backing self-service submissions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeeSchedule {
    processing_fee_cents: i64,
}

impl FeeSchedule {
    pub fn new(processing_fee_cents: i64) -> Self {
        let sanitized = if processing_fee_cents >= 0 {
            processing_fee_cents
        } else {
            DEFAULT_PROCESSING_FEE_CENTS
        };

        Self {
            processing_fee_cents: sanitized,
        }
    }

    pub fn processing_fee_cents(&self) -> i64 {
        self.processing_fee_cents
    }
}

impl Default for FeeSchedule {
    fn default() -> Self {
        Self::new(DEFAULT_PROCESSING_FEE_CENTS)
    }
}

/// Guard responsible for turning raw form input into `ApplicationDraft` instances.
#[derive(Debug, Clone, Default)]
pub struct ApplicationGuard {
    fees: FeeSchedule,
}

impl ApplicationGuard {
    pub fn with_fees(fees: FeeSchedule) -> Self {
        Self { fees }
    }

    /// Applicants renewing online always pay the scheduled fee.
    pub fn self_service_payment(&self, mut payment: PaymentInformation) -> PaymentInformation {
        payment.processing_fee_cents = self.fees.processing_fee_cents;
        payment
    }

    pub fn draft_new(
        &self,
        input: NewApplicationInput,
        today: NaiveDate,
    ) -> Result<ApplicationDraft, ValidationErrors> {
        let NewApplicationInput {
            permit_type,
            personal,
            payment,
            mut details,
        } = input;

        let mut errors = ValidationErrors::new();
        errors.check_personal("personal", &personal);
        check_payment(&mut errors, &payment);

        if details.date_of_birth > today {
            errors.push("details.dateOfBirth", "cannot be in the future");
        }
        if details.gender == Gender::Other && blank(details.other_gender.as_deref()) {
            errors.push("details.otherGender", "is required when gender is Other");
        }

        errors.require_text("details.medical.disability", &details.medical.disability);
        if details.medical.disability_certification_date > today {
            errors.push(
                "details.medical.disabilityCertificationDate",
                "cannot be in the future",
            );
        }
        if details.medical.patient_condition == PatientCondition::Other
            && blank(details.medical.notes.as_deref())
        {
            errors.push(
                "details.medical.notes",
                "must describe the condition when patient condition is Other",
            );
        }
        details.physician.validate("details.physician", &mut errors);

        if details.omit_guardian {
            details.guardian = None;
        } else {
            match details.guardian.as_ref() {
                Some(guardian) => errors.check_guardian("details.guardian", guardian),
                None => errors.push("details.guardian", "is required unless omitted"),
            }
        }

        match permit_type {
            PermitType::Temporary => match details.requested_expiry {
                Some(expiry) => {
                    let latest = today
                        .checked_add_months(Months::new(TEMPORARY_PERMIT_MAX_MONTHS))
                        .unwrap_or(NaiveDate::MAX);
                    if expiry <= today {
                        errors.push("details.requestedExpiry", "must be in the future");
                    } else if expiry > latest {
                        errors.push(
                            "details.requestedExpiry",
                            "cannot be more than 12 months after the application date",
                        );
                    }
                }
                None => errors.push(
                    "details.requestedExpiry",
                    "is required for temporary permits",
                ),
            },
            PermitType::Permanent => details.requested_expiry = None,
        }

        errors.into_result()?;

        details.physician = details.physician.normalized();
        details.guardian = details.guardian.map(|mut guardian| {
            guardian.address = normalize_address(guardian.address);
            guardian
        });

        Ok(ApplicationDraft {
            permit_type,
            personal: normalize_personal(personal),
            payment: normalize_payment(payment),
            details: ApplicationDetails::New(details),
        })
    }

    pub fn draft_renewal(
        &self,
        input: RenewalApplicationInput,
    ) -> Result<ApplicationDraft, ValidationErrors> {
        let RenewalApplicationInput {
            applicant_id,
            personal,
            payment,
            mut details,
        } = input;

        let mut errors = ValidationErrors::new();
        check_applicant_id(&mut errors, applicant_id);
        errors.check_personal("personal", &personal);
        check_payment(&mut errors, &payment);

        if details.physician_changed {
            match details.physician.as_ref() {
                Some(physician) => physician.validate("details.physician", &mut errors),
                None => errors.push(
                    "details.physician",
                    "is required when the physician changed",
                ),
            }
        } else {
            details.physician = None;
        }

        errors.into_result()?;

        details.applicant_id = ApplicantId(applicant_id);
        details.physician = details.physician.map(|physician| physician.normalized());

        Ok(ApplicationDraft {
            permit_type: PermitType::Permanent,
            personal: normalize_personal(personal),
            payment: normalize_payment(payment),
            details: ApplicationDetails::Renewal(details),
        })
    }

    /// `permit_type` mirrors the permit being replaced.
    pub fn draft_replacement(
        &self,
        input: ReplacementApplicationInput,
        permit_type: PermitType,
    ) -> Result<ApplicationDraft, ValidationErrors> {
        let ReplacementApplicationInput {
            applicant_id,
            personal,
            payment,
            mut details,
        } = input;

        let mut errors = ValidationErrors::new();
        check_applicant_id(&mut errors, applicant_id);
        errors.check_personal("personal", &personal);
        check_payment(&mut errors, &payment);

        match details.reason {
            ReplacementReason::Lost => {
                errors.require_present("details.lostTimestamp", details.lost_timestamp.as_ref());
                if blank(details.lost_location.as_deref()) {
                    errors.push("details.lostLocation", "is required for lost permits");
                }
            }
            ReplacementReason::Stolen => {
                if blank(details.stolen_police_file_number.as_deref()) {
                    errors.push(
                        "details.stolenPoliceFileNumber",
                        "is required for stolen permits",
                    );
                }
            }
            ReplacementReason::Other => {
                if blank(details.event_description.as_deref()) {
                    errors.push(
                        "details.eventDescription",
                        "must describe what happened to the permit",
                    );
                }
            }
        }

        errors.into_result()?;

        details.applicant_id = ApplicantId(applicant_id);

        Ok(ApplicationDraft {
            permit_type,
            personal: normalize_personal(personal),
            payment: normalize_payment(payment),
            details: ApplicationDetails::Replacement(details),
        })
    }
}

/// Payment rules shared by every application type.
pub fn check_payment(errors: &mut ValidationErrors, payment: &PaymentInformation) {
    if payment.processing_fee_cents < 0 {
        errors.push("payment.processingFeeCents", "cannot be negative");
    }
    if payment.donation_cents < 0 {
        errors.push("payment.donationCents", "cannot be negative");
    }

    if payment.payment_method == PaymentMethod::Shopify {
        if !payment.paid_through_shopify {
            errors.push(
                "payment.paidThroughShopify",
                "must be set for Shopify payments",
            );
        }
        if blank(payment.shopify_order_number.as_deref()) {
            errors.push(
                "payment.shopifyOrderNumber",
                "is required for Shopify payments",
            );
        }
    }

    if !payment.ship_to_same_address {
        match payment.shipping_address.as_ref() {
            Some(address) => errors.check_address("payment.shippingAddress", address),
            None => errors.push(
                "payment.shippingAddress",
                "is required when shipping elsewhere",
            ),
        }
    }
    if !payment.bill_to_same_address {
        match payment.billing_address.as_ref() {
            Some(address) => errors.check_address("payment.billingAddress", address),
            None => errors.push(
                "payment.billingAddress",
                "is required when billing elsewhere",
            ),
        }
    }
}

pub fn normalize_payment(mut payment: PaymentInformation) -> PaymentInformation {
    payment.shipping_address = if payment.ship_to_same_address {
        None
    } else {
        payment.shipping_address.map(normalize_address)
    };
    payment.billing_address = if payment.bill_to_same_address {
        None
    } else {
        payment.billing_address.map(normalize_address)
    };
    if payment.payment_method != PaymentMethod::Shopify && !payment.paid_through_shopify {
        payment.shopify_order_number = None;
    }
    payment
}

fn check_applicant_id(errors: &mut ValidationErrors, applicant_id: i64) {
    if applicant_id <= 0 {
        errors.push("applicantId", "is required");
    }
}

fn blank(value: Option<&str>) -> bool {
    value.map(str::trim).map_or(true, str::is_empty)
}
