use std::collections::HashMap;

use super::domain::{AccountantReport, AccountantRow, AccountantTotals, ReportRange};
use crate::workflows::applications::domain::{PaymentInformation, PaymentMethod};

#[derive(Debug, Default, Clone, Copy)]
struct MethodTotals {
    count: u32,
    processing_fee_cents: i64,
    donation_cents: i64,
}

/// Running totals per payment method; every method appears in the summary, zero or not.
#[derive(Debug, Default)]
pub struct AccountantLedger {
    methods: HashMap<PaymentMethod, MethodTotals>,
}

impl AccountantLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, payment: &PaymentInformation) {
        let totals = self.methods.entry(payment.payment_method).or_default();
        totals.count = totals.count.saturating_add(1);
        totals.processing_fee_cents = totals
            .processing_fee_cents
            .saturating_add(payment.processing_fee_cents);
        totals.donation_cents = totals.donation_cents.saturating_add(payment.donation_cents);
    }

    pub fn summary(&self, range: ReportRange) -> AccountantReport {
        let rows: Vec<AccountantRow> = PaymentMethod::ordered()
            .into_iter()
            .map(|method| {
                let totals = self.methods.get(&method).copied().unwrap_or_default();
                AccountantRow {
                    payment_method: method,
                    payment_method_label: method.label().to_string(),
                    application_count: totals.count,
                    processing_fee_cents: totals.processing_fee_cents,
                    donation_cents: totals.donation_cents,
                    total_cents: totals
                        .processing_fee_cents
                        .saturating_add(totals.donation_cents),
                }
            })
            .collect();

        let totals = rows
            .iter()
            .fold(AccountantTotals::default(), |mut acc, row| {
                acc.application_count = acc
                    .application_count
                    .saturating_add(row.application_count);
                acc.processing_fee_cents = acc
                    .processing_fee_cents
                    .saturating_add(row.processing_fee_cents);
                acc.donation_cents = acc.donation_cents.saturating_add(row.donation_cents);
                acc.total_cents = acc.total_cents.saturating_add(row.total_cents);
                acc
            });

        AccountantReport {
            from: range.from,
            to: range.to,
            rows,
            totals,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn paid(method: PaymentMethod, fee: i64, donation: i64) -> PaymentInformation {
        PaymentInformation {
            payment_method: method,
            processing_fee_cents: fee,
            donation_cents: donation,
            paid_through_shopify: method == PaymentMethod::Shopify,
            shopify_order_number: None,
            ship_to_same_address: true,
            shipping_address: None,
            bill_to_same_address: true,
            billing_address: None,
        }
    }

    fn range() -> ReportRange {
        ReportRange::new(
            NaiveDate::from_ymd_opt(2026, 1, 1).expect("valid"),
            NaiveDate::from_ymd_opt(2026, 3, 31).expect("valid"),
        )
    }

    #[test]
    fn totals_group_by_payment_method() {
        let mut ledger = AccountantLedger::new();
        ledger.record(&paid(PaymentMethod::Cash, 2600, 0));
        ledger.record(&paid(PaymentMethod::Cash, 2600, 1000));
        ledger.record(&paid(PaymentMethod::Shopify, 2600, 250));

        let report = ledger.summary(range());
        assert_eq!(report.rows.len(), PaymentMethod::ordered().len());

        let cash = report
            .rows
            .iter()
            .find(|row| row.payment_method == PaymentMethod::Cash)
            .expect("cash row");
        assert_eq!(cash.application_count, 2);
        assert_eq!(cash.processing_fee_cents, 5200);
        assert_eq!(cash.donation_cents, 1000);
        assert_eq!(cash.total_cents, 6200);

        assert_eq!(report.totals.application_count, 3);
        assert_eq!(report.totals.total_cents, 6200 + 2850);
    }

    #[test]
    fn oversized_amounts_saturate_instead_of_overflowing() {
        let mut ledger = AccountantLedger::new();
        ledger.record(&paid(PaymentMethod::Cash, i64::MAX, 0));
        ledger.record(&paid(PaymentMethod::Visa, 1, 0));
        ledger.record(&paid(PaymentMethod::Debit, 0, i64::MAX));

        let report = ledger.summary(range());
        assert_eq!(report.totals.application_count, 3);
        assert_eq!(report.totals.processing_fee_cents, i64::MAX);
        assert_eq!(report.totals.donation_cents, i64::MAX);
        assert_eq!(report.totals.total_cents, i64::MAX);
    }

    #[test]
    fn empty_ledger_lists_zero_rows() {
        let report = AccountantLedger::new().summary(range());
        assert!(report.rows.iter().all(|row| row.application_count == 0));
        assert_eq!(report.totals, AccountantTotals::default());
        assert_eq!(report.rows[0].payment_method_label, "Mastercard");
    }
}
