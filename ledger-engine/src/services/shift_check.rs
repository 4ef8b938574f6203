//! Shift Reconciliation
//!
//! Compares what staff reported for a shift against what the cash
//! register uploaded to the fiscal operator. QR payments go through the
//! acquiring terminal, so the register sees them as cashless; the
//! comparison merges them into the cashless channel.

use crate::services::fiscal::{FiscalDataSource, ShiftTotals};
use rust_decimal::Decimal;
use serde::Serialize;
use shared::models::ShiftReport;
use shared::money::to_major;
use std::sync::Arc;

/// Acceptable discrepancy per channel: 100 rubles (rounding, float
/// drift in the register's rubles, small change errors).
pub const DISCREPANCY_TOLERANCE: Decimal = Decimal::from_parts(100, 0, 0, false, 0);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CheckStatus {
    /// Every channel within tolerance
    Ok,
    /// At least one channel outside tolerance
    Warning,
    /// Fiscal data could not be fetched; nothing was compared
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Channel {
    Cash,
    Cashless,
    Total,
}

/// One channel where the staff figure and the register disagree.
#[derive(Debug, Clone, Serialize)]
pub struct Discrepancy {
    pub channel: Channel,
    /// What the fiscal register recorded (rubles)
    pub register: Decimal,
    /// What staff reported (rubles)
    pub reported: Decimal,
    /// reported - register (signed, rubles)
    pub difference: Decimal,
}

#[derive(Debug, Clone, Serialize)]
pub struct ShiftCheckResult {
    pub report_id: i64,
    pub status: CheckStatus,
    pub discrepancies: Vec<Discrepancy>,
    pub message: String,
}

/// Pure comparison of a staff report against register totals.
pub fn classify(report: &ShiftReport, totals: &ShiftTotals, tolerance: Decimal) -> ShiftCheckResult {
    // An open register shift has partial totals; comparing against them
    // would flag phantom discrepancies.
    if totals.closed_at.is_none() {
        return ShiftCheckResult {
            report_id: report.id,
            status: CheckStatus::Warning,
            discrepancies: Vec::new(),
            message: format!(
                "Shift {} {:?}: register shift is not closed yet, nothing to compare",
                report.date, report.shift
            ),
        };
    }

    let reported_cash = to_major(report.cash_fact);
    // QR rides the cashless channel on the register side
    let reported_cashless = to_major(report.cashless_fact + report.qr_payments);
    let reported_total = to_major(report.total_revenue());

    let mut discrepancies = Vec::new();
    for (channel, register, reported) in [
        (Channel::Cash, totals.cash, reported_cash),
        (Channel::Cashless, totals.cashless, reported_cashless),
        (Channel::Total, totals.total, reported_total),
    ] {
        let difference = reported - register;
        if difference.abs() > tolerance {
            discrepancies.push(Discrepancy {
                channel,
                register,
                reported,
                difference,
            });
        }
    }

    let (status, message) = if discrepancies.is_empty() {
        (
            CheckStatus::Ok,
            format!("Shift {} {:?}: matches the register", report.date, report.shift),
        )
    } else {
        let detail: Vec<String> = discrepancies
            .iter()
            .map(|d| format!("{:?}: reported {} vs register {} (diff {})", d.channel, d.reported, d.register, d.difference))
            .collect();
        (
            CheckStatus::Warning,
            format!(
                "Shift {} {:?}: discrepancy beyond {} RUB: {}",
                report.date,
                report.shift,
                tolerance,
                detail.join("; ")
            ),
        )
    };

    ShiftCheckResult {
        report_id: report.id,
        status,
        discrepancies,
        message,
    }
}

/// Reconciles staff shift reports against the fiscal operator.
#[derive(Clone)]
pub struct ShiftValidator {
    fiscal: Arc<dyn FiscalDataSource>,
}

impl ShiftValidator {
    pub fn new(fiscal: Arc<dyn FiscalDataSource>) -> Self {
        Self { fiscal }
    }

    /// Check one report. Never fails: an unreachable fiscal operator is
    /// itself a reconciliation outcome (`Error`), not an exception.
    pub async fn check(&self, report: &ShiftReport) -> ShiftCheckResult {
        match self.fiscal.shift_totals(report.date).await {
            Ok(totals) => {
                let result = classify(report, &totals, DISCREPANCY_TOLERANCE);
                match result.status {
                    CheckStatus::Ok => tracing::info!(report_id = report.id, "Shift reconciled"),
                    _ => tracing::warn!(report_id = report.id, message = %result.message, "Shift discrepancy"),
                }
                result
            }
            Err(e) => {
                tracing::error!(report_id = report.id, error = %e, "Fiscal fetch failed");
                ShiftCheckResult {
                    report_id: report.id,
                    status: CheckStatus::Error,
                    discrepancies: Vec::new(),
                    message: format!(
                        "Shift {} {:?}: fiscal data unavailable ({e})",
                        report.date, report.shift
                    ),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use shared::models::ShiftKind;

    fn report(cash: i64, cashless: i64, qr: i64) -> ShiftReport {
        ShiftReport {
            id: 1,
            date: "2025-01-15".parse().unwrap(),
            shift: ShiftKind::Evening,
            cash_fact: cash,
            cashless_fact: cashless,
            qr_payments: qr,
            cash_plan: None,
            received_at: 0,
            processed: false,
            processed_at: None,
        }
    }

    fn totals(cash: &str, cashless: &str) -> ShiftTotals {
        let cash: Decimal = cash.parse().unwrap();
        let cashless: Decimal = cashless.parse().unwrap();
        ShiftTotals {
            cash,
            cashless,
            total: cash + cashless,
            receipts_count: 100,
            shift_number: Some(42),
            closed_at: Some("2025-01-15T20:00:00".to_string()),
        }
    }

    #[test]
    fn within_tolerance_is_ok() {
        // Cash off by 50 RUB, cashless exact, both inside the 100 RUB band
        let result = classify(
            &report(15_050_00, 8_000_00, 0),
            &totals("15000", "8000"),
            DISCREPANCY_TOLERANCE,
        );
        assert_eq!(result.status, CheckStatus::Ok);
        assert!(result.discrepancies.is_empty());
    }

    #[test]
    fn exactly_at_tolerance_is_still_ok() {
        let result = classify(
            &report(15_100_00, 8_000_00, 0),
            &totals("15000", "8000"),
            DISCREPANCY_TOLERANCE,
        );
        assert_eq!(result.status, CheckStatus::Ok);
    }

    #[test]
    fn beyond_tolerance_is_warning_with_signed_difference() {
        let result = classify(
            &report(15_200_00, 8_000_00, 0),
            &totals("15000", "8000"),
            DISCREPANCY_TOLERANCE,
        );
        assert_eq!(result.status, CheckStatus::Warning);
        // The extra 200 in cash also shows up in the total
        assert_eq!(result.discrepancies.len(), 2);
        let d = &result.discrepancies[0];
        assert_eq!(d.channel, Channel::Cash);
        assert_eq!(d.difference, Decimal::from(200));
        assert_eq!(result.discrepancies[1].channel, Channel::Total);
    }

    #[test]
    fn open_register_shift_is_a_warning_without_comparison() {
        let mut t = totals("15000", "8000");
        t.closed_at = None;
        let result = classify(&report(15_000_00, 8_000_00, 0), &t, DISCREPANCY_TOLERANCE);
        assert_eq!(result.status, CheckStatus::Warning);
        assert!(result.discrepancies.is_empty());
        assert!(result.message.contains("not closed"));
    }

    #[test]
    fn shortfall_is_flagged_too() {
        let result = classify(
            &report(14_700_00, 8_000_00, 0),
            &totals("15000", "8000"),
            DISCREPANCY_TOLERANCE,
        );
        assert_eq!(result.status, CheckStatus::Warning);
        assert_eq!(result.discrepancies[0].difference, Decimal::from(-300));
    }

    #[test]
    fn qr_counts_as_cashless() {
        // Register saw 10000 cashless; staff reported 8000 card + 2000 QR
        let result = classify(
            &report(15_000_00, 8_000_00, 2_000_00),
            &totals("15000", "10000"),
            DISCREPANCY_TOLERANCE,
        );
        assert_eq!(result.status, CheckStatus::Ok);
    }

    #[test]
    fn both_channels_can_diverge() {
        let result = classify(
            &report(14_000_00, 9_000_00, 0),
            &totals("15000", "8000"),
            DISCREPANCY_TOLERANCE,
        );
        assert_eq!(result.status, CheckStatus::Warning);
        assert_eq!(result.discrepancies.len(), 2);
    }

    struct FailingSource;

    #[async_trait]
    impl FiscalDataSource for FailingSource {
        async fn shift_totals(
            &self,
            date: NaiveDate,
        ) -> Result<ShiftTotals, crate::services::fiscal::FiscalError> {
            Err(crate::services::fiscal::FiscalError::NoData(date))
        }
    }

    #[tokio::test]
    async fn unreachable_fiscal_source_yields_error_status() {
        let validator = ShiftValidator::new(Arc::new(FailingSource));
        let result = validator.check(&report(15_000_00, 8_000_00, 0)).await;
        assert_eq!(result.status, CheckStatus::Error);
        assert!(result.discrepancies.is_empty());
        assert!(result.message.contains("fiscal data unavailable"));
    }
}
