//! Self-reported shift totals, received from the frontline bot

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Operational shift within a business day.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
pub enum ShiftKind {
    Morning,
    Evening,
}

/// Shift report entity. `(date, shift)` is unique.
///
/// `processed` flips once the report has been turned into ledger entries,
/// which makes the conversion idempotent across importer retries.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct ShiftReport {
    pub id: i64,
    pub date: NaiveDate,
    pub shift: ShiftKind,
    /// Cash takings as counted by the operator (kopecks)
    pub cash_fact: i64,
    /// Card/terminal takings (kopecks)
    pub cashless_fact: i64,
    /// QR-code payments (kopecks)
    pub qr_payments: i64,
    /// Expected cash per the shift plan, if the frontend sent one (kopecks)
    pub cash_plan: Option<i64>,
    /// When the report arrived (Unix millis)
    pub received_at: i64,
    pub processed: bool,
    pub processed_at: Option<i64>,
}

impl ShiftReport {
    /// Total self-reported revenue across all channels (kopecks).
    pub fn total_revenue(&self) -> i64 {
        self.cash_fact + self.cashless_fact + self.qr_payments
    }
}

/// Record shift report payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShiftReportCreate {
    pub date: NaiveDate,
    pub shift: ShiftKind,
    pub cash_fact: i64,
    pub cashless_fact: i64,
    pub qr_payments: i64,
    pub cash_plan: Option<i64>,
}
