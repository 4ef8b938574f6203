//! Ledger entry: the canonical income/expense record

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::category::CategoryKind;

/// Entry kind (income or expense). Same wire values as [`CategoryKind`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
pub enum EntryKind {
    Income,
    Expense,
}

impl EntryKind {
    pub fn matches_category(self, kind: CategoryKind) -> bool {
        matches!(
            (self, kind),
            (EntryKind::Income, CategoryKind::Income)
                | (EntryKind::Expense, CategoryKind::Expense)
        )
    }
}

/// How the money moved.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
pub enum PaymentMethod {
    Cash,
    Cashless,
    Card,
    Qr,
    Mixed,
}

/// Provenance of an entry.
///
/// System-trusted sources (shift-derived income, advance disbursement)
/// are created already confirmed; everything else starts unconfirmed and
/// waits for a human.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
pub enum EntrySource {
    Manual,
    ShiftReport,
    ReceiptScan,
    AdvanceDisbursement,
    Import,
}

impl EntrySource {
    /// Whether entries from this source are created already confirmed.
    pub fn auto_confirmed(self) -> bool {
        matches!(
            self,
            EntrySource::ShiftReport | EntrySource::AdvanceDisbursement
        )
    }
}

/// Ledger entry entity
///
/// Once confirmed the row is immutable data; corrections go through an
/// explicit reversal entry, never an in-place edit.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct LedgerEntry {
    pub id: i64,
    /// Business date of the operation
    pub date: NaiveDate,
    pub kind: EntryKind,
    /// Amount in minor units (kopecks), strictly positive
    pub amount: i64,
    pub category_id: Option<i64>,
    pub counterparty: Option<String>,
    pub counterparty_inn: Option<String>,
    pub description: Option<String>,
    pub payment_method: PaymentMethod,
    pub source: EntrySource,
    pub is_confirmed: bool,
    /// Confirmation time (Unix millis)
    pub confirmed_at: Option<i64>,
    /// Confirming actor (user identifier from the frontend)
    pub confirmed_by: Option<String>,
    /// Creation time (Unix millis)
    pub created_at: i64,
}

/// Create entry payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntryCreate {
    pub date: NaiveDate,
    pub kind: EntryKind,
    /// Minor units (kopecks), must be > 0
    pub amount: i64,
    pub category_id: Option<i64>,
    pub counterparty: Option<String>,
    pub counterparty_inn: Option<String>,
    pub description: Option<String>,
    pub payment_method: PaymentMethod,
    pub source: EntrySource,
}

/// Query filter for period listings.
#[derive(Debug, Clone, Copy, Default)]
pub struct EntryFilter {
    pub confirmed_only: bool,
    pub kind: Option<EntryKind>,
}
