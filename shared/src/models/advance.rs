//! Accountable advance: cash issued to an employee against future receipts

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Advance lifecycle.
///
/// ```text
/// pending ──receipts──▶ partial ──receipts──▶ reported (terminal)
///    │                     │
///    └──deadline passed────┴──▶ overdue ──deliberate──▶ taxed (terminal)
/// ```
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
pub enum AdvanceStatus {
    /// Issued, no receipts yet
    Pending,
    /// Some receipts submitted, not enough to cover the advance
    Partial,
    /// Fully covered by receipts (terminal, success)
    Reported,
    /// Deadline passed with money still unaccounted for
    Overdue,
    /// Unreported amount treated as the employee's taxable income (terminal)
    Taxed,
}

impl AdvanceStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, AdvanceStatus::Reported | AdvanceStatus::Taxed)
    }
}

/// Accountable advance entity
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct AccountableAdvance {
    pub id: i64,
    pub employee_id: i64,
    pub issued_date: NaiveDate,
    /// Amount handed out (kopecks)
    pub amount_issued: i64,
    /// Running total of receipts submitted (kopecks); only ever grows
    pub amount_reported: i64,
    pub status: AdvanceStatus,
    pub purpose: Option<String>,
    pub report_deadline: NaiveDate,
    /// Date the advance became fully reported
    pub reported_date: Option<NaiveDate>,
    pub note: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl AccountableAdvance {
    /// Still unaccounted for (kopecks). Negative when the employee reported
    /// receipts beyond the issued amount (allowed, flagged by the caller).
    pub fn amount_remaining(&self) -> i64 {
        self.amount_issued - self.amount_reported
    }

    /// Whether the unreported remainder is now the employee's taxable
    /// income. Signal only; the withholding process lives elsewhere.
    pub fn should_be_taxed(&self) -> bool {
        self.status == AdvanceStatus::Overdue && self.amount_remaining() > 0
    }
}

/// Issue advance payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdvanceIssue {
    pub employee_id: i64,
    /// Minor units (kopecks), must be > 0
    pub amount: i64,
    pub purpose: Option<String>,
    /// Days until the employee must have reported (labor code default: 3)
    pub deadline_days: i64,
}
