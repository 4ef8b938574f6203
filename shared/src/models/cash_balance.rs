//! Daily cash balance snapshot

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One snapshot per date (unique key).
///
/// `reported_balance` is what the operator counted in the drawer;
/// `calculated_balance` is derived from confirmed cash entries up to and
/// including the date. Downstream discipline checks flag the difference.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct CashBalanceSnapshot {
    pub id: i64,
    pub date: NaiveDate,
    /// Operator-reported closing balance (kopecks)
    pub reported_balance: i64,
    /// Balance derived from confirmed cash entries (kopecks)
    pub calculated_balance: i64,
    /// Set by a human once the discrepancy (if any) has been explained
    pub is_reconciled: bool,
    pub note: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl CashBalanceSnapshot {
    /// Reported minus calculated (kopecks); positive = surplus in drawer.
    pub fn difference(&self) -> i64 {
        self.reported_balance - self.calculated_balance
    }
}
