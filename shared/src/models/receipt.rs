//! Fiscal receipt, as delivered by the receipt-source collaborator (QR scan)

use serde::{Deserialize, Serialize};

/// Receipt entity. `fiscal_sign` is unique, which makes submitting the
/// same receipt twice a hard error rather than a silent double count.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Receipt {
    pub id: i64,
    /// Advance this receipt was reported against, if any
    pub advance_id: Option<i64>,
    /// Ledger entry created from this receipt, if any
    pub entry_id: Option<i64>,
    /// Fiscal sign (FP), unique per receipt nationwide
    pub fiscal_sign: String,
    /// Fiscal document number (FD)
    pub fiscal_document: String,
    /// Fiscal storage number (FN)
    pub fiscal_storage: String,
    /// Purchase timestamp (Unix millis)
    pub purchase_date: i64,
    /// Receipt total (kopecks)
    pub total_amount: i64,
    pub seller_name: Option<String>,
    pub seller_inn: Option<String>,
    pub created_at: i64,
}

/// Receipt payload from the QR/FNS collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReceiptCreate {
    pub fiscal_sign: String,
    pub fiscal_document: String,
    pub fiscal_storage: String,
    pub purchase_date: i64,
    /// Minor units (kopecks), must be > 0
    pub total_amount: i64,
    pub seller_name: Option<String>,
    pub seller_inn: Option<String>,
}
