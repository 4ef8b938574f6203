//! Accountable Advance Tracker
//!
//! Orchestrates the advance lifecycle: issuing cash to an employee,
//! absorbing their receipts, sweeping deadlines, and closing unreported
//! amounts as taxable. Every multi-row step runs in one transaction so
//! the advance, its receipts, and the ledger never disagree.

use crate::db::repository::{advance, employee, entry, receipt, RepoError};
use crate::utils::{AppError, AppResult};
use chrono::{DateTime, NaiveDate};
use shared::models::{
    AccountableAdvance, AdvanceIssue, EntryCreate, EntryKind, EntrySource, LedgerEntry,
    PaymentMethod, Receipt, ReceiptCreate,
};
use sqlx::SqlitePool;

/// An advance together with the disbursement entry it booked.
#[derive(Debug, Clone)]
pub struct AdvanceIssued {
    pub advance: AccountableAdvance,
    pub entry: LedgerEntry,
}

/// Outcome of reporting one receipt against an advance.
#[derive(Debug, Clone)]
pub struct ReceiptReported {
    pub advance: AccountableAdvance,
    pub receipt: Receipt,
    pub entry: LedgerEntry,
}

#[derive(Clone)]
pub struct AdvanceTracker {
    pool: SqlitePool,
}

impl AdvanceTracker {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Hand cash to an employee. Books the advance row and an
    /// auto-confirmed cash expense in one transaction; the money left the
    /// drawer the moment it was handed over.
    pub async fn issue(&self, data: AdvanceIssue, issued_date: NaiveDate) -> AppResult<AdvanceIssued> {
        let emp = employee::find_by_id(&self.pool, data.employee_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Employee {} not found", data.employee_id)))?;
        if !emp.is_active {
            return Err(AppError::BusinessRule(format!(
                "Employee {} is not active",
                emp.full_name
            )));
        }

        if data.deadline_days < 0 {
            return Err(AppError::validation("Advance deadline days cannot be negative"));
        }
        let deadline = issued_date
            .checked_add_days(chrono::Days::new(data.deadline_days as u64))
            .ok_or_else(|| AppError::validation("Advance deadline days out of range"))?;
        let description = match &data.purpose {
            Some(purpose) => format!("Advance to {}: {}", emp.full_name, purpose),
            None => format!("Advance to {}", emp.full_name),
        };

        let mut tx = self.pool.begin().await.map_err(RepoError::from)?;
        let advance = advance::create_in(
            &mut tx,
            data.employee_id,
            issued_date,
            data.amount,
            data.purpose.as_deref(),
            deadline,
        )
        .await?;
        let entry = entry::create_in(
            &mut tx,
            &EntryCreate {
                date: issued_date,
                kind: EntryKind::Expense,
                amount: data.amount,
                category_id: None,
                counterparty: Some(emp.full_name.clone()),
                counterparty_inn: None,
                description: Some(description),
                payment_method: PaymentMethod::Cash,
                source: EntrySource::AdvanceDisbursement,
            },
        )
        .await?;
        tx.commit().await.map_err(RepoError::from)?;

        tracing::info!(
            advance_id = advance.id,
            employee = %emp.full_name,
            amount = data.amount,
            deadline = %deadline,
            "Advance issued"
        );
        Ok(AdvanceIssued { advance, entry })
    }

    /// Report one receipt against an advance.
    ///
    /// Accumulates the receipt total into the advance, books an
    /// unconfirmed expense awaiting accountant review, and stores the
    /// receipt linked to both. A duplicate fiscal sign rolls the whole
    /// step back.
    pub async fn report_receipt(
        &self,
        advance_id: i64,
        data: ReceiptCreate,
        category_id: Option<i64>,
    ) -> AppResult<ReceiptReported> {
        let purchase_date = DateTime::from_timestamp_millis(data.purchase_date)
            .map(|dt| dt.date_naive())
            .ok_or_else(|| AppError::validation("Receipt purchase date out of range"))?;

        let mut tx = self.pool.begin().await.map_err(RepoError::from)?;
        let advance = advance::add_reported(&mut tx, advance_id, data.total_amount, purchase_date).await?;
        let entry = entry::create_in(
            &mut tx,
            &EntryCreate {
                date: purchase_date,
                kind: EntryKind::Expense,
                amount: data.total_amount,
                category_id,
                counterparty: data.seller_name.clone(),
                counterparty_inn: data.seller_inn.clone(),
                description: Some(format!("Receipt against advance {advance_id}")),
                payment_method: PaymentMethod::Cash,
                source: EntrySource::ReceiptScan,
            },
        )
        .await?;
        let receipt = receipt::create_in(&mut tx, &data, Some(advance_id), Some(entry.id)).await?;
        tx.commit().await.map_err(RepoError::from)?;

        if advance.amount_remaining() < 0 {
            tracing::warn!(
                advance_id,
                excess = -advance.amount_remaining(),
                "Receipts exceed the advance amount"
            );
        }
        tracing::info!(
            advance_id,
            receipt_id = receipt.id,
            amount = data.total_amount,
            status = ?advance.status,
            "Receipt reported against advance"
        );
        Ok(ReceiptReported { advance, receipt, entry })
    }

    /// Flip every open advance past its deadline to OVERDUE.
    pub async fn evaluate_deadlines(&self, as_of: NaiveDate) -> AppResult<u64> {
        let flipped = advance::mark_overdue_past_deadline(&self.pool, as_of).await?;
        if flipped > 0 {
            tracing::warn!(count = flipped, as_of = %as_of, "Advances went overdue");
        }
        Ok(flipped)
    }

    /// Deliberately close an overdue advance: the unreported remainder is
    /// now the employee's taxable income (withholding happens outside).
    pub async fn mark_taxed(&self, advance_id: i64) -> AppResult<AccountableAdvance> {
        let mut conn = self.pool.acquire().await.map_err(RepoError::from)?;
        let advance = advance::mark_taxed(&mut conn, advance_id).await?;
        tracing::info!(
            advance_id,
            unreported = advance.amount_remaining(),
            "Advance closed as taxed"
        );
        Ok(advance)
    }
}
