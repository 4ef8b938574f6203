//! Cash Balance Calculator
//!
//! Derives the drawer balance from confirmed cash entries and keeps the
//! per-date snapshot of counted-vs-derived in sync.

use crate::db::repository::{cash_balance, entry, RepoError};
use crate::utils::AppResult;
use chrono::NaiveDate;
use shared::models::CashBalanceSnapshot;
use sqlx::SqlitePool;

#[derive(Clone)]
pub struct BalanceCalculator {
    pool: SqlitePool,
}

impl BalanceCalculator {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Drawer balance derived from confirmed cash entries up to and
    /// including `as_of` (kopecks, signed).
    pub async fn calculate(&self, as_of: NaiveDate) -> AppResult<i64> {
        let mut conn = self.pool.acquire().await.map_err(RepoError::from)?;
        Ok(entry::cash_balance_as_of(&mut conn, as_of).await?)
    }

    /// Snapshot for a date, seeded from the derived balance on first
    /// access.
    pub async fn get_or_create_snapshot(&self, date: NaiveDate) -> AppResult<CashBalanceSnapshot> {
        let calculated = self.calculate(date).await?;
        Ok(cash_balance::get_or_create(&self.pool, date, calculated).await?)
    }

    /// Record what the owner counted against what the ledger says, one
    /// snapshot per date. The reconciled flag is cleared; confirming a
    /// discrepancy is a separate human step.
    pub async fn update_snapshot(
        &self,
        date: NaiveDate,
        reported: i64,
        note: Option<&str>,
    ) -> AppResult<CashBalanceSnapshot> {
        let calculated = self.calculate(date).await?;
        let snapshot = cash_balance::update(&self.pool, date, reported, calculated, note).await?;

        if snapshot.difference() == 0 {
            tracing::info!(date = %date, balance = calculated, "Cash balance matches the ledger");
        } else {
            tracing::warn!(
                date = %date,
                reported,
                calculated,
                difference = snapshot.difference(),
                "Cash balance mismatch"
            );
        }
        Ok(snapshot)
    }

    /// Human confirmation that the snapshot's discrepancy is explained.
    pub async fn confirm_snapshot(&self, date: NaiveDate) -> AppResult<CashBalanceSnapshot> {
        Ok(cash_balance::mark_reconciled(&self.pool, date).await?)
    }

    pub async fn snapshot(&self, date: NaiveDate) -> AppResult<Option<CashBalanceSnapshot>> {
        Ok(cash_balance::find_by_date(&self.pool, date).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::entry as entry_repo;
    use crate::db::test_util::test_pool;
    use shared::models::{EntryCreate, EntryKind, EntrySource, PaymentMethod};

    async fn seed_confirmed_cash(pool: &SqlitePool, date: &str, kind: EntryKind, amount: i64) {
        let e = entry_repo::create(
            pool,
            EntryCreate {
                date: date.parse().unwrap(),
                kind,
                amount,
                category_id: None,
                counterparty: None,
                counterparty_inn: None,
                description: None,
                payment_method: PaymentMethod::Cash,
                source: EntrySource::Manual,
            },
        )
        .await
        .unwrap();
        entry_repo::confirm(pool, e.id, "accountant").await.unwrap();
    }

    #[tokio::test]
    async fn empty_ledger_balances_to_zero() {
        let calc = BalanceCalculator::new(test_pool().await);
        assert_eq!(calc.calculate("2025-01-15".parse().unwrap()).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn expenses_can_drive_the_balance_negative() {
        let calc = BalanceCalculator::new(test_pool().await);
        seed_confirmed_cash(&calc.pool, "2025-01-10", EntryKind::Income, 1_000_00).await;
        seed_confirmed_cash(&calc.pool, "2025-01-12", EntryKind::Expense, 1_500_00).await;
        // A negative derived balance is data worth seeing, not an error
        assert_eq!(
            calc.calculate("2025-01-15".parse().unwrap()).await.unwrap(),
            -500_00
        );
    }

    #[tokio::test]
    async fn first_snapshot_is_seeded_from_the_ledger() {
        let calc = BalanceCalculator::new(test_pool().await);
        seed_confirmed_cash(&calc.pool, "2025-01-10", EntryKind::Income, 10_000_00).await;

        let snap = calc
            .get_or_create_snapshot("2025-01-15".parse().unwrap())
            .await
            .unwrap();
        assert_eq!(snap.reported_balance, 10_000_00);
        assert_eq!(snap.calculated_balance, 10_000_00);
        assert_eq!(snap.difference(), 0);
    }

    #[tokio::test]
    async fn update_exposes_the_difference_until_confirmed() {
        let calc = BalanceCalculator::new(test_pool().await);
        seed_confirmed_cash(&calc.pool, "2025-01-10", EntryKind::Income, 10_000_00).await;
        let date: NaiveDate = "2025-01-15".parse().unwrap();

        let snap = calc
            .update_snapshot(date, 9_800_00, Some("evening count"))
            .await
            .unwrap();
        assert_eq!(snap.difference(), -200_00);
        assert!(!snap.is_reconciled);

        let snap = calc.confirm_snapshot(date).await.unwrap();
        assert!(snap.is_reconciled);
        // The figures survive the confirmation untouched
        assert_eq!(snap.reported_balance, 9_800_00);
        assert_eq!(snap.calculated_balance, 10_000_00);
    }
}
