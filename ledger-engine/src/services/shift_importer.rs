//! Shift Report Importer
//!
//! Raw shift reports land in `shift_report` first; a separate processing
//! pass turns each into per-channel income entries. The `processed` flag
//! flips inside the same transaction as the entries, so a crash or a
//! concurrent pass can neither drop a report nor book it twice.

use crate::db::repository::{entry, shift_report, RepoError};
use crate::utils::AppResult;
use shared::models::{
    EntryCreate, EntryKind, EntrySource, PaymentMethod, ShiftReport, ShiftReportCreate,
};
use sqlx::SqlitePool;

#[derive(Clone)]
pub struct ShiftImporter {
    pool: SqlitePool,
}

impl ShiftImporter {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Persist a report as submitted. Processing happens separately.
    pub async fn record(&self, data: ShiftReportCreate) -> AppResult<ShiftReport> {
        let report = shift_report::create(&self.pool, data).await?;
        tracing::info!(
            report_id = report.id,
            date = %report.date,
            shift = ?report.shift,
            total = report.total_revenue(),
            "Shift report recorded"
        );
        Ok(report)
    }

    /// Turn every unprocessed report into confirmed income entries, one
    /// per non-zero payment channel. Idempotent: the processed guard
    /// skips reports another pass already took.
    pub async fn process_pending(&self) -> AppResult<u32> {
        let pending = shift_report::find_unprocessed(&self.pool).await?;
        let mut imported = 0u32;

        for report in pending {
            let mut tx = self.pool.begin().await.map_err(RepoError::from)?;
            if !shift_report::mark_processed(&mut tx, report.id).await? {
                continue;
            }

            let channels = [
                (report.cash_fact, PaymentMethod::Cash, "cash"),
                (report.cashless_fact, PaymentMethod::Cashless, "cashless"),
                (report.qr_payments, PaymentMethod::Qr, "QR"),
            ];
            for (amount, method, label) in channels {
                if amount == 0 {
                    continue;
                }
                entry::create_in(
                    &mut tx,
                    &EntryCreate {
                        date: report.date,
                        kind: EntryKind::Income,
                        amount,
                        category_id: None,
                        counterparty: None,
                        counterparty_inn: None,
                        description: Some(format!(
                            "{:?} shift revenue {} ({label})",
                            report.shift, report.date
                        )),
                        payment_method: method,
                        source: EntrySource::ShiftReport,
                    },
                )
                .await?;
            }

            tx.commit().await.map_err(RepoError::from)?;
            imported += 1;
            tracing::info!(report_id = report.id, date = %report.date, "Shift report imported");
        }

        Ok(imported)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::entry as entry_repo;
    use crate::db::test_util::test_pool;
    use shared::models::{EntryFilter, ShiftKind};

    fn report(date: &str, shift: ShiftKind, cash: i64, cashless: i64, qr: i64) -> ShiftReportCreate {
        ShiftReportCreate {
            date: date.parse().unwrap(),
            shift,
            cash_fact: cash,
            cashless_fact: cashless,
            qr_payments: qr,
            cash_plan: None,
        }
    }

    #[tokio::test]
    async fn processing_books_one_entry_per_nonzero_channel() {
        let importer = ShiftImporter::new(test_pool().await);
        importer
            .record(report("2025-01-15", ShiftKind::Evening, 12_000_00, 30_000_00, 0))
            .await
            .unwrap();

        assert_eq!(importer.process_pending().await.unwrap(), 1);

        let entries = entry_repo::find_by_date(
            &importer.pool,
            "2025-01-15".parse().unwrap(),
            EntryFilter::default(),
        )
        .await
        .unwrap();
        assert_eq!(entries.len(), 2);
        assert!(entries.iter().all(|e| e.is_confirmed));
        assert!(entries.iter().all(|e| e.source == EntrySource::ShiftReport));
        let total: i64 = entries.iter().map(|e| e.amount).sum();
        assert_eq!(total, 42_000_00);
    }

    #[tokio::test]
    async fn processing_twice_books_nothing_extra() {
        let importer = ShiftImporter::new(test_pool().await);
        importer
            .record(report("2025-01-15", ShiftKind::Evening, 12_000_00, 30_000_00, 4_000_00))
            .await
            .unwrap();

        assert_eq!(importer.process_pending().await.unwrap(), 1);
        assert_eq!(importer.process_pending().await.unwrap(), 0);

        let entries = entry_repo::find_by_date(
            &importer.pool,
            "2025-01-15".parse().unwrap(),
            EntryFilter::default(),
        )
        .await
        .unwrap();
        assert_eq!(entries.len(), 3);
    }

    #[tokio::test]
    async fn all_zero_report_is_processed_without_entries() {
        let importer = ShiftImporter::new(test_pool().await);
        importer
            .record(report("2025-01-15", ShiftKind::Morning, 0, 0, 0))
            .await
            .unwrap();

        assert_eq!(importer.process_pending().await.unwrap(), 1);
        let entries = entry_repo::find_by_date(
            &importer.pool,
            "2025-01-15".parse().unwrap(),
            EntryFilter::default(),
        )
        .await
        .unwrap();
        assert!(entries.is_empty());
        assert!(shift_report::find_unprocessed(&importer.pool).await.unwrap().is_empty());
    }
}
