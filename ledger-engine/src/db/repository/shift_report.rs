//! Shift Report Repository
//!
//! Raw end-of-shift figures as staff submit them. Reports are persisted
//! first and turned into ledger entries by a separate processing pass, so
//! a crash between the two steps loses nothing.

use super::{validate_positive_amount, RepoError, RepoResult};
use chrono::NaiveDate;
use shared::models::{ShiftKind, ShiftReport, ShiftReportCreate};
use sqlx::SqlitePool;

const COLUMNS: &str = "id, date, shift, cash_fact, cashless_fact, qr_payments, cash_plan, received_at, processed, processed_at";

pub async fn create(pool: &SqlitePool, data: ShiftReportCreate) -> RepoResult<ShiftReport> {
    for (amount, field) in [
        (data.cash_fact, "Shift cash amount"),
        (data.cashless_fact, "Shift cashless amount"),
        (data.qr_payments, "Shift QR amount"),
    ] {
        // Zero is a legitimate channel total; only negatives are nonsense.
        if amount < 0 {
            return Err(RepoError::Validation(format!("{field} cannot be negative")));
        }
    }
    if let Some(plan) = data.cash_plan {
        validate_positive_amount(plan, "Shift cash plan")?;
    }

    let now = shared::util::now_millis();
    let result = sqlx::query(
        "INSERT INTO shift_report (date, shift, cash_fact, cashless_fact, qr_payments, cash_plan, received_at, processed) VALUES (?, ?, ?, ?, ?, ?, ?, 0)",
    )
    .bind(data.date)
    .bind(data.shift)
    .bind(data.cash_fact)
    .bind(data.cashless_fact)
    .bind(data.qr_payments)
    .bind(data.cash_plan)
    .bind(now)
    .execute(pool)
    .await?;

    find_by_id(pool, result.last_insert_rowid())
        .await?
        .ok_or_else(|| RepoError::Database("Failed to create shift report".into()))
}

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<ShiftReport>> {
    let report = sqlx::query_as::<_, ShiftReport>(&format!(
        "SELECT {COLUMNS} FROM shift_report WHERE id = ?"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(report)
}

pub async fn find_by_date_shift(
    pool: &SqlitePool,
    date: NaiveDate,
    shift: ShiftKind,
) -> RepoResult<Option<ShiftReport>> {
    let report = sqlx::query_as::<_, ShiftReport>(&format!(
        "SELECT {COLUMNS} FROM shift_report WHERE date = ? AND shift = ?"
    ))
    .bind(date)
    .bind(shift)
    .fetch_optional(pool)
    .await?;
    Ok(report)
}

/// Reports not yet turned into ledger entries, oldest first.
pub async fn find_unprocessed(pool: &SqlitePool) -> RepoResult<Vec<ShiftReport>> {
    let reports = sqlx::query_as::<_, ShiftReport>(&format!(
        "SELECT {COLUMNS} FROM shift_report WHERE processed = 0 ORDER BY date, id"
    ))
    .fetch_all(pool)
    .await?;
    Ok(reports)
}

/// Flip `processed` exactly once; a report that raced another processor
/// reports `false` so the caller skips it.
pub async fn mark_processed(conn: &mut sqlx::SqliteConnection, id: i64) -> RepoResult<bool> {
    let now = shared::util::now_millis();
    let rows = sqlx::query(
        "UPDATE shift_report SET processed = 1, processed_at = ? WHERE id = ? AND processed = 0",
    )
    .bind(now)
    .bind(id)
    .execute(&mut *conn)
    .await?;
    Ok(rows.rows_affected() > 0)
}
