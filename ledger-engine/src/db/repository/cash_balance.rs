//! Cash Balance Snapshot Repository
//!
//! One row per business date: the balance the owner counted in the drawer
//! against the balance derived from confirmed cash entries.

use super::{RepoError, RepoResult};
use chrono::NaiveDate;
use shared::models::CashBalanceSnapshot;
use sqlx::SqlitePool;

const COLUMNS: &str = "id, date, reported_balance, calculated_balance, is_reconciled, note, created_at, updated_at";

pub async fn find_by_date(
    pool: &SqlitePool,
    date: NaiveDate,
) -> RepoResult<Option<CashBalanceSnapshot>> {
    let snapshot = sqlx::query_as::<_, CashBalanceSnapshot>(&format!(
        "SELECT {COLUMNS} FROM cash_balance WHERE date = ?"
    ))
    .bind(date)
    .fetch_optional(pool)
    .await?;
    Ok(snapshot)
}

/// Snapshot for a date, created on first access.
///
/// A fresh snapshot starts with `reported == calculated`; the derived
/// balance stands in for the count until the owner reports one.
pub async fn get_or_create(
    pool: &SqlitePool,
    date: NaiveDate,
    calculated: i64,
) -> RepoResult<CashBalanceSnapshot> {
    if let Some(snapshot) = find_by_date(pool, date).await? {
        return Ok(snapshot);
    }

    let now = shared::util::now_millis();
    sqlx::query(
        "INSERT INTO cash_balance (date, reported_balance, calculated_balance, is_reconciled, note, created_at, updated_at) VALUES (?, ?, ?, 0, NULL, ?, ?) ON CONFLICT(date) DO NOTHING",
    )
    .bind(date)
    .bind(calculated)
    .bind(calculated)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?;

    find_by_date(pool, date)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to create cash balance snapshot".into()))
}

/// Upsert the snapshot for a date with an owner-reported balance.
///
/// Always clears `is_reconciled`: confirming that a discrepancy has been
/// explained is a human action, and a stale confirmation must never
/// survive a new reported figure.
pub async fn update(
    pool: &SqlitePool,
    date: NaiveDate,
    reported: i64,
    calculated: i64,
    note: Option<&str>,
) -> RepoResult<CashBalanceSnapshot> {
    let now = shared::util::now_millis();

    sqlx::query(
        "INSERT INTO cash_balance (date, reported_balance, calculated_balance, is_reconciled, note, created_at, updated_at) VALUES (?, ?, ?, 0, ?, ?, ?) ON CONFLICT(date) DO UPDATE SET reported_balance = excluded.reported_balance, calculated_balance = excluded.calculated_balance, is_reconciled = 0, note = excluded.note, updated_at = excluded.updated_at",
    )
    .bind(date)
    .bind(reported)
    .bind(calculated)
    .bind(note)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?;

    find_by_date(pool, date)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to record cash balance snapshot".into()))
}

/// Mark a snapshot's discrepancy as explained.
pub async fn mark_reconciled(pool: &SqlitePool, date: NaiveDate) -> RepoResult<CashBalanceSnapshot> {
    let now = shared::util::now_millis();
    let rows = sqlx::query("UPDATE cash_balance SET is_reconciled = 1, updated_at = ? WHERE date = ?")
        .bind(now)
        .bind(date)
        .execute(pool)
        .await?;

    if rows.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("No cash balance snapshot for {date}")));
    }
    find_by_date(pool, date)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("No cash balance snapshot for {date}")))
}

/// Latest snapshots, newest first.
pub async fn find_recent(pool: &SqlitePool, limit: i64) -> RepoResult<Vec<CashBalanceSnapshot>> {
    let snapshots = sqlx::query_as::<_, CashBalanceSnapshot>(&format!(
        "SELECT {COLUMNS} FROM cash_balance ORDER BY date DESC LIMIT ?"
    ))
    .bind(limit)
    .fetch_all(pool)
    .await?;
    Ok(snapshots)
}
