//! Accountable Advance Repository
//!
//! Tracks money handed to an employee against receipts they bring back.
//! Status transitions happen inside single UPDATE statements guarded by
//! the current status, so two concurrent reports cannot lose each other's
//! amounts or resurrect a taxed advance.

use super::{validate_positive_amount, RepoError, RepoResult};
use chrono::NaiveDate;
use shared::models::{AccountableAdvance, AdvanceStatus};
use sqlx::{SqliteConnection, SqlitePool};

const COLUMNS: &str = "id, employee_id, issued_date, amount_issued, amount_reported, status, purpose, report_deadline, reported_date, note, created_at, updated_at";

pub async fn create(
    pool: &SqlitePool,
    employee_id: i64,
    issued_date: NaiveDate,
    amount: i64,
    purpose: Option<&str>,
    report_deadline: NaiveDate,
) -> RepoResult<AccountableAdvance> {
    let mut conn = pool.acquire().await?;
    create_in(&mut conn, employee_id, issued_date, amount, purpose, report_deadline).await
}

pub async fn create_in(
    conn: &mut SqliteConnection,
    employee_id: i64,
    issued_date: NaiveDate,
    amount: i64,
    purpose: Option<&str>,
    report_deadline: NaiveDate,
) -> RepoResult<AccountableAdvance> {
    validate_positive_amount(amount, "Advance amount")?;
    if report_deadline < issued_date {
        return Err(RepoError::Validation(
            "Advance deadline cannot precede the issue date".into(),
        ));
    }

    let now = shared::util::now_millis();
    let result = sqlx::query(
        "INSERT INTO accountable_advance (employee_id, issued_date, amount_issued, amount_reported, status, purpose, report_deadline, created_at, updated_at) VALUES (?, ?, ?, 0, 'PENDING', ?, ?, ?, ?)",
    )
    .bind(employee_id)
    .bind(issued_date)
    .bind(amount)
    .bind(purpose)
    .bind(report_deadline)
    .bind(now)
    .bind(now)
    .execute(&mut *conn)
    .await?;

    find_by_id_in(conn, result.last_insert_rowid())
        .await?
        .ok_or_else(|| RepoError::Database("Failed to create advance".into()))
}

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<AccountableAdvance>> {
    let advance = sqlx::query_as::<_, AccountableAdvance>(&format!(
        "SELECT {COLUMNS} FROM accountable_advance WHERE id = ?"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(advance)
}

async fn find_by_id_in(
    conn: &mut SqliteConnection,
    id: i64,
) -> RepoResult<Option<AccountableAdvance>> {
    let advance = sqlx::query_as::<_, AccountableAdvance>(&format!(
        "SELECT {COLUMNS} FROM accountable_advance WHERE id = ?"
    ))
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;
    Ok(advance)
}

pub async fn find_by_status(
    pool: &SqlitePool,
    status: AdvanceStatus,
) -> RepoResult<Vec<AccountableAdvance>> {
    let advances = sqlx::query_as::<_, AccountableAdvance>(&format!(
        "SELECT {COLUMNS} FROM accountable_advance WHERE status = ? ORDER BY issued_date, id"
    ))
    .bind(status)
    .fetch_all(pool)
    .await?;
    Ok(advances)
}

/// Advances still awaiting receipts from one employee.
pub async fn find_open_by_employee(
    pool: &SqlitePool,
    employee_id: i64,
) -> RepoResult<Vec<AccountableAdvance>> {
    let advances = sqlx::query_as::<_, AccountableAdvance>(&format!(
        "SELECT {COLUMNS} FROM accountable_advance WHERE employee_id = ? AND status IN ('PENDING', 'PARTIAL', 'OVERDUE') ORDER BY issued_date, id"
    ))
    .bind(employee_id)
    .fetch_all(pool)
    .await?;
    Ok(advances)
}

/// Apply a reported amount and recompute the status in one statement.
///
/// The accumulation and the CASE both read the row's current
/// `amount_reported`, so concurrent reports serialize correctly under
/// SQLite's writer lock. Over-reporting is allowed (the remainder goes
/// negative and flags the excess); an overdue advance that becomes fully
/// reported returns to REPORTED. `reported_date` is stamped only when
/// the advance becomes fully reported. Taxed advances are closed books.
pub async fn add_reported(
    conn: &mut SqliteConnection,
    id: i64,
    amount: i64,
    reported_date: NaiveDate,
) -> RepoResult<AccountableAdvance> {
    validate_positive_amount(amount, "Reported amount")?;

    let now = shared::util::now_millis();
    let rows = sqlx::query(
        "UPDATE accountable_advance SET \
             amount_reported = amount_reported + ?, \
             reported_date = CASE \
                 WHEN amount_reported + ? >= amount_issued THEN ? \
                 ELSE reported_date \
             END, \
             status = CASE \
                 WHEN amount_reported + ? >= amount_issued THEN 'REPORTED' \
                 WHEN status = 'OVERDUE' THEN 'OVERDUE' \
                 ELSE 'PARTIAL' \
             END, \
             updated_at = ? \
         WHERE id = ? AND status != 'TAXED'",
    )
    .bind(amount)
    .bind(amount)
    .bind(reported_date)
    .bind(amount)
    .bind(now)
    .bind(id)
    .execute(&mut *conn)
    .await?;

    if rows.rows_affected() == 0 {
        return match find_by_id_in(conn, id).await? {
            None => Err(RepoError::NotFound(format!("Advance {id} not found"))),
            Some(_) => Err(RepoError::BusinessRule(format!(
                "Advance {id} is already taxed and cannot accept reports"
            ))),
        };
    }

    find_by_id_in(conn, id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("Advance {id} not found")))
}

/// Set-based deadline sweep: every open advance whose deadline has passed
/// flips to OVERDUE. Returns how many flipped.
pub async fn mark_overdue_past_deadline(pool: &SqlitePool, today: NaiveDate) -> RepoResult<u64> {
    let now = shared::util::now_millis();
    let rows = sqlx::query(
        "UPDATE accountable_advance SET status = 'OVERDUE', updated_at = ? WHERE status IN ('PENDING', 'PARTIAL') AND report_deadline < ? AND amount_reported < amount_issued",
    )
    .bind(now)
    .bind(today)
    .execute(pool)
    .await?;
    Ok(rows.rows_affected())
}

/// Close an overdue advance as taxed income. Only OVERDUE advances
/// qualify; anything else is either still open or already settled.
pub async fn mark_taxed(conn: &mut SqliteConnection, id: i64) -> RepoResult<AccountableAdvance> {
    let now = shared::util::now_millis();
    let rows = sqlx::query(
        "UPDATE accountable_advance SET status = 'TAXED', updated_at = ? WHERE id = ? AND status = 'OVERDUE'",
    )
    .bind(now)
    .bind(id)
    .execute(&mut *conn)
    .await?;

    if rows.rows_affected() == 0 {
        return match find_by_id_in(conn, id).await? {
            None => Err(RepoError::NotFound(format!("Advance {id} not found"))),
            Some(adv) => Err(RepoError::BusinessRule(format!(
                "Advance {id} is {:?}, only overdue advances can be taxed",
                adv.status
            ))),
        };
    }

    find_by_id_in(conn, id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("Advance {id} not found")))
}
