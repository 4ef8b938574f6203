//! Ledger Entry Repository
//!
//! The canonical income/expense store with the confirm workflow and the
//! aggregation queries the balance calculator and tax engine run on.

use super::{validate_positive_amount, RepoError, RepoResult};
use chrono::NaiveDate;
use shared::models::{CategoryKind, EntryCreate, EntryFilter, EntryKind, LedgerEntry};
use sqlx::{SqliteConnection, SqlitePool};

const COLUMNS: &str = "id, date, kind, amount, category_id, counterparty, counterparty_inn, description, payment_method, source, is_confirmed, confirmed_at, confirmed_by, created_at";

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<LedgerEntry>> {
    let entry = sqlx::query_as::<_, LedgerEntry>(
        "SELECT id, date, kind, amount, category_id, counterparty, counterparty_inn, description, payment_method, source, is_confirmed, confirmed_at, confirmed_by, created_at FROM ledger_entry WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(entry)
}

pub async fn create(pool: &SqlitePool, data: EntryCreate) -> RepoResult<LedgerEntry> {
    let mut conn = pool.acquire().await?;
    create_in(&mut conn, &data).await
}

/// Insert an entry on an explicit connection (or transaction handle).
///
/// Validation happens before anything is written: the amount must be
/// positive and a cited category must exist and agree with the entry
/// kind, or an expense filed under an income category would leak into
/// the deductible base. Entries from system-trusted sources are created
/// already confirmed, stamped with a `system` actor.
pub async fn create_in(conn: &mut SqliteConnection, data: &EntryCreate) -> RepoResult<LedgerEntry> {
    validate_positive_amount(data.amount, "Entry amount")?;
    if let Some(category_id) = data.category_id {
        let kind = sqlx::query_scalar::<_, CategoryKind>("SELECT kind FROM category WHERE id = ?")
            .bind(category_id)
            .fetch_optional(&mut *conn)
            .await?
            .ok_or_else(|| RepoError::NotFound(format!("Category {category_id} not found")))?;
        if !data.kind.matches_category(kind) {
            return Err(RepoError::Validation(format!(
                "Category {category_id} is {kind:?} and cannot categorize a {:?} entry",
                data.kind
            )));
        }
    }

    let now = shared::util::now_millis();
    let auto = data.source.auto_confirmed();
    let confirmed_at = auto.then_some(now);
    let confirmed_by = auto.then(|| "system".to_string());

    let result = sqlx::query(
        "INSERT INTO ledger_entry (date, kind, amount, category_id, counterparty, counterparty_inn, description, payment_method, source, is_confirmed, confirmed_at, confirmed_by, created_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(data.date)
    .bind(data.kind)
    .bind(data.amount)
    .bind(data.category_id)
    .bind(&data.counterparty)
    .bind(&data.counterparty_inn)
    .bind(&data.description)
    .bind(data.payment_method)
    .bind(data.source)
    .bind(auto)
    .bind(confirmed_at)
    .bind(confirmed_by)
    .bind(now)
    .execute(&mut *conn)
    .await?;

    let id = result.last_insert_rowid();
    let entry = sqlx::query_as::<_, LedgerEntry>(&format!(
        "SELECT {COLUMNS} FROM ledger_entry WHERE id = ?"
    ))
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;

    entry.ok_or_else(|| RepoError::Database("Failed to create ledger entry".into()))
}

/// Confirm an entry on behalf of `actor`.
///
/// Re-confirmation is rejected: a confirmed entry is immutable data, and
/// silently re-stamping `confirmed_by` would corrupt its audit meaning.
pub async fn confirm(pool: &SqlitePool, id: i64, actor: &str) -> RepoResult<LedgerEntry> {
    let now = shared::util::now_millis();

    let rows = sqlx::query(
        "UPDATE ledger_entry SET is_confirmed = 1, confirmed_at = ?, confirmed_by = ? WHERE id = ? AND is_confirmed = 0",
    )
    .bind(now)
    .bind(actor)
    .bind(id)
    .execute(pool)
    .await?;

    if rows.rows_affected() == 0 {
        // Disambiguate: missing row vs already confirmed
        return match find_by_id(pool, id).await? {
            None => Err(RepoError::NotFound(format!("Ledger entry {id} not found"))),
            Some(_) => Err(RepoError::Duplicate(format!(
                "Ledger entry {id} is already confirmed"
            ))),
        };
    }

    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("Ledger entry {id} not found")))
}

/// Entries within `[from, to]`, ordered by date then creation order.
pub async fn find_by_period(
    pool: &SqlitePool,
    from: NaiveDate,
    to: NaiveDate,
    filter: EntryFilter,
) -> RepoResult<Vec<LedgerEntry>> {
    let mut sql = format!("SELECT {COLUMNS} FROM ledger_entry WHERE date >= ? AND date <= ?");
    if filter.confirmed_only {
        sql.push_str(" AND is_confirmed = 1");
    }
    if filter.kind.is_some() {
        sql.push_str(" AND kind = ?");
    }
    sql.push_str(" ORDER BY date, id");

    let mut query = sqlx::query_as::<_, LedgerEntry>(&sql).bind(from).bind(to);
    if let Some(kind) = filter.kind {
        query = query.bind(kind);
    }

    Ok(query.fetch_all(pool).await?)
}

pub async fn find_by_date(
    pool: &SqlitePool,
    date: NaiveDate,
    filter: EntryFilter,
) -> RepoResult<Vec<LedgerEntry>> {
    find_by_period(pool, date, date, filter).await
}

/// Hard delete. The append-only audit trail is an external collaborator.
pub async fn delete(pool: &SqlitePool, id: i64) -> RepoResult<bool> {
    let rows = sqlx::query("DELETE FROM ledger_entry WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(rows.rows_affected() > 0)
}

/// Signed sum of confirmed cash entries with date <= `as_of` (kopecks):
/// income counts positive, expense negative. One SQL aggregate, so the
/// result does not depend on confirmation order.
pub async fn cash_balance_as_of(conn: &mut SqliteConnection, as_of: NaiveDate) -> RepoResult<i64> {
    let balance = sqlx::query_scalar::<_, i64>(
        "SELECT COALESCE(SUM(CASE kind WHEN 'INCOME' THEN amount ELSE -amount END), 0) FROM ledger_entry WHERE date <= ? AND is_confirmed = 1 AND payment_method = 'CASH'",
    )
    .bind(as_of)
    .fetch_one(&mut *conn)
    .await?;
    Ok(balance)
}

/// Sum of confirmed income within `[from, to]` (kopecks).
pub async fn income_sum(
    conn: &mut SqliteConnection,
    from: NaiveDate,
    to: NaiveDate,
) -> RepoResult<i64> {
    let sum = sqlx::query_scalar::<_, i64>(
        "SELECT COALESCE(SUM(amount), 0) FROM ledger_entry WHERE date >= ? AND date <= ? AND is_confirmed = 1 AND kind = 'INCOME'",
    )
    .bind(from)
    .bind(to)
    .fetch_one(&mut *conn)
    .await?;
    Ok(sum)
}

/// Sum of confirmed expenses within `[from, to]` whose category is
/// tax-deductible (kopecks). Uncategorized expenses never reduce the base.
pub async fn deductible_expense_sum(
    conn: &mut SqliteConnection,
    from: NaiveDate,
    to: NaiveDate,
) -> RepoResult<i64> {
    let sum = sqlx::query_scalar::<_, i64>(
        "SELECT COALESCE(SUM(e.amount), 0) FROM ledger_entry e JOIN category c ON e.category_id = c.id WHERE e.date >= ? AND e.date <= ? AND e.is_confirmed = 1 AND e.kind = 'EXPENSE' AND c.tax_deductible = 1",
    )
    .bind(from)
    .bind(to)
    .fetch_one(&mut *conn)
    .await?;
    Ok(sum)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::category;
    use crate::db::test_util::test_pool;
    use shared::models::{CategoryCreate, EntrySource, PaymentMethod};

    fn entry(date: &str, kind: EntryKind, amount: i64, method: PaymentMethod) -> EntryCreate {
        EntryCreate {
            date: date.parse().unwrap(),
            kind,
            amount,
            category_id: None,
            counterparty: None,
            counterparty_inn: None,
            description: None,
            payment_method: method,
            source: EntrySource::Manual,
        }
    }

    #[tokio::test]
    async fn create_rejects_non_positive_amount() {
        let pool = test_pool().await;
        for amount in [0, -1, -5_000_00] {
            let err = create(&pool, entry("2025-01-15", EntryKind::Income, amount, PaymentMethod::Cash))
                .await
                .unwrap_err();
            assert!(matches!(err, RepoError::Validation(_)), "amount {amount}");
        }
        // Strictly positive always succeeds
        let e = create(&pool, entry("2025-01-15", EntryKind::Income, 1, PaymentMethod::Cash))
            .await
            .unwrap();
        assert_eq!(e.amount, 1);
    }

    #[tokio::test]
    async fn entry_kind_must_agree_with_its_category() {
        let pool = test_pool().await;
        let sales = category::create(
            &pool,
            CategoryCreate {
                name: "Sales".into(),
                kind: CategoryKind::Income,
                tax_deductible: Some(true),
                sort_order: Some(1),
            },
        )
        .await
        .unwrap();

        // An expense filed under an income category would count toward the
        // deductible base, so the insert refuses it outright.
        let mut data = entry("2025-01-15", EntryKind::Expense, 400_00, PaymentMethod::Cash);
        data.category_id = Some(sales.id);
        let err = create(&pool, data).await.unwrap_err();
        assert!(matches!(err, RepoError::Validation(_)));

        let mut data = entry("2025-01-15", EntryKind::Income, 400_00, PaymentMethod::Cash);
        data.category_id = Some(sales.id);
        let e = create(&pool, data).await.unwrap();
        assert_eq!(e.category_id, Some(sales.id));
    }

    #[tokio::test]
    async fn entry_citing_unknown_category_is_rejected() {
        let pool = test_pool().await;
        let mut data = entry("2025-01-15", EntryKind::Expense, 400_00, PaymentMethod::Cash);
        data.category_id = Some(9999);
        let err = create(&pool, data).await.unwrap_err();
        assert!(matches!(err, RepoError::NotFound(_)));
    }

    #[tokio::test]
    async fn manual_entries_start_unconfirmed() {
        let pool = test_pool().await;
        let e = create(&pool, entry("2025-01-15", EntryKind::Expense, 500_00, PaymentMethod::Card))
            .await
            .unwrap();
        assert!(!e.is_confirmed);
        assert!(e.confirmed_at.is_none());
        assert!(e.confirmed_by.is_none());
    }

    #[tokio::test]
    async fn system_trusted_sources_are_auto_confirmed() {
        let pool = test_pool().await;
        let mut data = entry("2025-01-15", EntryKind::Income, 15_000_00, PaymentMethod::Cash);
        data.source = EntrySource::ShiftReport;
        let e = create(&pool, data).await.unwrap();
        assert!(e.is_confirmed);
        assert_eq!(e.confirmed_by.as_deref(), Some("system"));

        let mut data = entry("2025-01-15", EntryKind::Expense, 5_000_00, PaymentMethod::Cash);
        data.source = EntrySource::AdvanceDisbursement;
        let e = create(&pool, data).await.unwrap();
        assert!(e.is_confirmed);
    }

    #[tokio::test]
    async fn confirm_stamps_actor_and_time() {
        let pool = test_pool().await;
        let e = create(&pool, entry("2025-01-15", EntryKind::Income, 100_00, PaymentMethod::Cash))
            .await
            .unwrap();
        let confirmed = confirm(&pool, e.id, "accountant").await.unwrap();
        assert!(confirmed.is_confirmed);
        assert_eq!(confirmed.confirmed_by.as_deref(), Some("accountant"));
        assert!(confirmed.confirmed_at.is_some());
    }

    #[tokio::test]
    async fn confirm_missing_entry_is_not_found() {
        let pool = test_pool().await;
        let err = confirm(&pool, 9999, "accountant").await.unwrap_err();
        assert!(matches!(err, RepoError::NotFound(_)));
    }

    #[tokio::test]
    async fn double_confirm_is_rejected() {
        let pool = test_pool().await;
        let e = create(&pool, entry("2025-01-15", EntryKind::Income, 100_00, PaymentMethod::Cash))
            .await
            .unwrap();
        confirm(&pool, e.id, "accountant").await.unwrap();
        let err = confirm(&pool, e.id, "owner").await.unwrap_err();
        assert!(matches!(err, RepoError::Duplicate(_)));

        // Original confirmation stamp survives
        let stored = find_by_id(&pool, e.id).await.unwrap().unwrap();
        assert_eq!(stored.confirmed_by.as_deref(), Some("accountant"));
    }

    #[tokio::test]
    async fn period_query_orders_by_date_then_creation() {
        let pool = test_pool().await;
        let b = create(&pool, entry("2025-01-16", EntryKind::Income, 200_00, PaymentMethod::Cash))
            .await
            .unwrap();
        let a = create(&pool, entry("2025-01-15", EntryKind::Income, 100_00, PaymentMethod::Cash))
            .await
            .unwrap();
        let c = create(&pool, entry("2025-01-16", EntryKind::Expense, 300_00, PaymentMethod::Card))
            .await
            .unwrap();

        let all = find_by_period(
            &pool,
            "2025-01-01".parse().unwrap(),
            "2025-01-31".parse().unwrap(),
            EntryFilter::default(),
        )
        .await
        .unwrap();
        let ids: Vec<i64> = all.iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![a.id, b.id, c.id]);
    }

    #[tokio::test]
    async fn period_query_filters_kind_and_confirmation() {
        let pool = test_pool().await;
        let income = create(&pool, entry("2025-01-15", EntryKind::Income, 100_00, PaymentMethod::Cash))
            .await
            .unwrap();
        create(&pool, entry("2025-01-15", EntryKind::Expense, 50_00, PaymentMethod::Cash))
            .await
            .unwrap();
        confirm(&pool, income.id, "accountant").await.unwrap();

        let confirmed_income = find_by_period(
            &pool,
            "2025-01-15".parse().unwrap(),
            "2025-01-15".parse().unwrap(),
            EntryFilter {
                confirmed_only: true,
                kind: Some(EntryKind::Income),
            },
        )
        .await
        .unwrap();
        assert_eq!(confirmed_income.len(), 1);
        assert_eq!(confirmed_income[0].id, income.id);
    }

    #[tokio::test]
    async fn cash_balance_is_order_independent() {
        let pool = test_pool().await;
        // The same set of confirmed cash entries, confirmed in scrambled
        // order, must produce the same balance: the aggregate reads state,
        // not history.
        let amounts: [(EntryKind, i64); 4] = [
            (EntryKind::Income, 15_000_00),
            (EntryKind::Expense, 3_000_00),
            (EntryKind::Income, 2_500_00),
            (EntryKind::Expense, 700_00),
        ];
        let mut ids = Vec::new();
        for (kind, amount) in amounts {
            let e = create(&pool, entry("2025-01-15", kind, amount, PaymentMethod::Cash))
                .await
                .unwrap();
            ids.push(e.id);
        }
        // Scrambled confirmation order
        for id in [ids[2], ids[0], ids[3], ids[1]] {
            confirm(&pool, id, "accountant").await.unwrap();
        }

        let mut conn = pool.acquire().await.unwrap();
        let balance = cash_balance_as_of(&mut conn, "2025-01-15".parse().unwrap())
            .await
            .unwrap();
        assert_eq!(balance, 15_000_00 - 3_000_00 + 2_500_00 - 700_00);
    }

    #[tokio::test]
    async fn cash_balance_ignores_unconfirmed_and_non_cash() {
        let pool = test_pool().await;
        let confirmed = create(&pool, entry("2025-01-15", EntryKind::Income, 1_000_00, PaymentMethod::Cash))
            .await
            .unwrap();
        confirm(&pool, confirmed.id, "accountant").await.unwrap();
        // Unconfirmed cash is excluded
        create(&pool, entry("2025-01-15", EntryKind::Income, 500_00, PaymentMethod::Cash))
            .await
            .unwrap();
        // Confirmed card is excluded
        let card = create(&pool, entry("2025-01-15", EntryKind::Income, 300_00, PaymentMethod::Card))
            .await
            .unwrap();
        confirm(&pool, card.id, "accountant").await.unwrap();
        // Confirmed cash on a later date is excluded by the cutoff
        let later = create(&pool, entry("2025-02-01", EntryKind::Income, 200_00, PaymentMethod::Cash))
            .await
            .unwrap();
        confirm(&pool, later.id, "accountant").await.unwrap();

        let mut conn = pool.acquire().await.unwrap();
        let balance = cash_balance_as_of(&mut conn, "2025-01-15".parse().unwrap())
            .await
            .unwrap();
        assert_eq!(balance, 1_000_00);
    }

    #[tokio::test]
    async fn delete_removes_row() {
        let pool = test_pool().await;
        let e = create(&pool, entry("2025-01-15", EntryKind::Income, 100_00, PaymentMethod::Cash))
            .await
            .unwrap();
        assert!(delete(&pool, e.id).await.unwrap());
        assert!(find_by_id(&pool, e.id).await.unwrap().is_none());
        assert!(!delete(&pool, e.id).await.unwrap());
    }
}
