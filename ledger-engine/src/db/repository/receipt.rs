//! Fiscal Receipt Repository
//!
//! `fiscal_sign` carries a UNIQUE constraint: the same physical receipt
//! submitted twice surfaces as a Duplicate error instead of double
//! counting an expense.

use super::{validate_positive_amount, RepoError, RepoResult};
use shared::models::{Receipt, ReceiptCreate};
use sqlx::{SqliteConnection, SqlitePool};

const COLUMNS: &str = "id, advance_id, entry_id, fiscal_sign, fiscal_document, fiscal_storage, purchase_date, total_amount, seller_name, seller_inn, created_at";

pub async fn create_in(
    conn: &mut SqliteConnection,
    data: &ReceiptCreate,
    advance_id: Option<i64>,
    entry_id: Option<i64>,
) -> RepoResult<Receipt> {
    validate_positive_amount(data.total_amount, "Receipt total")?;
    if data.fiscal_sign.trim().is_empty() {
        return Err(RepoError::Validation("Receipt fiscal sign cannot be empty".into()));
    }

    let now = shared::util::now_millis();
    let result = sqlx::query(
        "INSERT INTO receipt (advance_id, entry_id, fiscal_sign, fiscal_document, fiscal_storage, purchase_date, total_amount, seller_name, seller_inn, created_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(advance_id)
    .bind(entry_id)
    .bind(data.fiscal_sign.trim())
    .bind(&data.fiscal_document)
    .bind(&data.fiscal_storage)
    .bind(data.purchase_date)
    .bind(data.total_amount)
    .bind(&data.seller_name)
    .bind(&data.seller_inn)
    .bind(now)
    .execute(&mut *conn)
    .await?;

    let id = result.last_insert_rowid();
    let receipt = sqlx::query_as::<_, Receipt>(&format!(
        "SELECT {COLUMNS} FROM receipt WHERE id = ?"
    ))
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;

    receipt.ok_or_else(|| RepoError::Database("Failed to create receipt".into()))
}

pub async fn find_by_advance(pool: &SqlitePool, advance_id: i64) -> RepoResult<Vec<Receipt>> {
    let receipts = sqlx::query_as::<_, Receipt>(&format!(
        "SELECT {COLUMNS} FROM receipt WHERE advance_id = ? ORDER BY purchase_date, id"
    ))
    .bind(advance_id)
    .fetch_all(pool)
    .await?;
    Ok(receipts)
}

pub async fn find_by_fiscal_sign(
    pool: &SqlitePool,
    fiscal_sign: &str,
) -> RepoResult<Option<Receipt>> {
    let receipt = sqlx::query_as::<_, Receipt>(&format!(
        "SELECT {COLUMNS} FROM receipt WHERE fiscal_sign = ?"
    ))
    .bind(fiscal_sign)
    .fetch_optional(pool)
    .await?;
    Ok(receipt)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_util::test_pool;

    fn receipt(sign: &str, amount: i64) -> ReceiptCreate {
        ReceiptCreate {
            fiscal_sign: sign.to_string(),
            fiscal_document: "1234".to_string(),
            fiscal_storage: "9960440300000001".to_string(),
            purchase_date: 1_736_950_000_000,
            total_amount: amount,
            seller_name: Some("OOO Postavshchik".to_string()),
            seller_inn: Some("7707083893".to_string()),
        }
    }

    #[tokio::test]
    async fn insert_stamps_created_at() {
        let pool = test_pool().await;
        let mut conn = pool.acquire().await.unwrap();
        let saved = create_in(&mut conn, &receipt("3062731713", 1_500_00), None, None)
            .await
            .unwrap();
        assert!(saved.created_at > 0);
    }

    #[tokio::test]
    async fn duplicate_fiscal_sign_is_rejected() {
        let pool = test_pool().await;
        let mut conn = pool.acquire().await.unwrap();
        create_in(&mut conn, &receipt("3062731713", 1_500_00), None, None)
            .await
            .unwrap();
        let err = create_in(&mut conn, &receipt("3062731713", 1_500_00), None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, RepoError::Duplicate(_)));
    }

    #[tokio::test]
    async fn zero_total_is_rejected() {
        let pool = test_pool().await;
        let mut conn = pool.acquire().await.unwrap();
        let err = create_in(&mut conn, &receipt("3062731713", 0), None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, RepoError::Validation(_)));
    }

    #[tokio::test]
    async fn lookup_by_fiscal_sign() {
        let pool = test_pool().await;
        let mut conn = pool.acquire().await.unwrap();
        create_in(&mut conn, &receipt("3062731713", 1_500_00), None, None)
            .await
            .unwrap();
        drop(conn);

        let found = find_by_fiscal_sign(&pool, "3062731713").await.unwrap();
        assert!(found.is_some());
        assert!(find_by_fiscal_sign(&pool, "0000000000").await.unwrap().is_none());
    }
}
