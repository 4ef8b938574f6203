//! Category Repository

use super::{RepoError, RepoResult};
use shared::models::{Category, CategoryCreate, CategoryKind};
use sqlx::SqlitePool;

pub async fn create(pool: &SqlitePool, data: CategoryCreate) -> RepoResult<Category> {
    let name = data.name.trim();
    if name.is_empty() {
        return Err(RepoError::Validation("Category name cannot be empty".into()));
    }

    let now = shared::util::now_millis();
    let result = sqlx::query(
        "INSERT INTO category (name, kind, tax_deductible, sort_order, is_active, created_at) VALUES (?, ?, ?, ?, 1, ?)",
    )
    .bind(name)
    .bind(data.kind)
    .bind(data.tax_deductible.unwrap_or(true))
    .bind(data.sort_order.unwrap_or(0))
    .bind(now)
    .execute(pool)
    .await?;

    find_by_id(pool, result.last_insert_rowid())
        .await?
        .ok_or_else(|| RepoError::Database("Failed to create category".into()))
}

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<Category>> {
    let category = sqlx::query_as::<_, Category>(
        "SELECT id, name, kind, tax_deductible, sort_order, is_active, created_at FROM category WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(category)
}

/// Active categories of one kind, in display order.
pub async fn find_active(pool: &SqlitePool, kind: CategoryKind) -> RepoResult<Vec<Category>> {
    let categories = sqlx::query_as::<_, Category>(
        "SELECT id, name, kind, tax_deductible, sort_order, is_active, created_at FROM category WHERE kind = ? AND is_active = 1 ORDER BY sort_order, name",
    )
    .bind(kind)
    .fetch_all(pool)
    .await?;
    Ok(categories)
}

/// Soft-deactivate. Historical entries keep pointing at the category.
pub async fn deactivate(pool: &SqlitePool, id: i64) -> RepoResult<()> {
    let rows = sqlx::query("UPDATE category SET is_active = 0 WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    if rows.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("Category {id} not found")));
    }
    Ok(())
}
