//! Employee Repository

use super::{RepoError, RepoResult};
use shared::models::{Employee, EmployeeCreate};
use sqlx::SqlitePool;

pub async fn create(pool: &SqlitePool, data: EmployeeCreate) -> RepoResult<Employee> {
    let full_name = data.full_name.trim();
    if full_name.is_empty() {
        return Err(RepoError::Validation("Employee name cannot be empty".into()));
    }

    let now = shared::util::now_millis();
    let result = sqlx::query("INSERT INTO employee (full_name, is_active, created_at) VALUES (?, 1, ?)")
        .bind(full_name)
        .bind(now)
        .execute(pool)
        .await?;

    find_by_id(pool, result.last_insert_rowid())
        .await?
        .ok_or_else(|| RepoError::Database("Failed to create employee".into()))
}

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<Employee>> {
    let employee = sqlx::query_as::<_, Employee>(
        "SELECT id, full_name, is_active, created_at FROM employee WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(employee)
}

pub async fn find_active(pool: &SqlitePool) -> RepoResult<Vec<Employee>> {
    let employees = sqlx::query_as::<_, Employee>(
        "SELECT id, full_name, is_active, created_at FROM employee WHERE is_active = 1 ORDER BY full_name",
    )
    .fetch_all(pool)
    .await?;
    Ok(employees)
}

pub async fn deactivate(pool: &SqlitePool, id: i64) -> RepoResult<()> {
    let rows = sqlx::query("UPDATE employee SET is_active = 0 WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    if rows.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("Employee {id} not found")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_util::test_pool;

    #[tokio::test]
    async fn create_trims_and_lists_alphabetically() {
        let pool = test_pool().await;
        create(&pool, EmployeeCreate { full_name: "  Ivanova Maria ".into() }).await.unwrap();
        create(&pool, EmployeeCreate { full_name: "Antonov Pavel".into() }).await.unwrap();

        let active = find_active(&pool).await.unwrap();
        let names: Vec<&str> = active.iter().map(|e| e.full_name.as_str()).collect();
        assert_eq!(names, vec!["Antonov Pavel", "Ivanova Maria"]);
    }

    #[tokio::test]
    async fn blank_name_is_rejected() {
        let pool = test_pool().await;
        let err = create(&pool, EmployeeCreate { full_name: " ".into() }).await.unwrap_err();
        assert!(matches!(err, RepoError::Validation(_)));
    }

    #[tokio::test]
    async fn deactivated_employee_leaves_listing() {
        let pool = test_pool().await;
        let e = create(&pool, EmployeeCreate { full_name: "Ivanova Maria".into() }).await.unwrap();
        deactivate(&pool, e.id).await.unwrap();
        assert!(find_active(&pool).await.unwrap().is_empty());
        assert!(find_by_id(&pool, e.id).await.unwrap().is_some());
    }
}
