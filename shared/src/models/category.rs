//! Income/expense category (the category collaborator's lookup table)

use serde::{Deserialize, Serialize};

/// Which side of the ledger a category belongs to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
pub enum CategoryKind {
    Income,
    Expense,
}

/// Category entity
///
/// `tax_deductible` marks expense categories that count toward the
/// simplified-tax ("income minus expenses") base.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub kind: CategoryKind,
    pub tax_deductible: bool,
    pub sort_order: i32,
    pub is_active: bool,
    /// Creation time (Unix millis)
    pub created_at: i64,
}

/// Create category payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryCreate {
    pub name: String,
    pub kind: CategoryKind,
    /// Defaults to true; most expense categories are deductible.
    pub tax_deductible: Option<bool>,
    pub sort_order: Option<i32>,
}
