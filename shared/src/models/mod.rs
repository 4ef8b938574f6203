//! Data models
//!
//! Shared between the engine and frontend plumbing (bot / API).
//! DB row types use `#[cfg_attr(feature = "db", derive(sqlx::FromRow))]`.
//! All IDs are `i64` (SQLite INTEGER PRIMARY KEY); monetary columns are
//! `i64` minor units (kopecks); dates are ISO `YYYY-MM-DD`.

pub mod advance;
pub mod cash_balance;
pub mod category;
pub mod employee;
pub mod entry;
pub mod receipt;
pub mod shift_report;

// Re-exports
pub use advance::*;
pub use cash_balance::*;
pub use category::*;
pub use employee::*;
pub use entry::*;
pub use receipt::*;
pub use shift_report::*;
