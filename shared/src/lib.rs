//! Shared types for the bookkeeping engine
//!
//! Data models, money helpers and small utilities used by the engine crate
//! and by any frontend plumbing (bot, API) built on top of it.
//! DB row types use `#[cfg_attr(feature = "db", derive(sqlx::FromRow))]`.

pub mod models;
pub mod money;
pub mod util;

// Re-exports
pub use serde::{Deserialize, Serialize};
