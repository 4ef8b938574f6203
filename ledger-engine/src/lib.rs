//! Ledger Engine - financial reconciliation and tax computation core
//!
//! # Architecture
//!
//! - **Ledger** (`db`): SQLite-backed income/expense store with the
//!   confirm workflow; all monetary columns are integer kopecks
//! - **Shift reconciliation** (`services/shift_check`): staff reports
//!   against the fiscal register (SBIS OFD)
//! - **Accountable advances** (`services/advances`): issue → report →
//!   overdue → taxed lifecycle
//! - **Tax** (`services/tax`): quarterly USN "income minus expenses"
//!   with the minimum-tax floor and an advance-payment schedule
//!
//! # Module structure
//!
//! ```text
//! ledger-engine/src/
//! ├── core/          # configuration, engine assembly
//! ├── db/            # pool, migrations, repositories
//! ├── services/      # fiscal client, reconciler, advances, tax
//! ├── jobs/          # background maintenance pass
//! └── utils/         # errors, logging, date helpers
//! ```

pub mod core;
pub mod db;
pub mod jobs;
pub mod services;
pub mod utils;

pub use crate::core::{Config, LedgerEngine};
pub use db::DbService;
pub use jobs::BackgroundTasks;
pub use services::{FiscalDataSource, SbisOfdClient};
pub use utils::logger::{init_logger, init_logger_with_file};
pub use utils::{AppError, AppResult};
