//! Business services on top of the repositories.

pub mod advances;
pub mod balance;
pub mod fiscal;
pub mod shift_check;
pub mod shift_importer;
pub mod tax;

pub use advances::AdvanceTracker;
pub use balance::BalanceCalculator;
pub use fiscal::{FiscalDataSource, SbisOfdClient};
pub use shift_check::ShiftValidator;
pub use shift_importer::ShiftImporter;
pub use tax::TaxEngine;
