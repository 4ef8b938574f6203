//! Engine core: configuration and assembly.

pub mod config;
pub mod engine;

pub use config::Config;
pub use engine::LedgerEngine;
