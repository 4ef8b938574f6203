use ledger_engine::core::{Config, LedgerEngine};
use ledger_engine::jobs::{self, BackgroundTasks};
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Environment and logging
    dotenv::dotenv().ok();
    let config = Config::from_env();
    ledger_engine::init_logger_with_file(Some(&config.log_level), config.log_dir.as_deref());

    tracing::info!(
        environment = %config.environment,
        database = %config.database_path,
        "Ledger engine starting"
    );

    // 2. Fiscal source and engine
    let fiscal = LedgerEngine::fiscal_from_config(&config)?;
    let engine = Arc::new(LedgerEngine::new(&config, fiscal).await?);

    // 3. Background maintenance
    let mut tasks = BackgroundTasks::new();
    jobs::spawn_maintenance(&mut tasks, engine.clone(), config.job_interval_secs);

    // 4. Run until interrupted
    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutdown signal received");
    tasks.shutdown().await;

    Ok(())
}
