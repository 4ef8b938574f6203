/// Engine configuration.
///
/// # Environment variables
///
/// | Variable | Default | Meaning |
/// |----------|---------|---------|
/// | DATABASE_PATH | ./ledger.db | SQLite database file |
/// | LOG_LEVEL | info | tracing level |
/// | LOG_DIR | (unset) | rolling log directory; stdout when unset |
/// | SBIS_API_TOKEN | (unset) | SBIS OFD access token |
/// | SBIS_INN | (unset) | Organization INN for fiscal queries |
/// | JOB_INTERVAL_SECS | 3600 | background pass interval |
/// | ENVIRONMENT | development | development \| staging \| production |
#[derive(Debug, Clone)]
pub struct Config {
    pub database_path: String,
    pub log_level: String,
    pub log_dir: Option<String>,
    /// SBIS OFD credentials; reconciliation degrades to errors without them
    pub sbis_api_token: Option<String>,
    pub sbis_inn: Option<String>,
    /// How often the background pass imports reports and sweeps deadlines
    pub job_interval_secs: u64,
    pub environment: String,
}

impl Config {
    /// Load configuration from environment variables, falling back to
    /// defaults for anything unset.
    pub fn from_env() -> Self {
        Self {
            database_path: std::env::var("DATABASE_PATH").unwrap_or_else(|_| "./ledger.db".into()),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into()),
            log_dir: std::env::var("LOG_DIR").ok(),
            sbis_api_token: std::env::var("SBIS_API_TOKEN").ok(),
            sbis_inn: std::env::var("SBIS_INN").ok(),
            job_interval_secs: std::env::var("JOB_INTERVAL_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3600),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into()),
        }
    }
}
