use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use stockfolio_client::{DEFAULT_API_URL, DEFAULT_TIMEOUT_SECS};
use stockfolio_core::portfolio::sort::SortState;

pub struct Config {
    pub api_url: String,
    pub request_timeout: Duration,
    /// Where the session token is persisted. Defaults to `$SF_DATA_DIR/secrets.json`.
    pub secret_file: PathBuf,
    /// Base64 or 32-byte ascii key; the secrets file is stored in plain JSON without it.
    pub secret_key: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    /// Portfolio to show; the user's default portfolio when unset.
    pub portfolio_id: Option<String>,
    pub sort: SortState,
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        let api_url = non_empty_var("SF_API_URL").unwrap_or_else(|| DEFAULT_API_URL.into());
        let timeout_secs: u64 = non_empty_var("SF_TIMEOUT_SECS")
            .map(|v| v.parse())
            .transpose()
            .context("Invalid SF_TIMEOUT_SECS")?
            .unwrap_or(DEFAULT_TIMEOUT_SECS);
        let data_dir =
            PathBuf::from(non_empty_var("SF_DATA_DIR").unwrap_or_else(|| "./data".into()));
        let secret_file = non_empty_var("SF_SECRET_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(|| data_dir.join("secrets.json"));
        let sort = non_empty_var("SF_SORT")
            .map(|v| v.parse::<SortState>())
            .transpose()
            .context("Invalid SF_SORT")?
            .unwrap_or_default();

        Ok(Self {
            api_url,
            request_timeout: Duration::from_secs(timeout_secs),
            secret_file,
            secret_key: non_empty_var("SF_SECRET_KEY"),
            username: non_empty_var("SF_USERNAME"),
            password: non_empty_var("SF_PASSWORD"),
            portfolio_id: non_empty_var("SF_PORTFOLIO_ID"),
            sort,
        })
    }
}
