use std::time::Duration;

use anyhow::{Context, Result};

const DEFAULT_API_BASE_URL: &str = "http://localhost:8000";
const DEFAULT_TIMEOUT_SECS: u64 = 15;
const DEFAULT_DEBOUNCE_MS: u64 = 600;
const DEFAULT_MAX_FILE_MB: u64 = 200;

/// Runtime settings, read from the environment (and `.env` when present).
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub api_base_url: String,
    pub auth_token: Option<String>,
    pub api_key: Option<String>,
    pub request_timeout: Duration,
    pub duplicate_debounce: Duration,
    pub max_file_mb: u64,
    pub log_filter: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            auth_token: None,
            api_key: None,
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            duplicate_debounce: Duration::from_millis(DEFAULT_DEBOUNCE_MS),
            max_file_mb: DEFAULT_MAX_FILE_MB,
            log_filter: "info".to_string(),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = AppConfig::default();
        let non_empty = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        Ok(Self {
            api_base_url: non_empty("RECRUITER_API_BASE_URL").unwrap_or(defaults.api_base_url),
            auth_token: non_empty("RECRUITER_AUTH_TOKEN"),
            api_key: non_empty("RECRUITER_API_KEY"),
            request_timeout: parse_u64(&non_empty, "RECRUITER_HTTP_TIMEOUT_SECS")?
                .map(Duration::from_secs)
                .unwrap_or(defaults.request_timeout),
            duplicate_debounce: parse_u64(&non_empty, "RECRUITER_DUPLICATE_DEBOUNCE_MS")?
                .map(Duration::from_millis)
                .unwrap_or(defaults.duplicate_debounce),
            max_file_mb: parse_u64(&non_empty, "RECRUITER_MAX_FILE_MB")?
                .unwrap_or(defaults.max_file_mb),
            log_filter: non_empty("RUST_LOG").unwrap_or(defaults.log_filter),
        })
    }

    pub fn max_file_bytes(&self) -> u64 {
        self.max_file_mb * 1024 * 1024
    }
}

fn parse_u64<F>(lookup: &F, key: &str) -> Result<Option<u64>>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|raw| {
            raw.trim()
                .parse::<u64>()
                .with_context(|| format!("{key} must be a non-negative integer, got '{raw}'"))
        })
        .transpose()
}
