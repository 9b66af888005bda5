use crate::loader::RetryPolicy;
use std::{env, path::PathBuf, str::FromStr, time::Duration};
use tracing::warn;

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_DATA_DIR: &str = "assets/data";
const DEFAULT_TIMEOUT_MS: u64 = 10_000;
const DEFAULT_BACKOFF_MS: u64 = 250;

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub port: u16,
    pub data_dir: PathBuf,
    /// When set, dashboard data is fetched from this base URL instead of `data_dir`.
    pub data_url: Option<String>,
    pub fetch_timeout: Duration,
    pub retry: RetryPolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            data_url: None,
            fetch_timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            retry: RetryPolicy::default(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let port = parsed(&lookup, "PORT").unwrap_or(DEFAULT_PORT);

        let data_dir = lookup("DASHBOARD_DATA_DIR")
            .filter(|value| !value.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR));

        let data_url = lookup("DASHBOARD_DATA_URL")
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty());

        let timeout_ms =
            parsed(&lookup, "DASHBOARD_FETCH_TIMEOUT_MS").unwrap_or(DEFAULT_TIMEOUT_MS);
        let backoff_ms =
            parsed(&lookup, "DASHBOARD_RETRY_BACKOFF_MS").unwrap_or(DEFAULT_BACKOFF_MS);
        let retry = RetryPolicy {
            max_retries: parsed(&lookup, "DASHBOARD_FETCH_RETRIES").unwrap_or(0),
            backoff: Duration::from_millis(backoff_ms),
        };

        Self {
            port,
            data_dir,
            data_url,
            fetch_timeout: Duration::from_millis(timeout_ms),
            retry,
        }
    }
}

fn parsed<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    let value = lookup(key)?;
    match value.trim().parse::<T>() {
        Ok(parsed) => Some(parsed),
        Err(_) => {
            warn!("ignoring invalid {key}={value:?}");
            None
        }
    }
}
