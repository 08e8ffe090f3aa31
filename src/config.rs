use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "http://127.0.0.1:4000";
pub const DEFAULT_DATA_DIR: &str = ".crypto-tracker";
pub const DEFAULT_POLL_SECS: u64 = 10;

#[derive(Debug, Clone)]
pub struct Config {
    /// Backend base URL, without trailing slash
    pub api_url: String,
    /// Where the persisted key/value store lives
    pub data_dir: PathBuf,
    pub poll_interval: Duration,
}

impl Config {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let api_url = lookup("CRYPTO_TRACKER_API_URL")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());

        let data_dir = lookup("CRYPTO_TRACKER_DATA_DIR")
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR));

        let poll_secs = match lookup("CRYPTO_TRACKER_POLL_SECS") {
            Some(raw) => match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => secs,
                _ => {
                    tracing::warn!(
                        "Invalid CRYPTO_TRACKER_POLL_SECS '{}', using {}s",
                        raw,
                        DEFAULT_POLL_SECS
                    );
                    DEFAULT_POLL_SECS
                }
            },
            None => DEFAULT_POLL_SECS,
        };

        Self {
            api_url: normalize_base_url(&api_url),
            data_dir,
            poll_interval: Duration::from_secs(poll_secs),
        }
    }

    pub fn with_api_url(mut self, api_url: &str) -> Self {
        self.api_url = normalize_base_url(api_url);
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

pub(crate) fn normalize_base_url(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}
