use std::time::Duration;

use serde::Serialize;

use crate::source::DataSource;

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub data_dir: String,
    /// DuckDB size string such as `"1GB"` or `"512MB"`.
    pub duckdb_memory_limit: String,
    pub default_source: DataSource,
    pub live_feed: Option<LiveFeedConfig>,
    /// Days of synthetic data written by `seed` and by the empty-store bootstrap.
    pub seed_days: u32,
    pub seed_on_empty: bool,
    pub cache_ttl_secs: u64,
    pub theme: Theme,
    pub cors_origins: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct LiveFeedConfig {
    pub url: String,
    /// Passed through verbatim as a bearer token; never minted or refreshed here.
    pub token: Option<String>,
    pub view_id: String,
    pub timeout_secs: u64,
    /// How many trailing days to request.
    pub lookback_days: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        Ok(Self {
            port: std::env::var("CAMPAIGNLENS_PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .map_err(|e| format!("invalid port: {e}"))?,
            data_dir: std::env::var("CAMPAIGNLENS_DATA_DIR")
                .unwrap_or_else(|_| "./data".to_string()),
            duckdb_memory_limit: std::env::var("CAMPAIGNLENS_DUCKDB_MEMORY")
                .unwrap_or_else(|_| "1GB".to_string()),
            default_source: {
                let raw = std::env::var("CAMPAIGNLENS_SOURCE")
                    .unwrap_or_else(|_| "local".to_string());
                DataSource::parse(&raw)
                    .ok_or_else(|| format!("invalid CAMPAIGNLENS_SOURCE: {raw}"))?
            },
            live_feed: std::env::var("CAMPAIGNLENS_LIVE_FEED_URL")
                .ok()
                .filter(|v| !v.trim().is_empty())
                .map(|url| LiveFeedConfig {
                    url,
                    token: std::env::var("CAMPAIGNLENS_LIVE_FEED_TOKEN").ok(),
                    view_id: std::env::var("CAMPAIGNLENS_LIVE_FEED_VIEW_ID")
                        .unwrap_or_default(),
                    timeout_secs: std::env::var("CAMPAIGNLENS_LIVE_FEED_TIMEOUT_SECS")
                        .ok()
                        .and_then(|v| v.parse().ok())
                        .unwrap_or(10),
                    lookback_days: 30,
                }),
            seed_days: std::env::var("CAMPAIGNLENS_SEED_DAYS")
                .unwrap_or_else(|_| "45".to_string())
                .parse()
                .unwrap_or(45),
            seed_on_empty: std::env::var("CAMPAIGNLENS_SEED_ON_EMPTY")
                .map(|v| v != "false" && v != "0")
                .unwrap_or(true),
            cache_ttl_secs: std::env::var("CAMPAIGNLENS_CACHE_TTL_SECS")
                .unwrap_or_else(|_| "300".to_string())
                .parse()
                .unwrap_or(300),
            theme: match std::env::var("CAMPAIGNLENS_THEME").as_deref() {
                Ok("dark") => Theme::Dark,
                _ => Theme::Light,
            },
            cors_origins: std::env::var("CAMPAIGNLENS_CORS_ORIGINS")
                .map(|v| v.split(',').map(str::to_string).collect())
                .unwrap_or_default(),
        })
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }
}

impl LiveFeedConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
