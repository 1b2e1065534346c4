use serde::Deserialize;
use std::fmt;

/// Environment variable that overrides `upstream.api_key`.
pub const API_KEY_ENV: &str = "COOKIE_FUN_API_KEY";

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub upstream: UpstreamConfig,
    #[serde(default)]
    pub aggregation: AggregationConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub refresh: RefreshConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
}

#[derive(Clone, Deserialize)]
pub struct UpstreamConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Cookie.fun API key. Usually supplied via COOKIE_FUN_API_KEY instead of the file.
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

// Keeps the key out of `{:?}` output (config is logged at startup).
impl fmt::Debug for UpstreamConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UpstreamConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &mask_secret(&self.api_key))
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}

fn default_base_url() -> String {
    "https://api.cookie.fun/v2".into()
}

fn default_request_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AggregationConfig {
    /// Hard ceiling on pages fetched per run.
    pub max_pages: u32,
    pub page_size: u32,
    /// Pause between page requests (fixed-delay pacing).
    pub page_delay_ms: u64,
    /// Requests allowed back to back before pacing kicks in. Above 1 a token bucket
    /// refilled every `page_delay_ms` replaces the fixed delay.
    pub burst: u32,
    /// Deadline for one full run; an expired run is dropped and nothing is cached.
    pub run_timeout_secs: u64,
}

impl Default for AggregationConfig {
    fn default() -> Self {
        Self {
            max_pages: 300,
            page_size: 25,
            page_delay_ms: 250,
            burst: 1,
            run_timeout_secs: 300,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Directory holding one JSON file per interval.
    pub dir: String,
    /// Freshness window for complete results.
    pub fresh_hours: u64,
    /// Freshness window for failed or partial results. 0 = never serve them from cache.
    pub partial_fresh_minutes: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            dir: "data/cache".into(),
            fresh_hours: 6,
            partial_fresh_minutes: 10,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RefreshConfig {
    pub enabled: bool,
    /// Optional cron expression (UTC), e.g. "0 0 */6 * * *". Takes precedence over interval_secs.
    pub schedule: Option<String>,
    pub interval_secs: u64,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            schedule: None,
            interval_secs: 6 * 3600,
        }
    }
}

impl AppConfig {
    pub fn load() -> anyhow::Result<Self> {
        let path = std::env::var("CONFIG_FILE").unwrap_or_else(|_| "config.toml".into());
        let s = std::fs::read_to_string(&path)?;
        let mut config: AppConfig = toml::from_str(&s)?;
        if let Ok(key) = std::env::var(API_KEY_ENV)
            && !key.is_empty()
        {
            config.upstream.api_key = key;
        }
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate config from a string (e.g. for tests).
    pub fn load_from_str(s: &str) -> anyhow::Result<Self> {
        let config: AppConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            self.server.port > 0,
            "server.port must be between 1 and 65535, got {}",
            self.server.port
        );
        anyhow::ensure!(
            self.upstream.base_url.starts_with("http://")
                || self.upstream.base_url.starts_with("https://"),
            "upstream.base_url must be an http(s) URL, got {:?}",
            self.upstream.base_url
        );
        anyhow::ensure!(
            !self.upstream.api_key.is_empty(),
            "upstream.api_key must be set (or export {})",
            API_KEY_ENV
        );
        anyhow::ensure!(
            self.upstream.request_timeout_secs > 0,
            "upstream.request_timeout_secs must be > 0, got {}",
            self.upstream.request_timeout_secs
        );
        anyhow::ensure!(
            self.aggregation.max_pages > 0,
            "aggregation.max_pages must be > 0, got {}",
            self.aggregation.max_pages
        );
        anyhow::ensure!(
            self.aggregation.page_size > 0,
            "aggregation.page_size must be > 0, got {}",
            self.aggregation.page_size
        );
        anyhow::ensure!(
            self.aggregation.run_timeout_secs > 0,
            "aggregation.run_timeout_secs must be > 0, got {}",
            self.aggregation.run_timeout_secs
        );
        anyhow::ensure!(!self.cache.dir.is_empty(), "cache.dir must be non-empty");
        anyhow::ensure!(
            self.cache.fresh_hours > 0,
            "cache.fresh_hours must be > 0, got {}",
            self.cache.fresh_hours
        );
        if self.refresh.enabled {
            match &self.refresh.schedule {
                Some(expr) => {
                    anyhow::ensure!(
                        expr.parse::<cron::Schedule>().is_ok(),
                        "refresh.schedule is not a valid cron expression: {:?}",
                        expr
                    );
                }
                None => {
                    anyhow::ensure!(
                        self.refresh.interval_secs > 0,
                        "refresh.interval_secs must be > 0, got {}",
                        self.refresh.interval_secs
                    );
                }
            }
        }
        Ok(())
    }
}

/// First four characters followed by an ellipsis; short keys are fully hidden.
pub fn mask_secret(secret: &str) -> String {
    if secret.chars().count() <= 8 {
        return "****".into();
    }
    let head: String = secret.chars().take(4).collect();
    format!("{head}…")
}
