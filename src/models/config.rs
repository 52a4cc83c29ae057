//! Application configuration structures.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// HTTP, proxy and crawl budget settings
    #[serde(default)]
    pub acquisition: AcquisitionConfig,

    /// Collection cycle timing
    #[serde(default)]
    pub scheduler: SchedulerConfig,

    /// Content store location
    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub logging: LoggingConfig,

    /// JSON array of `{name, url}` source descriptors
    #[serde(default = "defaults::sources_file")]
    pub sources_file: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            acquisition: AcquisitionConfig::default(),
            scheduler: SchedulerConfig::default(),
            storage: StorageConfig::default(),
            logging: LoggingConfig::default(),
            sources_file: defaults::sources_file(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Overlay values from the process environment.
    pub fn apply_env(&mut self) {
        self.apply_env_with(|key| std::env::var(key).ok());
    }

    /// Overlay values from an arbitrary key lookup. Empty values count as unset.
    pub fn apply_env_with(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(value) = get("USE_TOR") {
            self.acquisition.use_proxy = value.trim().eq_ignore_ascii_case("true");
        }
        if let Some(value) = get("TOR_PROXY") {
            self.acquisition.proxy_addr = value.trim().to_string();
        }
        if let Some(value) = get("COLLECTION_INTERVAL") {
            self.scheduler.interval = value.trim().to_string();
        }
        if let Some(value) = get("SOURCES_FILE") {
            self.sources_file = PathBuf::from(value);
        }
        if let Some(value) = get("STORAGE_DIR") {
            self.storage.dir = PathBuf::from(value);
        }
        if let Some(value) = get("LOG_LEVEL") {
            self.logging.level = value.trim().to_lowercase();
        }
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        let acq = &self.acquisition;
        if acq.user_agent.trim().is_empty() {
            return Err(AppError::validation("acquisition.user_agent is empty"));
        }
        if acq.web_timeout_secs == 0 || acq.forum_timeout_secs == 0 {
            return Err(AppError::validation("acquisition timeouts must be > 0"));
        }
        if acq.use_proxy && acq.proxy_addr.trim().is_empty() {
            return Err(AppError::validation(
                "acquisition.proxy_addr is empty while proxy routing is enabled",
            ));
        }
        if acq.forum_max_links == 0 {
            return Err(AppError::validation("acquisition.forum_max_links must be > 0"));
        }
        if acq.max_content_chars == 0 {
            return Err(AppError::validation(
                "acquisition.max_content_chars must be > 0",
            ));
        }
        if self.storage.connect_attempts == 0 {
            return Err(AppError::validation("storage.connect_attempts must be > 0"));
        }
        Ok(())
    }
}

/// HTTP client, proxy routing and crawl budget settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AcquisitionConfig {
    /// Route every request through the SOCKS proxy
    #[serde(default)]
    pub use_proxy: bool,

    /// SOCKS proxy `host:port`
    #[serde(default = "defaults::proxy_addr")]
    pub proxy_addr: String,

    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Timeout for web page and feed requests
    #[serde(default = "defaults::web_timeout")]
    pub web_timeout_secs: u64,

    /// Timeout for forum requests, which usually travel over the proxy
    #[serde(default = "defaults::forum_timeout")]
    pub forum_timeout_secs: u64,

    /// Maximum number of forum pages fetched per crawl
    #[serde(default = "defaults::forum_max_links")]
    pub forum_max_links: usize,

    /// Pause between consecutive forum page fetches
    #[serde(default = "defaults::forum_delay")]
    pub forum_delay_ms: u64,

    /// Upper bound on extracted text length, in characters
    #[serde(default = "defaults::max_content_chars")]
    pub max_content_chars: usize,
}

impl AcquisitionConfig {
    /// Proxy URL handed to the HTTP client, if routing is enabled.
    ///
    /// `socks5h` makes the proxy resolve host names, which `.onion` hosts need.
    pub fn proxy_url(&self) -> Option<String> {
        self.use_proxy
            .then(|| format!("socks5h://{}", self.proxy_addr.trim()))
    }

    pub fn forum_delay(&self) -> Duration {
        Duration::from_millis(self.forum_delay_ms)
    }
}

impl Default for AcquisitionConfig {
    fn default() -> Self {
        Self {
            use_proxy: false,
            proxy_addr: defaults::proxy_addr(),
            user_agent: defaults::user_agent(),
            web_timeout_secs: defaults::web_timeout(),
            forum_timeout_secs: defaults::forum_timeout(),
            forum_max_links: defaults::forum_max_links(),
            forum_delay_ms: defaults::forum_delay(),
            max_content_chars: defaults::max_content_chars(),
        }
    }
}

/// Collection cycle timing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Duration string such as `5m`, `90s` or `1h30m`
    #[serde(default = "defaults::interval")]
    pub interval: String,
}

impl SchedulerConfig {
    /// Parsed interval; invalid or zero values fall back to the default.
    pub fn interval(&self) -> Duration {
        match parse_duration(&self.interval) {
            Some(interval) if !interval.is_zero() => interval,
            _ => {
                log::warn!(
                    "Invalid collection interval {:?}, using default {}",
                    self.interval,
                    defaults::interval()
                );
                defaults::INTERVAL
            }
        }
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            interval: defaults::interval(),
        }
    }
}

/// Content store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory holding `content.json` and `categories.json`
    #[serde(default = "defaults::storage_dir")]
    pub dir: PathBuf,

    /// Attempts made to open the store before giving up
    #[serde(default = "defaults::connect_attempts")]
    pub connect_attempts: u32,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            dir: defaults::storage_dir(),
            connect_attempts: defaults::connect_attempts(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "defaults::log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: defaults::log_level(),
        }
    }
}

/// Parse a Go-style duration string: one or more `<number><unit>` pairs
/// with units `ns`, `us`/`µs`, `ms`, `s`, `m` and `h`. Numbers may carry a
/// fraction (`1h30m`, `1.5h`, `.5s`).
pub fn parse_duration(raw: &str) -> Option<Duration> {
    const UNITS: [(&str, f64); 7] = [
        ("ns", 1.0),
        ("us", 1e3),
        ("µs", 1e3),
        ("ms", 1e6),
        ("s", 1e9),
        ("m", 60e9),
        ("h", 3600e9),
    ];

    let mut rest = raw.trim();
    if rest.is_empty() {
        return None;
    }

    let is_numeric = |c: char| c.is_ascii_digit() || c == '.';
    let mut total = Duration::ZERO;
    while !rest.is_empty() {
        let number_end = rest.find(|c| !is_numeric(c)).unwrap_or(rest.len());
        let number = &rest[..number_end];
        if !number.contains(|c: char| c.is_ascii_digit()) {
            return None;
        }
        let value: f64 = number.parse().ok()?;
        rest = &rest[number_end..];

        let unit_end = rest.find(is_numeric).unwrap_or(rest.len());
        let (_, nanos_per_unit) = UNITS.iter().find(|(unit, _)| *unit == &rest[..unit_end])?;
        rest = &rest[unit_end..];

        let nanos = (value * nanos_per_unit).round();
        if !nanos.is_finite() || nanos > u64::MAX as f64 {
            return None;
        }
        total = total.checked_add(Duration::from_nanos(nanos as u64))?;
    }
    Some(total)
}

mod defaults {
    use std::path::PathBuf;
    use std::time::Duration;

    pub const INTERVAL: Duration = Duration::from_secs(5 * 60);

    pub fn proxy_addr() -> String {
        "tor:9050".into()
    }
    pub fn user_agent() -> String {
        "Mozilla/5.0 (compatible; threat-collector/0.1)".into()
    }
    pub fn web_timeout() -> u64 {
        60
    }
    pub fn forum_timeout() -> u64 {
        90
    }
    pub fn forum_max_links() -> usize {
        100
    }
    pub fn forum_delay() -> u64 {
        2000
    }
    pub fn max_content_chars() -> usize {
        5000
    }
    pub fn interval() -> String {
        "5m".into()
    }
    pub fn storage_dir() -> PathBuf {
        PathBuf::from("storage")
    }
    pub fn connect_attempts() -> u32 {
        5
    }
    pub fn log_level() -> String {
        "info".into()
    }
    pub fn sources_file() -> PathBuf {
        PathBuf::from("sources.json")
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn validate_default_config_ok() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn defaults_match_documented_values() {
        let config = Config::default();
        assert!(!config.acquisition.use_proxy);
        assert_eq!(config.acquisition.proxy_addr, "tor:9050");
        assert_eq!(config.acquisition.web_timeout_secs, 60);
        assert_eq!(config.acquisition.forum_timeout_secs, 90);
        assert_eq!(config.acquisition.forum_max_links, 100);
        assert_eq!(config.acquisition.forum_delay(), Duration::from_secs(2));
        assert_eq!(config.scheduler.interval(), Duration::from_secs(300));
    }

    #[test]
    fn validate_rejects_empty_user_agent() {
        let mut config = Config::default();
        config.acquisition.user_agent = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_enabled_proxy_without_address() {
        let mut config = Config::default();
        config.acquisition.use_proxy = true;
        config.acquisition.proxy_addr = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn env_overlay_sets_acquisition_fields() {
        let mut config = Config::default();
        config.apply_env_with(env(&[
            ("USE_TOR", "true"),
            ("TOR_PROXY", "127.0.0.1:9150"),
            ("COLLECTION_INTERVAL", "10m"),
            ("SOURCES_FILE", "/app/sources.json"),
            ("LOG_LEVEL", "DEBUG"),
        ]));

        assert!(config.acquisition.use_proxy);
        assert_eq!(
            config.acquisition.proxy_url().as_deref(),
            Some("socks5h://127.0.0.1:9150")
        );
        assert_eq!(config.scheduler.interval(), Duration::from_secs(600));
        assert_eq!(config.sources_file, PathBuf::from("/app/sources.json"));
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn env_overlay_ignores_empty_values() {
        let mut config = Config::default();
        config.apply_env_with(env(&[("TOR_PROXY", ""), ("USE_TOR", "yes")]));

        assert!(!config.acquisition.use_proxy);
        assert_eq!(config.acquisition.proxy_addr, "tor:9050");
        assert_eq!(config.acquisition.proxy_url(), None);
    }

    #[test]
    fn invalid_interval_falls_back_to_default() {
        let config = SchedulerConfig {
            interval: "every now and then".to_string(),
        };
        assert_eq!(config.interval(), Duration::from_secs(300));

        let zero = SchedulerConfig {
            interval: "0s".to_string(),
        };
        assert_eq!(zero.interval(), Duration::from_secs(300));
    }

    #[test]
    fn parse_duration_accepts_compound_values() {
        assert_eq!(parse_duration("90s"), Some(Duration::from_secs(90)));
        assert_eq!(parse_duration("1h30m"), Some(Duration::from_secs(5400)));
        assert_eq!(parse_duration("250ms"), Some(Duration::from_millis(250)));
        assert_eq!(parse_duration("5"), None);
        assert_eq!(parse_duration("m5"), None);
        assert_eq!(parse_duration(""), None);
    }

    #[test]
    fn parse_duration_accepts_fractions() {
        assert_eq!(parse_duration("1.5h"), Some(Duration::from_secs(5400)));
        assert_eq!(parse_duration(".5s"), Some(Duration::from_millis(500)));
        assert_eq!(parse_duration("2m0.25s"), Some(Duration::from_millis(120_250)));
        assert_eq!(parse_duration("1500us"), Some(Duration::from_micros(1500)));
        assert_eq!(parse_duration("1.2.3s"), None);
        assert_eq!(parse_duration(".s"), None);
        assert_eq!(parse_duration("1.5d"), None);
    }

    #[test]
    fn fractional_interval_is_honoured() {
        let config = SchedulerConfig {
            interval: "2.5m".to_string(),
        };
        assert_eq!(config.interval(), Duration::from_secs(150));
    }

    #[test]
    fn toml_sections_are_optional() {
        let config: Config = toml::from_str(
            r#"
            sources_file = "feeds.json"

            [acquisition]
            use_proxy = true
            "#,
        )
        .unwrap();
        assert!(config.acquisition.use_proxy);
        assert_eq!(config.acquisition.proxy_addr, "tor:9050");
        assert_eq!(config.sources_file, PathBuf::from("feeds.json"));
        assert_eq!(config.scheduler.interval, "5m");
    }
}
