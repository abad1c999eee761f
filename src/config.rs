use anyhow::{bail, Context, Result};
use chrono::{Duration, NaiveDate};
use serde::Deserialize;
use std::path::Path;

pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";
pub const DEFAULT_BASE_URL: &str = "https://coinmarketcap.com";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;
/// Days covered when no `--start` is given.
pub const DEFAULT_LOOKBACK_DAYS: i64 = 91;
/// Date format used by the historical-data query string.
pub const QUERY_DATE_FORMAT: &str = "%Y%m%d";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_user_agent() -> String {
    concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")).to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// Inclusive date range requested from the historical-data page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    /// Fill in missing bounds: `end` defaults to `today`, `start` to
    /// `end - DEFAULT_LOOKBACK_DAYS`.
    pub fn resolve(
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
        today: NaiveDate,
    ) -> Result<Self> {
        let end = end.unwrap_or(today);
        let start = start.unwrap_or(end - Duration::days(DEFAULT_LOOKBACK_DAYS));
        if start > end {
            bail!(
                "start date {} is after end date {}",
                start.format(QUERY_DATE_FORMAT),
                end.format(QUERY_DATE_FORMAT)
            );
        }
        Ok(Self { start, end })
    }

    pub fn start_param(&self) -> String {
        self.start.format(QUERY_DATE_FORMAT).to_string()
    }

    pub fn end_param(&self) -> String {
        self.end.format(QUERY_DATE_FORMAT).to_string()
    }
}

/// Parse a `YYYYMMDD` date argument (dashes are tolerated: `2017-12-31`).
pub fn parse_date_arg(s: &str) -> Result<NaiveDate> {
    let compact: String = s.trim().chars().filter(|c| *c != '-').collect();
    if compact.len() != 8 || !compact.chars().all(|c| c.is_ascii_digit()) {
        bail!("invalid date '{}': expected format like '20171231'", s);
    }
    NaiveDate::parse_from_str(&compact, QUERY_DATE_FORMAT)
        .with_context(|| format!("invalid date '{}': not a calendar date", s))
}

impl SourceConfig {
    pub fn validate(&self) -> Result<()> {
        let parsed = url::Url::parse(&self.base_url)
            .with_context(|| format!("source.base_url '{}' is not a URL", self.base_url))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            bail!(
                "source.base_url '{}': unsupported scheme '{}'",
                self.base_url,
                parsed.scheme()
            );
        }
        if self.timeout_secs == 0 {
            bail!("source.timeout_secs must be > 0");
        }
        Ok(())
    }
}

impl Config {
    /// Load configuration.
    ///
    /// An explicit `path` must exist. Without one, `config/default.toml` is
    /// read when present and built-in defaults are used otherwise. `.env` and
    /// `CMC_BASE_URL` / `CMC_TIMEOUT_SECS` are applied on top.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        dotenvy::dotenv().ok();

        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => {
                let default_path = Path::new(DEFAULT_CONFIG_PATH);
                if default_path.exists() {
                    Self::from_file(default_path)?
                } else {
                    Config::default()
                }
            }
        };

        config.apply_env_overrides(|key| std::env::var(key).ok())?;

        config.source.validate().context("source config is invalid")?;
        Ok(config)
    }

    /// Apply `CMC_BASE_URL` / `CMC_TIMEOUT_SECS`. Unset or blank values leave
    /// the current setting alone.
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_blank = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        if let Some(base_url) = non_blank("CMC_BASE_URL") {
            self.source.base_url = base_url;
        }
        if let Some(timeout) = non_blank("CMC_TIMEOUT_SECS") {
            self.source.timeout_secs = timeout
                .parse()
                .with_context(|| format!("CMC_TIMEOUT_SECS '{}' is not an integer", timeout))?;
        }
        Ok(())
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let config_str = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        toml::from_str(&config_str).with_context(|| format!("failed to parse {}", path.display()))
    }
}
