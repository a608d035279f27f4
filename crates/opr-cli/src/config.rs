//! Configuration loading and management.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Result, bail};
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use opr_client::{ClientConfig, DEFAULT_PAGE_SIZE};
use opr_core::{DEFAULT_CLOSED_STATUS_ID, DEFAULT_LOOKAHEAD_DAYS};
use serde::{Deserialize, Deserializer, Serialize};

/// Application configuration.
#[derive(Clone, Serialize, Deserialize)]
pub struct Config {
    /// Instance URL, e.g. `https://op.example.com`.
    pub base_url: String,
    /// API key for basic auth against the API.
    #[serde(default, deserialize_with = "optional_text")]
    pub api_key: Option<String>,
    /// Project used when a report names none.
    #[serde(default, deserialize_with = "optional_text")]
    pub project_id: Option<String>,
    /// Status ID that marks a work package as closed.
    #[serde(deserialize_with = "text")]
    pub closed_status_id: String,
    /// Days ahead of the reference date in which a version counts as started.
    pub lookahead_days: i64,
    pub page_size: usize,
    pub cache_ttl_secs: u64,
    pub timeout_secs: u64,
}

/// A setting that is text to us but may look like a number to the
/// provider, as `OPR_PROJECT_ID=1` does.
#[derive(Deserialize)]
#[serde(untagged)]
enum Text {
    String(String),
    Unsigned(u64),
    Signed(i64),
    Float(f64),
}

impl From<Text> for String {
    fn from(value: Text) -> Self {
        match value {
            Text::String(value) => value,
            Text::Unsigned(value) => value.to_string(),
            Text::Signed(value) => value.to_string(),
            Text::Float(value) => value.to_string(),
        }
    }
}

fn text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Text::deserialize(deserializer).map(String::from)
}

fn optional_text<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<String>, D::Error> {
    Ok(Option::<Text>::deserialize(deserializer)?.map(String::from))
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("project_id", &self.project_id)
            .field("closed_status_id", &self.closed_status_id)
            .field("lookahead_days", &self.lookahead_days)
            .field("page_size", &self.page_size)
            .field("cache_ttl_secs", &self.cache_ttl_secs)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            api_key: None,
            project_id: None,
            closed_status_id: DEFAULT_CLOSED_STATUS_ID.to_string(),
            lookahead_days: DEFAULT_LOOKAHEAD_DAYS,
            page_size: DEFAULT_PAGE_SIZE,
            cache_ttl_secs: 60,
            timeout_secs: 30,
        }
    }
}

impl Config {
    /// Loads configuration, optionally from a specific file.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, figment::Error> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Some(config_dir) = dirs_config_path() {
            figment = figment.merge(Toml::file(config_dir.join("config.toml")));
        }

        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        // OPR_BASE_URL, OPR_API_KEY, ...
        figment = figment.merge(Env::prefixed("OPR_"));

        figment.extract()
    }

    /// Connection settings for the API client.
    pub fn client_config(&self) -> Result<ClientConfig> {
        if self.base_url.trim().is_empty() {
            bail!("base_url is not configured (set OPR_BASE_URL or base_url in config.toml)");
        }
        let Some(api_key) = &self.api_key else {
            bail!("api_key is not configured (set OPR_API_KEY or api_key in config.toml)");
        };
        Ok(ClientConfig {
            base_url: self.base_url.clone(),
            api_key: api_key.clone(),
            timeout: Duration::from_secs(self.timeout_secs),
            cache_ttl: Duration::from_secs(self.cache_ttl_secs),
            page_size: self.page_size,
        })
    }

    pub fn lookahead(&self) -> chrono::Duration {
        chrono::Duration::days(self.lookahead_days)
    }
}

/// Returns the platform-specific config directory for opr.
///
/// On Linux: `~/.config/opr`
fn dirs_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("opr"))
}
