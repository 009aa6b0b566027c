//! CLI configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use turbo_commerce::currency::{DEFAULT_NGN_RATE, DEFAULT_RATES_URL};
use turbo_commerce::sync::{BackoffStrategy, RetryPolicy, SyncPolicy};
use turbo_data::FetchClient;

/// Storefront configuration file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StorefrontConfig {
    /// Storefront API.
    #[serde(default)]
    pub api: ApiConfig,

    /// Currency display.
    #[serde(default)]
    pub currency: CurrencyConfig,

    /// Remote sync behaviour.
    #[serde(default)]
    pub sync: SyncConfig,

    /// Local session storage.
    #[serde(default)]
    pub storage: StorageConfig,
}

impl StorefrontConfig {
    /// Load config from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        if is_json(path) {
            serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse JSON config: {}", path.display()))
        } else {
            toml::from_str(&content)
                .with_context(|| format!("Failed to parse TOML config: {}", path.display()))
        }
    }

    /// Save config to a file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = if is_json(path) {
            serde_json::to_string_pretty(self)?
        } else {
            toml::to_string_pretty(self)?
        };

        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))
    }

    /// HTTP client for the storefront API.
    pub fn api_client(&self) -> FetchClient {
        let client = FetchClient::new().with_base_url(&self.api.base_url);
        match self.api.timeout_secs {
            Some(secs) => client.with_timeout(Duration::from_secs(secs)),
            None => client,
        }
    }

    /// Remote sync policy described by the `[sync]` section.
    pub fn sync_policy(&self) -> SyncPolicy {
        match self.sync.policy {
            SyncMode::LogOnly => SyncPolicy::LogOnly,
            SyncMode::Retry => SyncPolicy::Retry(
                RetryPolicy::new(self.sync.max_attempts).with_backoff(
                    BackoffStrategy::Exponential {
                        base: Duration::from_millis(self.sync.base_delay_ms),
                        max: Duration::from_millis(self.sync.max_delay_ms),
                    },
                ),
            ),
        }
    }
}

fn is_json(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "json")
}

/// Storefront API settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL for `/users/{id}` and `/products/{id}`.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Request timeout. No timeout when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

fn default_base_url() -> String {
    "http://localhost:3001".to_string()
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: None,
        }
    }
}

/// Currency settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrencyConfig {
    /// USD-based rates endpoint.
    #[serde(default = "default_rates_url")]
    pub rates_url: String,

    /// NGN per USD until a live rate is fetched.
    #[serde(default = "default_fallback_rate")]
    pub fallback_rate: f64,
}

fn default_rates_url() -> String {
    DEFAULT_RATES_URL.to_string()
}

fn default_fallback_rate() -> f64 {
    DEFAULT_NGN_RATE
}

impl Default for CurrencyConfig {
    fn default() -> Self {
        Self {
            rates_url: default_rates_url(),
            fallback_rate: default_fallback_rate(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncMode {
    #[default]
    LogOnly,
    Retry,
}

/// Remote sync settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncConfig {
    #[serde(default)]
    pub policy: SyncMode,

    /// Retries after the first attempt (`retry` only).
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,

    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
}

fn default_max_attempts() -> u32 {
    3
}

fn default_base_delay_ms() -> u64 {
    200
}

fn default_max_delay_ms() -> u64 {
    5_000
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            policy: SyncMode::default(),
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
        }
    }
}

/// Local storage settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory holding the storage files, relative to the working directory.
    #[serde(default = "default_storage_dir")]
    pub dir: PathBuf,

    /// Keep new sessions in the durable tier.
    #[serde(default = "default_true")]
    pub remember_me: bool,
}

fn default_storage_dir() -> PathBuf {
    PathBuf::from(".turbo")
}

fn default_true() -> bool {
    true
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            dir: default_storage_dir(),
            remember_me: true,
        }
    }
}

/// Generate a default turbo.toml config file.
pub fn generate_default_config() -> String {
    format!(
        r#"# TurboCommerce storefront configuration

[api]
base_url = "{base_url}"
# timeout_secs = 10

[currency]
rates_url = "{rates_url}"
fallback_rate = {fallback_rate:.1}

[sync]
# "log_only" or "retry"
policy = "log_only"
max_attempts = 3
base_delay_ms = 200
max_delay_ms = 5000

[storage]
dir = ".turbo"
remember_me = true
"#,
        base_url = default_base_url(),
        rates_url = DEFAULT_RATES_URL,
        fallback_rate = DEFAULT_NGN_RATE,
    )
}
