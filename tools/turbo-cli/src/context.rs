//! CLI execution context.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context as _, Result};
use turbo_cache::{Cache, FileStore, SessionStorage, Tier};
use turbo_commerce::catalog::Product;
use turbo_commerce::currency::{CurrencyFormatter, HttpRateSource};
use turbo_commerce::session::SessionRecord;
use turbo_commerce::sync::HttpUserApi;
use turbo_commerce::{CommerceState, ProductId};

use crate::config::StorefrontConfig;
use crate::output::Output;

/// Config file names searched for, in order, from the working directory up.
pub const CONFIG_NAMES: [&str; 3] = ["turbo.toml", ".turbo.toml", "turbo.json"];

/// Execution context for CLI commands.
pub struct Context {
    /// Storefront configuration.
    pub config: StorefrontConfig,
    /// File the configuration came from, if any.
    pub config_path: Option<PathBuf>,
    /// Output handler.
    pub output: Output,
    /// Working directory.
    pub cwd: PathBuf,
}

impl Context {
    /// Load context from config file.
    pub fn load(config_path: Option<&str>, output: Output) -> Result<Self> {
        let cwd = std::env::current_dir().context("Failed to get current directory")?;

        let (config, config_path) = match config_path {
            Some(path) => {
                let path = resolve(&cwd, path);
                (StorefrontConfig::load(&path)?, Some(path))
            }
            None => match find_config(&cwd) {
                Some((config, path)) => (config, Some(path)),
                None => (StorefrontConfig::default(), None),
            },
        };

        if let Some(ref path) = config_path {
            tracing::debug!(path = %path.display(), "loaded config");
        }

        Ok(Self {
            config,
            config_path,
            output,
            cwd,
        })
    }

    /// Directory holding the storage files, created on demand.
    pub fn storage_dir(&self) -> Result<PathBuf> {
        let dir = resolve(&self.cwd, &self.config.storage.dir);
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create storage directory: {}", dir.display()))?;
        Ok(dir)
    }

    /// Session storage over `durable.json` and `session.json` in the storage
    /// directory.
    pub fn session_storage(&self) -> Result<SessionStorage<SessionRecord>> {
        let dir = self.storage_dir()?;
        let durable = FileStore::open(dir.join("durable.json"))
            .context("Failed to open durable storage")?;
        let session = FileStore::open(dir.join("session.json"))
            .context("Failed to open session storage")?;
        Ok(SessionStorage::new(
            Cache::open(Arc::new(durable)),
            Cache::open(Arc::new(session)),
        ))
    }

    /// Commerce state wired to the configured API, storage and sync policy.
    ///
    /// The live exchange rate is fetched once here; when that fails the
    /// configured fallback rate is used.
    pub async fn open_state(&self) -> Result<CommerceState> {
        let session = self.session_storage()?;
        let currency = CurrencyFormatter::init(
            session.tier(Tier::Durable).clone(),
            self.config.currency.fallback_rate,
            &self.rate_source(),
        )
        .await;

        Ok(CommerceState::new(session)
            .with_currency(currency)
            .with_remote(Arc::new(HttpUserApi::new(self.config.api_client())))
            .with_notifier(Arc::new(self.output))
            .with_sync_policy(self.config.sync_policy()))
    }

    /// Exchange-rate source from the `[currency]` section.
    pub fn rate_source(&self) -> HttpRateSource {
        HttpRateSource::new(self.config.api_client(), &self.config.currency.rates_url)
    }

    /// Resolve a product argument.
    ///
    /// An existing file is read as product JSON; anything else is treated as
    /// a product id and fetched from `GET {base_url}/products/{id}`.
    pub async fn load_product(&self, state: &CommerceState, arg: &str) -> Result<Product> {
        let path = resolve(&self.cwd, arg);
        let value: serde_json::Value = if path.is_file() {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read product file: {}", path.display()))?;
            serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse product file: {}", path.display()))?
        } else {
            let id = ProductId::parse(arg).map_err(|e| state.report(e))?;
            self.config
                .api_client()
                .get(format!("products/{id}"))
                .send()
                .await?
                .error_for_status()
                .with_context(|| format!("Failed to fetch product {id}"))?
                .json()?
        };
        Ok(state.parse_product(value)?)
    }
}

/// Find a config file in the directory tree.
fn find_config(start: &Path) -> Option<(StorefrontConfig, PathBuf)> {
    start.ancestors().find_map(|dir| {
        CONFIG_NAMES.iter().find_map(|name| {
            let path = dir.join(name);
            if !path.is_file() {
                return None;
            }
            match StorefrontConfig::load(&path) {
                Ok(config) => Some((config, path)),
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "skipping unreadable config");
                    None
                }
            }
        })
    })
}

/// Resolve a path relative to the working directory.
fn resolve(cwd: &Path, path: impl AsRef<Path>) -> PathBuf {
    let path = path.as_ref();
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        cwd.join(path)
    }
}
