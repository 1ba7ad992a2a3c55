use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf, time::Duration};
use tracing::debug;

pub const DEFAULT_RATES_BASE_URL: &str = "https://api.frankfurter.app";
pub const DEFAULT_BASE_CURRENCY: &str = "EUR";

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct RatesProviderConfig {
    pub base_url: String,
    /// Currency the provider quotes against; forced to a rate of exactly 1.
    #[serde(default = "default_base_currency")]
    pub base_currency: String,
}

impl Default for RatesProviderConfig {
    fn default() -> Self {
        RatesProviderConfig {
            base_url: DEFAULT_RATES_BASE_URL.to_string(),
            base_currency: default_base_currency(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ProvidersConfig {
    pub rates: Option<RatesProviderConfig>,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        ProvidersConfig {
            rates: Some(RatesProviderConfig::default()),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    /// Target used when a conversion names no target currency.
    pub default_currency: String,
    #[serde(default = "default_refresh_interval_secs")]
    pub refresh_interval_secs: u64,
    #[serde(default)]
    pub providers: ProvidersConfig,
}

fn default_base_currency() -> String {
    DEFAULT_BASE_CURRENCY.to_string()
}

fn default_refresh_interval_secs() -> u64 {
    60 * 60
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        Self::load_from_path(&config_path)
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("dev", "xcc", "xcc")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config = Self::from_yaml(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        debug!("Successfully loaded config");
        Ok(config)
    }

    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        if config.default_currency.trim().is_empty() {
            anyhow::bail!("default_currency must not be empty");
        }
        if config.refresh_interval_secs == 0 {
            anyhow::bail!("refresh_interval_secs must be greater than zero");
        }
        Ok(config)
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs)
    }

    pub fn rates_provider(&self) -> RatesProviderConfig {
        self.providers.rates.clone().unwrap_or_default()
    }
}
