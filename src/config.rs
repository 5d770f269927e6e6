//! Configuration module
//!
//! TOML file at `$OCPP_GATEWAY_CONFIG`, or
//! `<config dir>/ocpp-gateway/config.toml`. Every section is optional.

use std::path::{Path, PathBuf};

use rust_decimal::Decimal;
use serde::Deserialize;
use thiserror::Error;

use crate::application::locking::manager::DEFAULT_LOCK_EXPIRY_SECS;
use crate::application::pricing::SimplePricingSettings;
use crate::application::scheduler::check_charging_station_template::DEFAULT_BATCH_PAGE_SIZE;
use crate::infrastructure::database::DatabaseConfig;
use crate::infrastructure::template::TemplateConfig;

pub const CONFIG_ENV_VAR: &str = "OCPP_GATEWAY_CONFIG";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Where the config file is looked up when `$OCPP_GATEWAY_CONFIG` is unset.
pub fn default_config_path() -> PathBuf {
    dirs_next::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("ocpp-gateway")
        .join("config.toml")
}

/// `$OCPP_GATEWAY_CONFIG` or the default path.
pub fn config_path_from_env() -> PathBuf {
    std::env::var(CONFIG_ENV_VAR)
        .map(PathBuf::from)
        .unwrap_or_else(|_| default_config_path())
}

/// Server configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// URL stations reach this gateway on; derived from host/port if unset
    pub public_url: Option<String>,
    /// Reported as the cloud host name on station records
    pub instance_name: Option<String>,
    /// Reported as the cloud host IP on station records
    pub instance_ip: Option<String>,
    /// WebSocket subprotocols offered, e.g. `ocpp1.6`
    pub supported_subprotocols: Vec<String>,
    /// Heartbeat interval sent in BootNotification responses
    pub heartbeat_interval: u32,
    /// How long the handshake's tenant snapshot is reused
    pub tenant_refresh_secs: u64,
}

impl ServerConfig {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn charging_station_url(&self) -> String {
        self.public_url
            .clone()
            .unwrap_or_else(|| format!("ws://{}", self.address()))
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 9000,
            public_url: None,
            instance_name: None,
            instance_ip: None,
            supported_subprotocols: vec!["ocpp1.6".to_string()],
            heartbeat_interval: 60,
            tenant_refresh_secs: 60,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    pub enabled: bool,
    pub listen: String,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            listen: "0.0.0.0:9090".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LockingConfig {
    pub expiry_secs: u64,
}

impl Default for LockingConfig {
    fn default() -> Self {
        Self {
            expiry_secs: DEFAULT_LOCK_EXPIRY_SECS,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    pub enabled: bool,
    pub interval_secs: u64,
    pub batch_page_size: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_secs: 600,
            batch_page_size: DEFAULT_BATCH_PAGE_SIZE,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PricingConfig {
    pub currency: String,
    /// Per kWh, used when no tariff applies
    pub default_energy_price: Decimal,
}

impl Default for PricingConfig {
    fn default() -> Self {
        let defaults = SimplePricingSettings::default();
        Self {
            currency: defaults.currency,
            default_energy_price: defaults.price,
        }
    }
}

impl From<&PricingConfig> for SimplePricingSettings {
    fn from(cfg: &PricingConfig) -> Self {
        Self {
            currency: cfg.currency.clone(),
            price: cfg.default_energy_price,
        }
    }
}

/// Whole config file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
    pub metrics: MetricsConfig,
    pub locking: LockingConfig,
    pub scheduler: SchedulerConfig,
    pub templates: Vec<TemplateConfig>,
    pub pricing: PricingConfig,
}

impl AppConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn parse(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }
}
