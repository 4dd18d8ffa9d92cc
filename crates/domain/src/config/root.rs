use super::{
    CacheConfig, ConfigError, CookieConfig, DnssecConfig, GeoIpConfig, LoggingConfig,
    ResolverConfig, ServerConfig, StoreBackend, StoreConfig, UpstreamConfig,
};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main configuration structure
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub cache: CacheConfig,

    #[serde(default)]
    pub resolver: ResolverConfig,

    #[serde(default)]
    pub upstream: UpstreamConfig,

    #[serde(default)]
    pub dnssec: DnssecConfig,

    #[serde(default)]
    pub geoip: GeoIpConfig,

    #[serde(default)]
    pub cookie: CookieConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Values passed on the command line take precedence over the config file
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub dns_port: Option<u16>,
    pub bind_address: Option<String>,
    pub store_url: Option<String>,
    pub store_backend: Option<StoreBackend>,
    pub log_level: Option<String>,
}

impl Config {
    /// Load configuration from `path` (if it exists) and apply CLI overrides.
    pub fn load(path: Option<&str>, overrides: CliOverrides) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(p) if Path::new(p).exists() => Self::from_file(p)?,
            _ => Self::default(),
        };
        config.apply_overrides(overrides);
        Ok(config)
    }

    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.to_string(),
            reason: e.to_string(),
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    fn apply_overrides(&mut self, overrides: CliOverrides) {
        if let Some(port) = overrides.dns_port {
            self.server.dns_port = port;
        }
        if let Some(bind) = overrides.bind_address {
            self.server.bind_address = bind;
        }
        if let Some(url) = overrides.store_url {
            self.store.url = url;
        }
        if let Some(backend) = overrides.store_backend {
            self.store.backend = backend;
        }
        if let Some(level) = overrides.log_level {
            self.logging.level = level;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.store.prefix.is_empty() {
            return Err(ConfigError::Validation(
                "store.prefix must not be empty".to_string(),
            ));
        }
        if self.store.pool_size == 0 || self.store.max_active == 0 {
            return Err(ConfigError::Validation(
                "store.pool_size and store.max_active must be positive".to_string(),
            ));
        }
        if self.resolver.max_chain_hops == 0 {
            return Err(ConfigError::Validation(
                "resolver.max_chain_hops must be at least 1".to_string(),
            ));
        }
        if let Some(secret) = &self.cookie.secret {
            if secret.len() != 32 || !secret.chars().all(|c| c.is_ascii_hexdigit()) {
                return Err(ConfigError::Validation(
                    "cookie.secret must be 32 hex characters".to_string(),
                ));
            }
        }
        for server in &self.upstream.servers {
            server.socket_addr()?;
        }
        Ok(())
    }
}
