use super::ConfigError;
use serde::{Deserialize, Serialize};
use std::net::{IpAddr, SocketAddr};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum UpstreamProtocol {
    #[default]
    Udp,
    Tcp,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UpstreamServerConfig {
    /// `ip:port`, port 53 assumed when omitted
    pub address: String,

    #[serde(default)]
    pub protocol: UpstreamProtocol,

    #[serde(default = "default_timeout")]
    pub timeout_ms: u64,
}

/// Upstream resolvers used for targets outside the authoritative data
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UpstreamConfig {
    #[serde(default = "default_servers")]
    pub servers: Vec<UpstreamServerConfig>,

    /// Maximum cached upstream answers (default: 10000)
    #[serde(default = "default_cache_size")]
    pub cache_size: usize,
}

impl UpstreamServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if let Ok(addr) = self.address.parse::<SocketAddr>() {
            return Ok(addr);
        }
        self.address
            .parse::<IpAddr>()
            .map(|ip| SocketAddr::new(ip, 53))
            .map_err(|_| {
                ConfigError::Validation(format!("invalid upstream address '{}'", self.address))
            })
    }
}

fn default_timeout() -> u64 {
    2000
}

fn default_servers() -> Vec<UpstreamServerConfig> {
    vec![
        UpstreamServerConfig {
            address: "1.1.1.1:53".to_string(),
            protocol: UpstreamProtocol::Udp,
            timeout_ms: default_timeout(),
        },
        UpstreamServerConfig {
            address: "8.8.8.8:53".to_string(),
            protocol: UpstreamProtocol::Udp,
            timeout_ms: default_timeout(),
        },
    ]
}

fn default_cache_size() -> usize {
    10_000
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            servers: default_servers(),
            cache_size: default_cache_size(),
        }
    }
}
