use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    Redis,
    /// Process-local store, for development and tests
    Memory,
}

/// Backing key/value store configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub backend: StoreBackend,

    /// Connection URL (default: "redis://127.0.0.1:6379/0")
    #[serde(default = "default_url")]
    pub url: String,

    /// Namespace prepended to every key (default: "redzone:")
    #[serde(default = "default_prefix")]
    pub prefix: String,

    /// Number of multiplexed connections kept open
    #[serde(default = "default_pool_size")]
    pub pool_size: usize,

    /// Maximum commands in flight across the pool
    #[serde(default = "default_max_active")]
    pub max_active: usize,

    /// Wait for a free slot instead of failing fast when the pool is saturated
    #[serde(default = "default_wait")]
    pub wait_for_connection: bool,

    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_ms: u64,

    /// Delay before the keyspace subscriber reconnects after an error
    #[serde(default = "default_reconnect_delay")]
    pub reconnect_delay_ms: u64,
}

fn default_url() -> String {
    "redis://127.0.0.1:6379/0".to_string()
}

fn default_prefix() -> String {
    "redzone:".to_string()
}

fn default_pool_size() -> usize {
    4
}

fn default_max_active() -> usize {
    256
}

fn default_wait() -> bool {
    true
}

fn default_connect_timeout() -> u64 {
    2000
}

fn default_reconnect_delay() -> u64 {
    1000
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::default(),
            url: default_url(),
            prefix: default_prefix(),
            pool_size: default_pool_size(),
            max_active: default_max_active(),
            wait_for_connection: default_wait(),
            connect_timeout_ms: default_connect_timeout(),
            reconnect_delay_ms: default_reconnect_delay(),
        }
    }
}
