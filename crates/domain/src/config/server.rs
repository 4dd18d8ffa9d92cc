use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_dns_port")]
    pub dns_port: u16,

    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    #[serde(default = "default_true")]
    pub tcp_enabled: bool,

    /// Upper bound on queries being resolved at the same time
    #[serde(default = "default_max_concurrent_queries")]
    pub max_concurrent_queries: usize,

    #[serde(default = "default_tcp_idle_timeout")]
    pub tcp_idle_timeout_secs: u64,

    /// Largest UDP response we send regardless of the client's EDNS size
    #[serde(default = "default_max_udp_payload")]
    pub max_udp_payload: u16,
}

fn default_dns_port() -> u16 {
    53
}

fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}

fn default_true() -> bool {
    true
}

fn default_max_concurrent_queries() -> usize {
    4096
}

fn default_tcp_idle_timeout() -> u64 {
    10
}

fn default_max_udp_payload() -> u16 {
    4096
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            dns_port: default_dns_port(),
            bind_address: default_bind_address(),
            tcp_enabled: true,
            max_concurrent_queries: default_max_concurrent_queries(),
            tcp_idle_timeout_secs: default_tcp_idle_timeout(),
            max_udp_payload: default_max_udp_payload(),
        }
    }
}
