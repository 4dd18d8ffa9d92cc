use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ResolverConfig {
    /// Location lookups allowed per query before answering SERVFAIL
    #[serde(default = "default_max_chain_hops")]
    pub max_chain_hops: usize,

    /// Capacity of the per-query access log channel
    #[serde(default = "default_log_queue_size")]
    pub log_queue_size: usize,

    #[serde(default = "default_true")]
    pub access_log: bool,
}

fn default_max_chain_hops() -> usize {
    10
}

fn default_log_queue_size() -> usize {
    8192
}

fn default_true() -> bool {
    true
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            max_chain_hops: default_max_chain_hops(),
            log_queue_size: default_log_queue_size(),
            access_log: true,
        }
    }
}
