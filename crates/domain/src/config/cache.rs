use serde::{Deserialize, Serialize};

/// Zone and location cache configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CacheConfig {
    /// Maximum cached zones (default: 1000)
    #[serde(default = "default_zone_cache_size")]
    pub zone_cache_size: usize,

    /// Maximum cached locations (default: 100000)
    #[serde(default = "default_record_cache_size")]
    pub record_cache_size: usize,

    /// Seconds a loaded zone is served before it is reloaded (default: 600)
    #[serde(default = "default_zone_ttl")]
    pub zone_ttl_secs: u64,

    /// Seconds a loaded location is served before it is refetched (default: 60)
    #[serde(default = "default_record_ttl")]
    pub record_ttl_secs: u64,

    /// How often the zone-name index is checked for a pending reload (default: 10)
    #[serde(default = "default_zone_reload_interval")]
    pub zone_reload_interval_secs: u64,

    /// How often the zone-name index is reloaded unconditionally (default: 3600)
    #[serde(default = "default_forced_reload_interval")]
    pub forced_reload_interval_secs: u64,
}

fn default_zone_cache_size() -> usize {
    1000
}

fn default_record_cache_size() -> usize {
    100_000
}

fn default_zone_ttl() -> u64 {
    600
}

fn default_record_ttl() -> u64 {
    60
}

fn default_zone_reload_interval() -> u64 {
    10
}

fn default_forced_reload_interval() -> u64 {
    3600
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            zone_cache_size: default_zone_cache_size(),
            record_cache_size: default_record_cache_size(),
            zone_ttl_secs: default_zone_ttl(),
            record_ttl_secs: default_record_ttl(),
            zone_reload_interval_secs: default_zone_reload_interval(),
            forced_reload_interval_secs: default_forced_reload_interval(),
        }
    }
}
