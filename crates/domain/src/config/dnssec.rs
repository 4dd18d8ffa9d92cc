use serde::{Deserialize, Serialize};

/// RRSIG validity window, relative to the time a zone is loaded
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DnssecConfig {
    /// Seconds subtracted from load time for the inception (default: 3 hours)
    #[serde(default = "default_inception_offset")]
    pub inception_offset_secs: u32,

    /// Seconds added to load time for the expiration (default: 8 days)
    #[serde(default = "default_validity")]
    pub validity_secs: u32,
}

fn default_inception_offset() -> u32 {
    3 * 3600
}

fn default_validity() -> u32 {
    8 * 24 * 3600
}

impl Default for DnssecConfig {
    fn default() -> Self {
        Self {
            inception_offset_secs: default_inception_offset(),
            validity_secs: default_validity(),
        }
    }
}
