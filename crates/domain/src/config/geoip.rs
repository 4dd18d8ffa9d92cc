use serde::{Deserialize, Serialize};

/// MaxMind database locations
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct GeoIpConfig {
    #[serde(default)]
    pub enabled: bool,

    /// GeoLite2-Country database
    #[serde(default)]
    pub country_db: Option<String>,

    /// GeoLite2-ASN database
    #[serde(default)]
    pub asn_db: Option<String>,

    /// GeoLite2-City database, used for distance steering
    #[serde(default)]
    pub city_db: Option<String>,
}
