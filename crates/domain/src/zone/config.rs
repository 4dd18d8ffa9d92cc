use crate::rrset::SoaRRSet;
use crate::DomainError;
use serde::{Deserialize, Serialize};

/// Per-zone configuration stored under `<prefix>zones:<zone>:config`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneConfig {
    #[serde(default)]
    pub soa: SoaRRSet,

    #[serde(default)]
    pub dnssec: bool,

    #[serde(default)]
    pub cname_flattening: bool,

    /// Opaque identifier of the zone in the management database
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub domain_id: String,
}

impl ZoneConfig {
    pub fn from_json(zone: &str, json: &str) -> Result<Self, DomainError> {
        let mut config: Self =
            serde_json::from_str(json).map_err(|e| DomainError::InvalidZoneConfig {
                zone: zone.to_string(),
                reason: e.to_string(),
            })?;
        config.fill_defaults(zone);
        Ok(config)
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }

    /// Zones stored without SOA names get `ns1.<zone>` / `hostmaster.<zone>`.
    pub fn fill_defaults(&mut self, zone: &str) {
        if self.soa.ns.is_empty() {
            self.soa.ns = format!("ns1.{zone}");
        }
        if self.soa.mbox.is_empty() {
            self.soa.mbox = format!("hostmaster.{zone}");
        }
    }
}
