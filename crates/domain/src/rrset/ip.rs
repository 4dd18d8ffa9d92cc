use super::RRSetData;
use serde::{Deserialize, Serialize};
use std::net::IpAddr;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterCount {
    /// Answer with the selected address only
    Single,
    /// Answer with every eligible address, starting at the selected one
    #[default]
    Multi,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterOrder {
    Weighted,
    Rr,
    #[default]
    None,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GeoFilter {
    #[default]
    None,
    Country,
    Asn,
    AsnCountry,
    Location,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IpFilter {
    #[serde(default)]
    pub count: FilterCount,

    #[serde(default)]
    pub order: FilterOrder,

    #[serde(default)]
    pub geo_filter: GeoFilter,
}

/// Health check settings attached to an address set. Probing happens in a
/// separate subsystem; the resolver only reads the resulting scores.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthCheckPolicy {
    #[serde(default)]
    pub protocol: String,

    #[serde(default)]
    pub uri: String,

    #[serde(default)]
    pub port: u16,

    /// Probe timeout in milliseconds
    #[serde(default)]
    pub timeout: u64,

    #[serde(default)]
    pub up_count: i32,

    /// Scores at or below this value mark an address down
    #[serde(default)]
    pub down_count: i32,

    #[serde(default)]
    pub enable: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IpRecord {
    pub ip: IpAddr,

    #[serde(default, skip_serializing_if = "is_zero")]
    pub weight: u32,

    /// ISO country codes this address serves
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub country: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub asn: Vec<u32>,
}

fn is_zero(value: &u32) -> bool {
    *value == 0
}

impl IpRecord {
    pub fn new(ip: IpAddr) -> Self {
        Self {
            ip,
            weight: 0,
            country: Vec::new(),
            asn: Vec::new(),
        }
    }

    pub fn with_weight(mut self, weight: u32) -> Self {
        self.weight = weight;
        self
    }

    pub fn with_country(mut self, country: &str) -> Self {
        self.country.push(country.to_ascii_uppercase());
        self
    }

    pub fn with_asn(mut self, asn: u32) -> Self {
        self.asn.push(asn);
        self
    }

    pub fn serves_country(&self, country: &str) -> bool {
        self.country.iter().any(|c| c.eq_ignore_ascii_case(country))
    }

    pub fn serves_asn(&self, asn: u32) -> bool {
        self.asn.contains(&asn)
    }
}

/// A or AAAA set with its steering policy.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IpRRSet {
    #[serde(default)]
    pub ttl: u32,

    #[serde(default)]
    pub records: Vec<IpRecord>,

    #[serde(default)]
    pub filter: IpFilter,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub health_check: Option<HealthCheckPolicy>,
}

impl IpRRSet {
    pub fn new(ttl: u32, records: Vec<IpRecord>) -> Self {
        Self {
            ttl,
            records,
            filter: IpFilter::default(),
            health_check: None,
        }
    }

    pub fn with_filter(mut self, filter: IpFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn health_check_enabled(&self) -> bool {
        self.health_check.as_ref().is_some_and(|h| h.enable)
    }
}

impl RRSetData for IpRRSet {
    fn ttl(&self) -> u32 {
        self.ttl
    }

    fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
