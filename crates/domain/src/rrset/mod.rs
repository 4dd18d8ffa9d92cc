//! Typed RRSet payloads as stored in location JSON.
//!
//! Every variant shares a TTL and answers `is_empty`; turning a set into
//! wire records lives next to the wire codec in the infrastructure layer.

pub mod ip;

pub use ip::{
    FilterCount, FilterOrder, GeoFilter, HealthCheckPolicy, IpFilter, IpRRSet, IpRecord,
};

use serde::{Deserialize, Serialize};

/// Capability shared by every RRSet variant.
pub trait RRSetData {
    fn ttl(&self) -> u32;
    fn is_empty(&self) -> bool;
}

/// One slot of a location record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RRSetType {
    A,
    Aaaa,
    Cname,
    Txt,
    Ns,
    Mx,
    Srv,
    Caa,
    Ptr,
    Tlsa,
    Ds,
    Soa,
    Aname,
}

impl RRSetType {
    pub const ALL: [RRSetType; 13] = [
        Self::A,
        Self::Aaaa,
        Self::Cname,
        Self::Txt,
        Self::Ns,
        Self::Mx,
        Self::Srv,
        Self::Caa,
        Self::Ptr,
        Self::Tlsa,
        Self::Ds,
        Self::Soa,
        Self::Aname,
    ];

    /// JSON field name of the slot.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::A => "a",
            Self::Aaaa => "aaaa",
            Self::Cname => "cname",
            Self::Txt => "txt",
            Self::Ns => "ns",
            Self::Mx => "mx",
            Self::Srv => "srv",
            Self::Caa => "caa",
            Self::Ptr => "ptr",
            Self::Tlsa => "tlsa",
            Self::Ds => "ds",
            Self::Soa => "soa",
            Self::Aname => "aname",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        let lower = name.to_ascii_lowercase();
        Self::ALL.into_iter().find(|t| t.as_str() == lower)
    }
}

macro_rules! impl_rrset_data {
    ($ty:ty, $field:ident) => {
        impl RRSetData for $ty {
            fn ttl(&self) -> u32 {
                self.ttl
            }

            fn is_empty(&self) -> bool {
                self.$field.is_empty()
            }
        }
    };
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CnameRRSet {
    #[serde(default)]
    pub ttl: u32,
    pub host: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxtRecord {
    pub text: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxtRRSet {
    #[serde(default)]
    pub ttl: u32,
    #[serde(default)]
    pub records: Vec<TxtRecord>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NsRecord {
    pub host: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NsRRSet {
    #[serde(default)]
    pub ttl: u32,
    #[serde(default)]
    pub records: Vec<NsRecord>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MxRecord {
    pub host: String,
    #[serde(default)]
    pub preference: u16,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MxRRSet {
    #[serde(default)]
    pub ttl: u32,
    #[serde(default)]
    pub records: Vec<MxRecord>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SrvRecord {
    pub target: String,
    #[serde(default)]
    pub port: u16,
    #[serde(default)]
    pub priority: u16,
    #[serde(default)]
    pub weight: u16,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SrvRRSet {
    #[serde(default)]
    pub ttl: u32,
    #[serde(default)]
    pub records: Vec<SrvRecord>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaaRecord {
    #[serde(default)]
    pub flag: u8,
    pub tag: String,
    pub value: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaaRRSet {
    #[serde(default)]
    pub ttl: u32,
    #[serde(default)]
    pub records: Vec<CaaRecord>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PtrRRSet {
    #[serde(default)]
    pub ttl: u32,
    pub domain: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TlsaRecord {
    #[serde(default)]
    pub usage: u8,
    #[serde(default)]
    pub selector: u8,
    #[serde(default)]
    pub matching_type: u8,
    /// Certificate association data, hex encoded
    pub certificate: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TlsaRRSet {
    #[serde(default)]
    pub ttl: u32,
    #[serde(default)]
    pub records: Vec<TlsaRecord>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DsRecord {
    pub key_tag: u16,
    pub algorithm: u8,
    pub digest_type: u8,
    /// Hex encoded digest
    pub digest: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DsRRSet {
    #[serde(default)]
    pub ttl: u32,
    #[serde(default)]
    pub records: Vec<DsRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SoaRRSet {
    #[serde(default = "default_soa_ttl")]
    pub ttl: u32,
    #[serde(default)]
    pub ns: String,
    #[serde(default)]
    pub mbox: String,
    #[serde(default = "default_refresh")]
    pub refresh: u32,
    #[serde(default = "default_retry")]
    pub retry: u32,
    #[serde(default = "default_expire")]
    pub expire: u32,
    #[serde(default = "default_soa_ttl")]
    pub minttl: u32,
    #[serde(default = "default_serial")]
    pub serial: u32,
}

fn default_soa_ttl() -> u32 {
    300
}

fn default_refresh() -> u32 {
    86400
}

fn default_retry() -> u32 {
    7200
}

fn default_expire() -> u32 {
    3_600_000
}

fn default_serial() -> u32 {
    1
}

impl Default for SoaRRSet {
    fn default() -> Self {
        Self {
            ttl: default_soa_ttl(),
            ns: String::new(),
            mbox: String::new(),
            refresh: default_refresh(),
            retry: default_retry(),
            expire: default_expire(),
            minttl: default_soa_ttl(),
            serial: default_serial(),
        }
    }
}

/// Server-side alias resolved to the target's addresses.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnameRRSet {
    #[serde(default)]
    pub ttl: u32,
    pub location: String,
}

impl_rrset_data!(TxtRRSet, records);
impl_rrset_data!(NsRRSet, records);
impl_rrset_data!(MxRRSet, records);
impl_rrset_data!(SrvRRSet, records);
impl_rrset_data!(CaaRRSet, records);
impl_rrset_data!(TlsaRRSet, records);
impl_rrset_data!(DsRRSet, records);
impl_rrset_data!(CnameRRSet, host);
impl_rrset_data!(PtrRRSet, domain);
impl_rrset_data!(AnameRRSet, location);

impl RRSetData for SoaRRSet {
    fn ttl(&self) -> u32 {
        self.ttl
    }

    fn is_empty(&self) -> bool {
        self.ns.is_empty()
    }
}
