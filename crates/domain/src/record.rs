use crate::rrset::{
    AnameRRSet, CaaRRSet, CnameRRSet, DsRRSet, IpRRSet, MxRRSet, NsRRSet, PtrRRSet, RRSetData,
    RRSetType, SoaRRSet, SrvRRSet, TlsaRRSet, TxtRRSet,
};
use crate::DomainError;
use serde::{Deserialize, Serialize};

/// All RRSets stored at one location of a zone.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub a: Option<IpRRSet>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aaaa: Option<IpRRSet>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cname: Option<CnameRRSet>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub txt: Option<TxtRRSet>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ns: Option<NsRRSet>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mx: Option<MxRRSet>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub srv: Option<SrvRRSet>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caa: Option<CaaRRSet>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ptr: Option<PtrRRSet>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tlsa: Option<TlsaRRSet>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ds: Option<DsRRSet>,
    /// Filled from the zone config for the apex
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub soa: Option<SoaRRSet>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aname: Option<AnameRRSet>,
}

fn populated<T: RRSetData>(slot: &Option<T>) -> bool {
    slot.as_ref().is_some_and(|s| !s.is_empty())
}

impl Record {
    pub fn from_json(key: &str, json: &str) -> Result<Self, DomainError> {
        serde_json::from_str(json).map_err(|e| DomainError::InvalidRecordJson {
            key: key.to_string(),
            reason: e.to_string(),
        })
    }

    pub fn to_json(&self) -> Result<String, DomainError> {
        serde_json::to_string(self).map_err(|e| DomainError::InvalidRecordJson {
            key: String::new(),
            reason: e.to_string(),
        })
    }

    /// Whether the slot for `kind` holds at least one record.
    pub fn has(&self, kind: RRSetType) -> bool {
        match kind {
            RRSetType::A => populated(&self.a),
            RRSetType::Aaaa => populated(&self.aaaa),
            RRSetType::Cname => populated(&self.cname),
            RRSetType::Txt => populated(&self.txt),
            RRSetType::Ns => populated(&self.ns),
            RRSetType::Mx => populated(&self.mx),
            RRSetType::Srv => populated(&self.srv),
            RRSetType::Caa => populated(&self.caa),
            RRSetType::Ptr => populated(&self.ptr),
            RRSetType::Tlsa => populated(&self.tlsa),
            RRSetType::Ds => populated(&self.ds),
            RRSetType::Soa => populated(&self.soa),
            RRSetType::Aname => populated(&self.aname),
        }
    }

    pub fn is_empty(&self) -> bool {
        RRSetType::ALL.iter().all(|t| !self.has(*t))
    }

    /// CNAME target, when this location is an alias.
    pub fn cname_target(&self) -> Option<&str> {
        self.cname
            .as_ref()
            .filter(|c| !c.is_empty())
            .map(|c| c.host.as_str())
    }

    pub fn ns_hosts(&self) -> impl Iterator<Item = &str> {
        self.ns
            .iter()
            .flat_map(|ns| ns.records.iter().map(|r| r.host.as_str()))
    }
}
