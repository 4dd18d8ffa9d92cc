use hickory_proto::op::ResponseCode;
use hickory_proto::rr::{Name, Record, RecordType};
use std::net::IpAddr;

/// What the resolution engine needs to know about one question.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub qname: Name,
    pub qtype: RecordType,
    /// Steering source: the client subnet when announced, else the peer
    pub source: IpAddr,
    pub dnssec_ok: bool,
}

impl RequestContext {
    pub fn new(qname: Name, qtype: RecordType, source: IpAddr) -> Self {
        Self {
            qname,
            qtype,
            source,
            dnssec_ok: false,
        }
    }

    pub fn with_dnssec_ok(mut self, dnssec_ok: bool) -> Self {
        self.dnssec_ok = dnssec_ok;
        self
    }
}

/// Sections and flags of an authoritative answer.
#[derive(Debug, Clone)]
pub struct Resolution {
    pub zone: Option<String>,
    pub rcode: ResponseCode,
    pub authoritative: bool,
    pub answers: Vec<Record>,
    pub authority: Vec<Record>,
    pub additional: Vec<Record>,
}

impl Resolution {
    pub fn new(zone: Option<String>) -> Self {
        Self {
            zone,
            rcode: ResponseCode::NoError,
            authoritative: true,
            answers: Vec::new(),
            authority: Vec::new(),
            additional: Vec::new(),
        }
    }

    pub fn not_authoritative() -> Self {
        Self {
            rcode: ResponseCode::NotAuth,
            authoritative: false,
            ..Self::new(None)
        }
    }

    /// SERVFAIL with every section cleared.
    pub fn server_failure(zone: Option<String>) -> Self {
        Self {
            rcode: ResponseCode::ServFail,
            authoritative: false,
            ..Self::new(zone)
        }
    }
}
