use hickory_proto::op::ResponseCode;
use hickory_proto::rr::RecordType;
use std::net::IpAddr;
use std::sync::Arc;

/// One answered question.
#[derive(Debug, Clone)]
pub struct QueryEvent {
    /// Zone that answered, `None` when not authoritative
    pub zone: Option<Arc<str>>,

    pub name: Arc<str>,

    pub record_type: RecordType,

    pub rcode: ResponseCode,

    /// Time from receiving the request to having the response, in microseconds
    pub process_time_us: u64,

    /// Steering source (client subnet or peer address)
    pub source: IpAddr,

    pub country: Option<String>,

    pub asn: Option<u32>,

    /// "udp" or "tcp"
    pub protocol: &'static str,
}

impl QueryEvent {
    pub fn process_time_ms(&self) -> f64 {
        self.process_time_us as f64 / 1000.0
    }
}
