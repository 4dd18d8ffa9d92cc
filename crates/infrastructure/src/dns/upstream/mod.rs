pub mod resolver;

pub use resolver::UpstreamResolver;

use async_trait::async_trait;
use hickory_proto::op::ResponseCode;
use hickory_proto::rr::{Name, Record, RecordType};
use redzone_domain::DomainError;

/// Answer section and rcode of an upstream exchange.
#[derive(Debug, Clone)]
pub struct UpstreamAnswer {
    pub records: Vec<Record>,
    pub rcode: ResponseCode,
}

impl UpstreamAnswer {
    /// Answers of `record_type`, skipping any CNAME chain in front.
    pub fn of_type(&self, record_type: RecordType) -> impl Iterator<Item = &Record> {
        self.records
            .iter()
            .filter(move |r| r.record_type() == record_type)
    }
}

/// Resolution of names outside the authoritative data (ANAME and flattened
/// CNAME targets).
#[async_trait]
pub trait UpstreamLookup: Send + Sync {
    async fn lookup(&self, name: &Name, record_type: RecordType)
        -> Result<UpstreamAnswer, DomainError>;
}
