pub mod cache;
pub mod dnssec;
pub mod edns;
pub mod events;
pub mod handler;
pub mod records;
pub mod resolution;
pub mod server;
pub mod single_flight;
pub mod transport;
pub mod upstream;

pub use cache::{RecordKey, Zone, ZoneCache};
pub use events::{QueryEvent, QueryEventEmitter, QueryLogger};
pub use handler::{DnsHandler, Protocol};
pub use resolution::{RequestContext, Resolution, ResolutionEngine};
pub use server::DnsServer;
pub use upstream::{UpstreamAnswer, UpstreamLookup, UpstreamResolver};
