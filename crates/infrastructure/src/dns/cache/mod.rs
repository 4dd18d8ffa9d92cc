pub mod store;
pub mod zone;
pub mod zone_cache;

pub use store::{CacheStore, Lookup};
pub use zone::Zone;
pub use zone_cache::{RecordKey, ZoneCache};
