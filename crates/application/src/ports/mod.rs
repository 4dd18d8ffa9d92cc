pub mod geoip;
pub mod health_status;
pub mod key_value_store;
pub mod zone_index;

pub use geoip::{DisabledGeoIp, GeoIpError, GeoIpLookup};
pub use health_status::HealthStatusLookup;
pub use key_value_store::{KeyValueStore, KeyspaceEvent};
pub use zone_index::ZoneIndex;
