pub mod traffic_steering;
pub mod zone_data;

pub use traffic_steering::{haversine_distance, order_ips, TrafficSteering};
pub use zone_data::{StoredKey, ZoneDataService};
