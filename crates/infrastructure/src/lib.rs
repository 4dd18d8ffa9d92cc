//! Redzone Infrastructure Layer
pub mod dns;
pub mod geoip;
pub mod store;
