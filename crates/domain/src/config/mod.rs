//! Configuration module for Redzone
//!
//! This module contains all configuration structures organized by domain:
//! - `root`: Main configuration and CLI overrides
//! - `server`: Listener ports and binding
//! - `store`: Backing key/value store connection and key namespace
//! - `cache`: Zone/record cache sizing and reload cadence
//! - `resolver`: Resolution loop and query log settings
//! - `upstream`: Upstream servers used for ANAME and flattened CNAME targets
//! - `dnssec`: Signature validity window
//! - `geoip`: GeoIP database paths
//! - `cookie`: DNS Cookies (RFC 7873)
//! - `logging`: Logging settings
//! - `errors`: Configuration errors

pub mod cache;
pub mod cookie;
pub mod dnssec;
pub mod errors;
pub mod geoip;
pub mod logging;
pub mod resolver;
pub mod root;
pub mod server;
pub mod store;
pub mod upstream;

pub use cache::CacheConfig;
pub use cookie::CookieConfig;
pub use dnssec::DnssecConfig;
pub use errors::ConfigError;
pub use geoip::GeoIpConfig;
pub use logging::{LogFormat, LoggingConfig};
pub use resolver::ResolverConfig;
pub use root::{CliOverrides, Config};
pub use server::ServerConfig;
pub use store::{StoreBackend, StoreConfig};
pub use upstream::{UpstreamConfig, UpstreamProtocol, UpstreamServerConfig};
