use std::net::IpAddr;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GeoIpError {
    /// No database configured for this attribute
    #[error("GeoIP lookup disabled")]
    Disabled,

    #[error("No GeoIP data for {0}")]
    NotFound(IpAddr),

    #[error("GeoIP lookup failed: {0}")]
    Lookup(String),
}

/// Geographic attributes of an address.
///
/// Every failure, including a disabled database, is reported as an error
/// so that steering can fall back to permissive selection.
pub trait GeoIpLookup: Send + Sync {
    /// ISO 3166 country code, uppercase.
    fn country(&self, ip: IpAddr) -> Result<String, GeoIpError>;

    fn asn(&self, ip: IpAddr) -> Result<u32, GeoIpError>;

    /// `(latitude, longitude)` in degrees.
    fn coordinates(&self, ip: IpAddr) -> Result<(f64, f64), GeoIpError>;
}

/// Lookup used when no GeoIP database is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledGeoIp;

impl GeoIpLookup for DisabledGeoIp {
    fn country(&self, _ip: IpAddr) -> Result<String, GeoIpError> {
        Err(GeoIpError::Disabled)
    }

    fn asn(&self, _ip: IpAddr) -> Result<u32, GeoIpError> {
        Err(GeoIpError::Disabled)
    }

    fn coordinates(&self, _ip: IpAddr) -> Result<(f64, f64), GeoIpError> {
        Err(GeoIpError::Disabled)
    }
}
