use maxminddb::{geoip2, Reader};
use redzone_application::ports::{GeoIpError, GeoIpLookup};
use redzone_domain::config::GeoIpConfig;
use redzone_domain::DomainError;
use std::net::IpAddr;
use std::path::Path;
use tracing::info;

/// MaxMind GeoLite2 databases. Each attribute reads its own database and
/// reports `Disabled` when that database is not configured.
pub struct MaxMindGeoIp {
    country: Option<Reader<Vec<u8>>>,
    asn: Option<Reader<Vec<u8>>>,
    city: Option<Reader<Vec<u8>>>,
}

fn open_reader(path: Option<&str>) -> Result<Option<Reader<Vec<u8>>>, DomainError> {
    let Some(path) = path else {
        return Ok(None);
    };
    if !Path::new(path).exists() {
        return Err(DomainError::IoError(format!("GeoIP database not found: {path}")));
    }
    let reader = Reader::open_readfile(path)
        .map_err(|e| DomainError::IoError(format!("Failed to open {path}: {e}")))?;
    info!(path = %path, "GeoIP database loaded");
    Ok(Some(reader))
}

fn lookup_error(ip: IpAddr, e: maxminddb::MaxMindDBError) -> GeoIpError {
    match e {
        maxminddb::MaxMindDBError::AddressNotFoundError(_) => GeoIpError::NotFound(ip),
        other => GeoIpError::Lookup(other.to_string()),
    }
}

impl MaxMindGeoIp {
    pub fn open(config: &GeoIpConfig) -> Result<Self, DomainError> {
        Ok(Self {
            country: open_reader(config.country_db.as_deref())?,
            asn: open_reader(config.asn_db.as_deref())?,
            city: open_reader(config.city_db.as_deref())?,
        })
    }
}

impl GeoIpLookup for MaxMindGeoIp {
    fn country(&self, ip: IpAddr) -> Result<String, GeoIpError> {
        let reader = self.country.as_ref().ok_or(GeoIpError::Disabled)?;
        let record: geoip2::Country = reader.lookup(ip).map_err(|e| lookup_error(ip, e))?;
        record
            .country
            .and_then(|c| c.iso_code)
            .map(|code| code.to_ascii_uppercase())
            .ok_or(GeoIpError::NotFound(ip))
    }

    fn asn(&self, ip: IpAddr) -> Result<u32, GeoIpError> {
        let reader = self.asn.as_ref().ok_or(GeoIpError::Disabled)?;
        let record: geoip2::Asn = reader.lookup(ip).map_err(|e| lookup_error(ip, e))?;
        record
            .autonomous_system_number
            .ok_or(GeoIpError::NotFound(ip))
    }

    fn coordinates(&self, ip: IpAddr) -> Result<(f64, f64), GeoIpError> {
        let reader = self.city.as_ref().ok_or(GeoIpError::Disabled)?;
        let record: geoip2::City = reader.lookup(ip).map_err(|e| lookup_error(ip, e))?;
        let location = record.location.ok_or(GeoIpError::NotFound(ip))?;
        match (location.latitude, location.longitude) {
            (Some(lat), Some(lon)) => Ok((lat, lon)),
            _ => Err(GeoIpError::NotFound(ip)),
        }
    }
}
