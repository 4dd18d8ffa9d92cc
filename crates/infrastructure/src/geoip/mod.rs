#[cfg(feature = "geoip")]
pub mod maxmind;

#[cfg(feature = "geoip")]
pub use maxmind::MaxMindGeoIp;

use redzone_application::ports::{DisabledGeoIp, GeoIpLookup};
use redzone_domain::config::GeoIpConfig;
use redzone_domain::DomainError;
use std::sync::Arc;
use tracing::info;

/// GeoIP collaborator selected by `config`. Falls back to the disabled
/// lookup when GeoIP is turned off or the feature is not compiled in.
pub fn build_geoip(config: &GeoIpConfig) -> Result<Arc<dyn GeoIpLookup>, DomainError> {
    if !config.enabled {
        info!("GeoIP disabled");
        return Ok(Arc::new(DisabledGeoIp));
    }

    #[cfg(feature = "geoip")]
    {
        let lookup = MaxMindGeoIp::open(config)?;
        Ok(Arc::new(lookup))
    }

    #[cfg(not(feature = "geoip"))]
    {
        tracing::warn!("GeoIP requested but the geoip feature is not enabled");
        Ok(Arc::new(DisabledGeoIp))
    }
}
