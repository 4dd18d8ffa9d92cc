use std::net::IpAddr;

/// Scores published by the health-check subsystem. Positive scores count
/// consecutive successful probes, negative ones consecutive failures.
pub trait HealthStatusLookup: Send + Sync {
    fn health_status(&self, fqdn: &str, ip: IpAddr) -> i32;
}
