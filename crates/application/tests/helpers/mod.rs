#![allow(dead_code)]

use async_trait::async_trait;
use redzone_application::ports::{
    GeoIpError, GeoIpLookup, HealthStatusLookup, KeyValueStore, KeyspaceEvent,
};
use redzone_domain::DomainError;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::net::IpAddr;
use std::sync::{Arc, Mutex, RwLock};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

// ============================================================================
// GeoIP
// ============================================================================

#[derive(Default)]
pub struct MockGeoIp {
    countries: HashMap<IpAddr, String>,
    asns: HashMap<IpAddr, u32>,
    coordinates: HashMap<IpAddr, (f64, f64)>,
}

impl MockGeoIp {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_country(mut self, ip: &str, country: &str) -> Self {
        self.countries.insert(ip.parse().unwrap(), country.to_string());
        self
    }

    pub fn with_asn(mut self, ip: &str, asn: u32) -> Self {
        self.asns.insert(ip.parse().unwrap(), asn);
        self
    }

    pub fn with_coordinates(mut self, ip: &str, lat: f64, lon: f64) -> Self {
        self.coordinates.insert(ip.parse().unwrap(), (lat, lon));
        self
    }
}

impl GeoIpLookup for MockGeoIp {
    fn country(&self, ip: IpAddr) -> Result<String, GeoIpError> {
        self.countries.get(&ip).cloned().ok_or(GeoIpError::NotFound(ip))
    }

    fn asn(&self, ip: IpAddr) -> Result<u32, GeoIpError> {
        self.asns.get(&ip).copied().ok_or(GeoIpError::NotFound(ip))
    }

    fn coordinates(&self, ip: IpAddr) -> Result<(f64, f64), GeoIpError> {
        self.coordinates.get(&ip).copied().ok_or(GeoIpError::NotFound(ip))
    }
}

// ============================================================================
// Health status
// ============================================================================

#[derive(Default)]
pub struct MockHealthStatus {
    scores: HashMap<IpAddr, i32>,
}

impl MockHealthStatus {
    pub fn with_score(mut self, ip: &str, score: i32) -> Self {
        self.scores.insert(ip.parse().unwrap(), score);
        self
    }
}

impl HealthStatusLookup for MockHealthStatus {
    fn health_status(&self, _fqdn: &str, ip: IpAddr) -> i32 {
        self.scores.get(&ip).copied().unwrap_or(0)
    }
}

// ============================================================================
// Key/value store
// ============================================================================

#[derive(Default)]
pub struct MockKeyValueStore {
    values: Arc<RwLock<BTreeMap<String, String>>>,
    sets: Arc<RwLock<HashMap<String, BTreeSet<String>>>>,
    fail: Arc<Mutex<bool>>,
}

impl MockKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_failing(&self, fail: bool) {
        *self.fail.lock().unwrap() = fail;
    }

    pub fn keys(&self) -> Vec<String> {
        self.values.read().unwrap().keys().cloned().collect()
    }

    fn check(&self) -> Result<(), DomainError> {
        if *self.fail.lock().unwrap() {
            Err(DomainError::StoreUnavailable("mock store down".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl KeyValueStore for MockKeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<String>, DomainError> {
        self.check()?;
        Ok(self.values.read().unwrap().get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), DomainError> {
        self.check()?;
        self.values
            .write()
            .unwrap()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn del(&self, key: &str) -> Result<(), DomainError> {
        self.check()?;
        self.values.write().unwrap().remove(key);
        self.sets.write().unwrap().remove(key);
        Ok(())
    }

    async fn sadd(&self, key: &str, member: &str) -> Result<(), DomainError> {
        self.check()?;
        self.sets
            .write()
            .unwrap()
            .entry(key.to_string())
            .or_default()
            .insert(member.to_string());
        Ok(())
    }

    async fn srem(&self, key: &str, member: &str) -> Result<(), DomainError> {
        self.check()?;
        if let Some(set) = self.sets.write().unwrap().get_mut(key) {
            set.remove(member);
        }
        Ok(())
    }

    async fn smembers(&self, key: &str) -> Result<Vec<String>, DomainError> {
        self.check()?;
        Ok(self
            .sets
            .read()
            .unwrap()
            .get(key)
            .map(|s| s.iter().cloned().collect())
            .unwrap_or_default())
    }

    async fn scan(&self, pattern: &str) -> Result<Vec<String>, DomainError> {
        self.check()?;
        let prefix = pattern.trim_end_matches('*');
        Ok(self
            .values
            .read()
            .unwrap()
            .keys()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect())
    }

    fn subscribe(
        &self,
        _pattern: &str,
        _shutdown: CancellationToken,
    ) -> mpsc::Receiver<KeyspaceEvent> {
        let (_tx, rx) = mpsc::channel(1);
        rx
    }
}

// ============================================================================
// Fixtures
// ============================================================================

pub fn ip(addr: &str) -> IpAddr {
    addr.parse().unwrap()
}
