#![allow(dead_code)]

pub mod dns_server_mock;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use hickory_proto::op::ResponseCode;
use hickory_proto::rr::rdata::A;
use hickory_proto::rr::{Name, RData, Record, RecordType};
use redzone_application::ports::{DisabledGeoIp, KeyValueStore, KeyspaceEvent, ZoneIndex};
use redzone_application::services::{StoredKey, TrafficSteering, ZoneDataService};
use redzone_domain::config::{CacheConfig, DnssecConfig};
use redzone_domain::rrset::{IpRRSet, IpRecord};
use redzone_domain::{DomainError, KeyLayout, KeyRole, Record as Location, ZoneConfig};
use redzone_infrastructure::dns::dnssec::keys::ed25519_public_key;
use redzone_infrastructure::dns::{
    RequestContext, ResolutionEngine, UpstreamAnswer, UpstreamLookup, ZoneCache,
};
use redzone_infrastructure::store::MemoryStore;
use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr};
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

pub const ZONE: &str = "example.com.";
pub const PREFIX: &str = "redzone:";
pub const ZSK_SEED: [u8; 32] = [1u8; 32];
pub const KSK_SEED: [u8; 32] = [2u8; 32];

pub fn ip(s: &str) -> IpAddr {
    s.parse().unwrap()
}

pub fn name(s: &str) -> Name {
    Name::from_str(s).unwrap()
}

// ============================================================================
// Store
// ============================================================================

/// `MemoryStore` that counts reads and can be switched off.
#[derive(Default)]
pub struct CountingStore {
    inner: MemoryStore,
    gets: AtomicUsize,
    failing: AtomicBool,
}

impl CountingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn gets(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn check(&self) -> Result<(), DomainError> {
        if self.failing.load(Ordering::SeqCst) {
            Err(DomainError::StoreUnavailable("store switched off".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl KeyValueStore for CountingStore {
    async fn get(&self, key: &str) -> Result<Option<String>, DomainError> {
        self.check()?;
        self.gets.fetch_add(1, Ordering::SeqCst);
        // Widens the window in which concurrent misses overlap.
        tokio::time::sleep(Duration::from_millis(5)).await;
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), DomainError> {
        self.check()?;
        self.inner.set(key, value).await
    }

    async fn del(&self, key: &str) -> Result<(), DomainError> {
        self.check()?;
        self.inner.del(key).await
    }

    async fn sadd(&self, key: &str, member: &str) -> Result<(), DomainError> {
        self.check()?;
        self.inner.sadd(key, member).await
    }

    async fn srem(&self, key: &str, member: &str) -> Result<(), DomainError> {
        self.check()?;
        self.inner.srem(key, member).await
    }

    async fn smembers(&self, key: &str) -> Result<Vec<String>, DomainError> {
        self.check()?;
        self.inner.smembers(key).await
    }

    async fn scan(&self, pattern: &str) -> Result<Vec<String>, DomainError> {
        self.check()?;
        self.inner.scan(pattern).await
    }

    fn subscribe(
        &self,
        pattern: &str,
        shutdown: CancellationToken,
    ) -> mpsc::Receiver<KeyspaceEvent> {
        self.inner.subscribe(pattern, shutdown)
    }
}

// ============================================================================
// Upstream
// ============================================================================

/// Upstream resolver answering from a fixed table of A records.
#[derive(Default)]
pub struct MockUpstream {
    answers: HashMap<String, Vec<Ipv4Addr>>,
    lookups: Mutex<Vec<(String, RecordType)>>,
}

impl MockUpstream {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_a(mut self, name: &str, ips: &[&str]) -> Self {
        self.answers.insert(
            name.to_ascii_lowercase(),
            ips.iter().map(|s| s.parse().unwrap()).collect(),
        );
        self
    }

    pub fn lookups(&self) -> Vec<(String, RecordType)> {
        self.lookups.lock().unwrap().clone()
    }
}

#[async_trait]
impl UpstreamLookup for MockUpstream {
    async fn lookup(
        &self,
        name: &Name,
        record_type: RecordType,
    ) -> Result<UpstreamAnswer, DomainError> {
        let key = name.to_ascii().to_ascii_lowercase();
        self.lookups.lock().unwrap().push((key.clone(), record_type));

        let Some(ips) = self.answers.get(&key) else {
            return Ok(UpstreamAnswer {
                records: Vec::new(),
                rcode: ResponseCode::NXDomain,
            });
        };
        let records = match record_type {
            RecordType::A => ips
                .iter()
                .map(|ip| Record::from_rdata(name.clone(), 120, RData::A(A::from(*ip))))
                .collect(),
            _ => Vec::new(),
        };
        Ok(UpstreamAnswer {
            records,
            rcode: ResponseCode::NoError,
        })
    }
}

// ============================================================================
// Zone fixtures
// ============================================================================

pub fn a_set(ips: &[&str]) -> Option<IpRRSet> {
    Some(IpRRSet::new(
        300,
        ips.iter().map(|s| IpRecord::new(ip(s))).collect(),
    ))
}

pub fn location_json(json: &str) -> Location {
    Location::from_json("fixture", json).unwrap()
}

pub fn stored_key(zone: &str, seed: [u8; 32], flags: u16) -> StoredKey {
    let public = ed25519_public_key(&seed).unwrap();
    StoredKey {
        public: format!("{zone} IN DNSKEY {flags} 3 15 {}", STANDARD.encode(public)),
        private: format!(
            "Private-key-format: v1.3\nAlgorithm: 15 (ED25519)\nPrivateKey: {}\n",
            STANDARD.encode(seed)
        ),
    }
}

/// Zone data builder writing straight into the store.
pub struct ZoneFixture {
    pub store: Arc<CountingStore>,
    pub data: ZoneDataService,
}

impl ZoneFixture {
    pub fn new() -> Self {
        let store = Arc::new(CountingStore::new());
        let data = ZoneDataService::new(store.clone(), KeyLayout::new(PREFIX));
        Self { store, data }
    }

    pub async fn zone(self, zone: &str, config: ZoneConfig) -> Self {
        self.data.set_zone(zone, &config).await.unwrap();
        self
    }

    pub async fn signed_zone(self, zone: &str) -> Self {
        let config = ZoneConfig {
            dnssec: true,
            ..ZoneConfig::default()
        };
        self.data.set_zone(zone, &config).await.unwrap();
        self.data
            .set_zone_key(zone, KeyRole::Zsk, &stored_key(zone, ZSK_SEED, 256))
            .await
            .unwrap();
        self.data
            .set_zone_key(zone, KeyRole::Ksk, &stored_key(zone, KSK_SEED, 257))
            .await
            .unwrap();
        self
    }

    pub async fn location(self, zone: &str, label: &str, record: Location) -> Self {
        self.data.set_location(zone, label, &record).await.unwrap();
        self
    }

    pub async fn json(self, zone: &str, label: &str, json: &str) -> Self {
        self.data
            .set_location_from_json(zone, label, json)
            .await
            .unwrap();
        self
    }

    /// Cache with the zone list already loaded.
    pub async fn cache(&self) -> Arc<ZoneCache> {
        self.cache_with(CacheConfig::default()).await
    }

    pub async fn cache_with(&self, config: CacheConfig) -> Arc<ZoneCache> {
        let cache = Arc::new(ZoneCache::new(
            self.data.clone(),
            &config,
            DnssecConfig::default(),
        ));
        cache.reload_zone_list().await.unwrap();
        cache
    }
}

pub async fn engine(fixture: &ZoneFixture, upstream: Arc<dyn UpstreamLookup>) -> ResolutionEngine {
    let steering = TrafficSteering::new(Arc::new(DisabledGeoIp));
    ResolutionEngine::new(fixture.cache().await, steering, upstream, 10)
}

pub fn query(qname: &str, qtype: RecordType) -> RequestContext {
    RequestContext::new(name(qname), qtype, ip("198.51.100.1"))
}

/// IPv4 addresses of the A records in `records`.
pub fn a_addresses(records: &[Record]) -> Vec<Ipv4Addr> {
    records
        .iter()
        .filter_map(|r| match r.data() {
            Some(RData::A(a)) => Some(a.0),
            _ => None,
        })
        .collect()
}

pub fn types_of(records: &[Record]) -> Vec<RecordType> {
    records.iter().map(|r| r.record_type()).collect()
}
