use super::store::{CacheStore, Lookup};
use super::zone::Zone;
use crate::dns::dnssec::{unix_now, ZoneKeys};
use crate::dns::single_flight::SingleFlight;
use arc_swap::ArcSwap;
use async_trait::async_trait;
use hickory_proto::rr::Name;
use redzone_application::ports::{KeyspaceEvent, ZoneIndex};
use redzone_application::services::ZoneDataService;
use redzone_domain::config::{CacheConfig, DnssecConfig};
use redzone_domain::zone::APEX_LABEL;
use redzone_domain::{DomainError, KeyRole, KeyTarget, Record};
use rustc_hash::FxHashSet;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RecordKey {
    pub zone: String,
    pub label: String,
}

impl RecordKey {
    pub fn new(zone: &str, label: &str) -> Self {
        Self {
            zone: zone.to_string(),
            label: label.to_string(),
        }
    }
}

type ZoneResult = Result<Arc<Zone>, DomainError>;
type RecordResult = Result<Arc<Record>, DomainError>;

/// Read-through cache of zones and locations over the zone store.
///
/// Both maps hold `Arc` snapshots; a read never observes a partially
/// updated value. Misses and expired entries are refetched through a
/// single flight per key, and a store failure falls back to the expired
/// value when one is still held.
pub struct ZoneCache {
    data: ZoneDataService,
    zones: CacheStore<String, Zone>,
    records: CacheStore<RecordKey, Record>,
    zone_flight: SingleFlight<String, ZoneResult>,
    record_flight: SingleFlight<RecordKey, RecordResult>,
    zone_names: ArcSwap<FxHashSet<String>>,
    zone_list_dirty: AtomicBool,
    dnssec: DnssecConfig,
}

impl ZoneCache {
    pub fn new(data: ZoneDataService, config: &CacheConfig, dnssec: DnssecConfig) -> Self {
        Self {
            data,
            zones: CacheStore::new(
                config.zone_cache_size,
                Duration::from_secs(config.zone_ttl_secs),
            ),
            records: CacheStore::new(
                config.record_cache_size,
                Duration::from_secs(config.record_ttl_secs),
            ),
            zone_flight: SingleFlight::new(),
            record_flight: SingleFlight::new(),
            zone_names: ArcSwap::from_pointee(FxHashSet::default()),
            zone_list_dirty: AtomicBool::new(true),
            dnssec,
        }
    }

    pub fn data(&self) -> &ZoneDataService {
        &self.data
    }

    /// Longest zone suffix of the normalized `qname`.
    pub fn find_zone(&self, qname: &str) -> Option<String> {
        let names = self.zone_names.load();
        let mut candidate = qname;
        loop {
            if names.contains(candidate) {
                return Some(candidate.to_string());
            }
            match candidate.split_once('.') {
                Some((_, rest)) if !rest.is_empty() => candidate = rest,
                _ => break,
            }
        }
        names.contains(".").then(|| ".".to_string())
    }

    pub fn zone_count(&self) -> usize {
        self.zone_names.load().len()
    }

    pub fn cached_zones(&self) -> usize {
        self.zones.len()
    }

    pub fn cached_records(&self) -> usize {
        self.records.len()
    }

    pub async fn get_zone(&self, name: &str) -> ZoneResult {
        let key = name.to_string();
        let stale = match self.zones.lookup(&key) {
            Lookup::Fresh(zone) => return Ok(zone),
            Lookup::Stale(zone) => Some(zone),
            Lookup::Miss => None,
        };

        let result = self
            .zone_flight
            .run(key.clone(), || self.load_zone(key.clone()))
            .await;

        match (result, stale) {
            (Ok(zone), _) => Ok(zone),
            (Err(e), Some(zone)) if e.is_store_failure() => {
                warn!(zone = %name, error = %e, "Store unavailable, serving stale zone");
                Ok(zone)
            }
            (Err(e), _) => Err(e),
        }
    }

    /// Location `label` of `zone`. A missing apex is an empty record with
    /// the zone SOA; any other missing label is an error.
    pub async fn get_location(&self, zone: &Zone, label: &str) -> RecordResult {
        let key = RecordKey::new(&zone.name, zone.stored_label(label));
        let stale = match self.records.lookup(&key) {
            Lookup::Fresh(record) => return Ok(record),
            Lookup::Stale(record) => Some(record),
            Lookup::Miss => None,
        };

        let result = self
            .record_flight
            .run(key.clone(), || self.load_location(zone, key.clone()))
            .await;

        match (result, stale) {
            (Ok(record), _) => Ok(record),
            (Err(e), Some(record)) if e.is_store_failure() => {
                warn!(zone = %key.zone, label = %key.label, error = %e, "Store unavailable, serving stale location");
                Ok(record)
            }
            (Err(e), _) => Err(e),
        }
    }

    async fn load_zone(&self, name: String) -> ZoneResult {
        let config = self
            .data
            .zone_config(&name)
            .await?
            .ok_or_else(|| DomainError::ZoneNotFound(name.clone()))?;
        let labels = self.data.labels(&name).await?;
        let origin = Name::from_str(&name)
            .map_err(|e| DomainError::InvalidDomainName(format!("{name}: {e}")))?;

        let keys = if config.dnssec {
            self.load_keys(&name).await
        } else {
            None
        };

        debug!(zone = %name, locations = labels.len(), signed = keys.is_some(), "Zone loaded");
        let zone = Arc::new(Zone::new(name.clone(), origin, config, labels, keys));
        self.zones.insert(name, zone.clone());
        Ok(zone)
    }

    /// A zone with unusable keys is still served, unsigned.
    async fn load_keys(&self, zone: &str) -> Option<ZoneKeys> {
        let stored = async {
            let zsk = self.data.zone_key(zone, KeyRole::Zsk).await?;
            let ksk = self.data.zone_key(zone, KeyRole::Ksk).await?;
            Ok::<_, DomainError>(zsk.zip(ksk))
        };

        match stored.await {
            Ok(Some((zsk, ksk))) => {
                match ZoneKeys::load(zone, &zsk, &ksk, &self.dnssec, unix_now()) {
                    Ok(keys) => Some(keys),
                    Err(e) => {
                        error!(zone = %zone, error = %e, "Failed to load DNSSEC keys");
                        None
                    }
                }
            }
            Ok(None) => {
                error!(zone = %zone, "DNSSEC enabled but zone keys are missing");
                None
            }
            Err(e) => {
                error!(zone = %zone, error = %e, "Failed to fetch DNSSEC keys");
                None
            }
        }
    }

    async fn load_location(&self, zone: &Zone, key: RecordKey) -> RecordResult {
        let fetched = self.data.location(&key.zone, &key.label).await?;
        let mut record = match fetched {
            Some(record) => record,
            None if key.label == APEX_LABEL => Record::default(),
            None => {
                return Err(DomainError::LocationNotFound {
                    zone: key.zone.clone(),
                    label: key.label.clone(),
                })
            }
        };
        if key.label == APEX_LABEL {
            record.soa = Some(zone.config.soa.clone());
        }

        let record = Arc::new(record);
        self.records.insert(key, record.clone());
        Ok(record)
    }
}

#[async_trait]
impl ZoneIndex for ZoneCache {
    fn apply_event(&self, event: &KeyspaceEvent) {
        let Some(target) = self.data.keys().parse(&event.key) else {
            return;
        };

        match target {
            KeyTarget::ZoneList => self.mark_zone_list_dirty(),
            KeyTarget::ZoneConfig { zone } => {
                // The apex record carries the SOA of the config.
                self.records.remove(&RecordKey::new(&zone, APEX_LABEL));
                if self.zones.remove(&zone) {
                    debug!(zone = %zone, "Zone evicted");
                }
            }
            KeyTarget::ZoneKey { zone } => {
                if self.zones.remove(&zone) {
                    debug!(zone = %zone, "Zone evicted");
                }
            }
            KeyTarget::Location { zone, label } => {
                self.records.remove(&RecordKey::new(&zone, &label));
                // The label set of the zone changes on create and delete.
                let known = self.zones.peek(&zone).map(|z| z.has_label(&label));
                if event.is_removal() || known == Some(false) {
                    self.zones.remove(&zone);
                }
                debug!(zone = %zone, label = %label, operation = %event.operation, "Location evicted");
            }
        }
    }

    fn mark_zone_list_dirty(&self) {
        self.zone_list_dirty.store(true, Ordering::Release);
    }

    fn take_zone_list_dirty(&self) -> bool {
        self.zone_list_dirty.swap(false, Ordering::AcqRel)
    }

    async fn reload_zone_list(&self) -> Result<usize, DomainError> {
        let names: FxHashSet<String> = match self.data.zone_names().await {
            Ok(names) => names.into_iter().collect(),
            Err(e) => {
                // Retry on the next tick.
                self.mark_zone_list_dirty();
                return Err(e);
            }
        };

        self.zones.retain(|zone| names.contains(zone));
        self.records.retain(|key| names.contains(&key.zone));

        let count = names.len();
        self.zone_names.store(Arc::new(names));
        info!(zones = count, "Zone list reloaded");
        Ok(count)
    }
}
