use crate::ports::KeyValueStore;
use redzone_domain::zone::normalize_name;
use redzone_domain::{DomainError, KeyLayout, KeyPart, KeyRole, Record, ZoneConfig};
use std::sync::Arc;
use tracing::debug;

/// Public and private halves of one DNSSEC key as stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredKey {
    /// DNSKEY presentation text
    pub public: String,
    /// BIND `Private-key-format` text
    pub private: String,
}

/// Typed access to zone data in the key/value store.
#[derive(Clone)]
pub struct ZoneDataService {
    store: Arc<dyn KeyValueStore>,
    keys: KeyLayout,
}

impl ZoneDataService {
    pub fn new(store: Arc<dyn KeyValueStore>, keys: KeyLayout) -> Self {
        Self { store, keys }
    }

    pub fn keys(&self) -> &KeyLayout {
        &self.keys
    }

    pub fn store(&self) -> &Arc<dyn KeyValueStore> {
        &self.store
    }

    /// Names of all zones this server is authoritative for.
    pub async fn zone_names(&self) -> Result<Vec<String>, DomainError> {
        let members = self.store.smembers(&self.keys.zones()).await?;
        Ok(members.iter().map(|z| normalize_name(z)).collect())
    }

    pub async fn zone_config(&self, zone: &str) -> Result<Option<ZoneConfig>, DomainError> {
        match self.store.get(&self.keys.zone_config(zone)).await? {
            Some(json) => ZoneConfig::from_json(zone, &json).map(Some),
            None => Ok(None),
        }
    }

    /// Location labels stored for `zone`.
    pub async fn labels(&self, zone: &str) -> Result<Vec<String>, DomainError> {
        let keys = self.store.scan(&self.keys.location_pattern(zone)).await?;
        Ok(keys
            .iter()
            .filter_map(|key| self.keys.label_of(zone, key))
            .map(str::to_string)
            .collect())
    }

    /// Parsed location, `None` when the key does not exist.
    pub async fn location(&self, zone: &str, label: &str) -> Result<Option<Record>, DomainError> {
        let key = self.keys.location(zone, label);
        match self.store.get(&key).await? {
            Some(json) => Record::from_json(&key, &json).map(Some),
            None => Ok(None),
        }
    }

    /// Validate and store a location's JSON.
    pub async fn set_location_from_json(
        &self,
        zone: &str,
        label: &str,
        json: &str,
    ) -> Result<(), DomainError> {
        let key = self.keys.location(zone, label);
        Record::from_json(&key, json)?;
        self.store.set(&key, json).await?;
        debug!(zone = %zone, label = %label, "Location stored");
        Ok(())
    }

    pub async fn set_location(
        &self,
        zone: &str,
        label: &str,
        record: &Record,
    ) -> Result<(), DomainError> {
        let json = record.to_json()?;
        self.store.set(&self.keys.location(zone, label), &json).await
    }

    pub async fn remove_location(&self, zone: &str, label: &str) -> Result<(), DomainError> {
        self.store.del(&self.keys.location(zone, label)).await
    }

    /// Store the zone config and add the zone to the authoritative set.
    pub async fn set_zone(&self, zone: &str, config: &ZoneConfig) -> Result<(), DomainError> {
        let zone = normalize_name(zone);
        self.store
            .set(&self.keys.zone_config(&zone), &config.to_json())
            .await?;
        self.store.sadd(&self.keys.zones(), &zone).await?;
        debug!(zone = %zone, "Zone stored");
        Ok(())
    }

    /// Remove a zone with its config, keys and locations.
    pub async fn remove_zone(&self, zone: &str) -> Result<(), DomainError> {
        let zone = normalize_name(zone);
        self.store.srem(&self.keys.zones(), &zone).await?;
        for label in self.labels(&zone).await? {
            self.store.del(&self.keys.location(&zone, &label)).await?;
        }
        for role in [KeyRole::Zsk, KeyRole::Ksk] {
            for part in [KeyPart::Public, KeyPart::Private] {
                self.store.del(&self.keys.zone_key(&zone, role, part)).await?;
            }
        }
        self.store.del(&self.keys.zone_config(&zone)).await
    }

    pub async fn set_zone_key(
        &self,
        zone: &str,
        role: KeyRole,
        key: &StoredKey,
    ) -> Result<(), DomainError> {
        self.store
            .set(&self.keys.zone_key(zone, role, KeyPart::Public), &key.public)
            .await?;
        self.store
            .set(&self.keys.zone_key(zone, role, KeyPart::Private), &key.private)
            .await
    }

    /// Both halves of a key, `None` unless both exist.
    pub async fn zone_key(
        &self,
        zone: &str,
        role: KeyRole,
    ) -> Result<Option<StoredKey>, DomainError> {
        let public = self
            .store
            .get(&self.keys.zone_key(zone, role, KeyPart::Public))
            .await?;
        let private = self
            .store
            .get(&self.keys.zone_key(zone, role, KeyPart::Private))
            .await?;
        Ok(match (public, private) {
            (Some(public), Some(private)) => Some(StoredKey { public, private }),
            _ => None,
        })
    }
}
