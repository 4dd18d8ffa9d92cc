use anyhow::Context;
use redzone_application::ports::KeyValueStore;
use redzone_application::services::{StoredKey, ZoneDataService};
use redzone_domain::{Config, KeyLayout, KeyRole, ZoneConfig};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// One zone in a seed file. Locations stay raw JSON so they are validated
/// by the same parser the resolver reads them with.
#[derive(Debug, Deserialize)]
struct SeedZone {
    #[serde(default)]
    config: ZoneConfig,
    #[serde(default)]
    locations: BTreeMap<String, serde_json::Value>,
    #[serde(default)]
    keys: Option<SeedKeys>,
}

#[derive(Debug, Deserialize)]
struct SeedKeys {
    zsk: SeedKey,
    ksk: SeedKey,
}

#[derive(Debug, Deserialize)]
struct SeedKey {
    public: String,
    private: String,
}

impl From<SeedKey> for StoredKey {
    fn from(key: SeedKey) -> Self {
        StoredKey {
            public: key.public,
            private: key.private,
        }
    }
}

/// Write every zone of the JSON file at `path` into the store.
///
/// The file maps zone names to `{config, locations, keys}`.
pub async fn seed_zones(
    store: Arc<dyn KeyValueStore>,
    config: &Config,
    path: &Path,
) -> anyhow::Result<()> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading seed file {}", path.display()))?;
    let zones: BTreeMap<String, SeedZone> = serde_json::from_str(&content)
        .with_context(|| format!("parsing seed file {}", path.display()))?;

    let data = ZoneDataService::new(store, KeyLayout::new(&config.store.prefix));

    for (zone, seed) in zones {
        data.set_zone(&zone, &seed.config).await?;
        for (label, location) in &seed.locations {
            data.set_location_from_json(&zone, label, &location.to_string())
                .await?;
        }
        if let Some(keys) = seed.keys {
            data.set_zone_key(&zone, KeyRole::Zsk, &keys.zsk.into()).await?;
            data.set_zone_key(&zone, KeyRole::Ksk, &keys.ksk.into()).await?;
        }
        info!(zone = %zone, locations = seed.locations.len(), "Zone seeded");
    }

    Ok(())
}
