use crate::dns::dnssec::ZoneKeys;
use hickory_proto::rr::Name;
use redzone_domain::{LocationMatch, LocationMatcher, ZoneConfig};
use rustc_hash::FxHashMap;

/// Immutable snapshot of one zone: config, location index and keys.
#[derive(Debug)]
pub struct Zone {
    pub name: String,
    pub origin: Name,
    pub config: ZoneConfig,
    pub matcher: LocationMatcher,
    /// Lowercased label → label as written in the store
    labels: FxHashMap<String, String>,
    pub keys: Option<ZoneKeys>,
}

impl Zone {
    pub fn new(
        name: String,
        origin: Name,
        config: ZoneConfig,
        labels: Vec<String>,
        keys: Option<ZoneKeys>,
    ) -> Self {
        let matcher = LocationMatcher::from_labels(&labels);
        let labels = labels
            .into_iter()
            .map(|label| (label.to_ascii_lowercase(), label))
            .collect();
        Self {
            name,
            origin,
            config,
            matcher,
            labels,
            keys,
        }
    }

    pub fn find_location(&self, relative: &str) -> LocationMatch {
        self.matcher.find_location(relative)
    }

    /// Store spelling of a matched label.
    pub fn stored_label<'a>(&'a self, label: &'a str) -> &'a str {
        self.labels.get(label).map(String::as_str).unwrap_or(label)
    }

    pub fn has_label(&self, label: &str) -> bool {
        self.labels.contains_key(&label.to_ascii_lowercase())
    }

    pub fn signing_keys(&self) -> Option<&ZoneKeys> {
        self.keys.as_ref()
    }
}
