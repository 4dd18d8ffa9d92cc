//! Key namespace of zone data in the backing store.
//!
//! ```text
//! <prefix>zones                              set of zone names
//! <prefix>zones:<zone>:config                zone config JSON
//! <prefix>zones:<zone>:labels:<label>        location JSON
//! <prefix>zones:<zone>:{zsk|ksk}:{pub|priv}  DNSSEC key material
//! ```

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyRole {
    Zsk,
    Ksk,
}

impl KeyRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Zsk => "zsk",
            Self::Ksk => "ksk",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyPart {
    Public,
    Private,
}

impl KeyPart {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Public => "pub",
            Self::Private => "priv",
        }
    }
}

/// What a changed key refers to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyTarget {
    ZoneList,
    ZoneConfig { zone: String },
    ZoneKey { zone: String },
    Location { zone: String, label: String },
}

#[derive(Debug, Clone)]
pub struct KeyLayout {
    prefix: String,
}

impl KeyLayout {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn zones(&self) -> String {
        format!("{}zones", self.prefix)
    }

    pub fn zone_config(&self, zone: &str) -> String {
        format!("{}zones:{}:config", self.prefix, zone)
    }

    pub fn location(&self, zone: &str, label: &str) -> String {
        format!("{}zones:{}:labels:{}", self.prefix, zone, label)
    }

    /// Glob matching every location key of `zone`.
    pub fn location_pattern(&self, zone: &str) -> String {
        format!("{}zones:{}:labels:*", self.prefix, zone)
    }

    pub fn zone_key(&self, zone: &str, role: KeyRole, part: KeyPart) -> String {
        format!(
            "{}zones:{}:{}:{}",
            self.prefix,
            zone,
            role.as_str(),
            part.as_str()
        )
    }

    /// Glob for membership changes of the zone set.
    pub fn zone_list_pattern(&self) -> String {
        self.zones()
    }

    /// Glob for per-zone config, key and location changes.
    pub fn zone_data_pattern(&self) -> String {
        format!("{}zones:*", self.prefix)
    }

    /// Label of a location key belonging to `zone`.
    pub fn label_of<'a>(&self, zone: &str, key: &'a str) -> Option<&'a str> {
        let head = format!("{}zones:{}:labels:", self.prefix, zone);
        key.strip_prefix(head.as_str())
    }

    pub fn parse(&self, key: &str) -> Option<KeyTarget> {
        let rest = key.strip_prefix(self.prefix.as_str())?;
        if rest == "zones" {
            return Some(KeyTarget::ZoneList);
        }
        let rest = rest.strip_prefix("zones:")?;
        let (zone, tail) = rest.split_once(':')?;
        let zone = zone.to_string();
        match tail {
            "config" => Some(KeyTarget::ZoneConfig { zone }),
            "zsk:pub" | "zsk:priv" | "ksk:pub" | "ksk:priv" => Some(KeyTarget::ZoneKey { zone }),
            _ => tail.strip_prefix("labels:").map(|label| KeyTarget::Location {
                zone,
                label: label.to_string(),
            }),
        }
    }
}
