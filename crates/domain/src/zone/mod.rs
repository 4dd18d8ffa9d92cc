pub mod config;
pub mod matcher;

pub use config::ZoneConfig;
pub use matcher::{LocationMatch, LocationMatcher, MatchClass, APEX_LABEL};

/// Lowercase a domain name and make it fully qualified.
pub fn normalize_name(name: &str) -> String {
    let mut name = name.trim().to_ascii_lowercase();
    if !name.ends_with('.') {
        name.push('.');
    }
    name
}

/// `qname` relative to `zone` (both normalized), `""` for the apex.
/// `None` when `qname` is outside the zone.
pub fn relative_to<'a>(qname: &'a str, zone: &str) -> Option<&'a str> {
    if zone == "." {
        return Some(qname.trim_end_matches('.'));
    }
    if qname == zone {
        return Some("");
    }
    let prefix = qname.strip_suffix(zone)?;
    prefix.strip_suffix('.')
}

pub fn is_within(qname: &str, zone: &str) -> bool {
    relative_to(qname, zone).is_some()
}

/// Owner name of a location label.
pub fn absolute_name(label: &str, zone: &str) -> String {
    if label.is_empty() || label == APEX_LABEL {
        zone.to_string()
    } else if zone == "." {
        format!("{label}.")
    } else {
        format!("{label}.{zone}")
    }
}
