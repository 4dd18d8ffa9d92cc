use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("Not authoritative for: {0}")]
    NotAuthoritative(String),

    #[error("Zone not found: {0}")]
    ZoneNotFound(String),

    #[error("Location not found: {zone} {label}")]
    LocationNotFound { zone: String, label: String },

    #[error("Invalid record JSON for {key}: {reason}")]
    InvalidRecordJson { key: String, reason: String },

    #[error("Invalid zone config for {zone}: {reason}")]
    InvalidZoneConfig { zone: String, reason: String },

    #[error("Invalid DNSSEC key for {zone}: {reason}")]
    InvalidKey { zone: String, reason: String },

    #[error("Invalid domain name: {0}")]
    InvalidDomainName(String),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Upstream error: {0}")]
    Upstream(String),

    #[error("All upstream servers failed for {0}")]
    UpstreamExhausted(String),

    #[error("Signing failed: {0}")]
    Signing(String),

    #[error("I/O error: {0}")]
    IoError(String),
}

impl DomainError {
    /// Store-side failures that allow serving a stale cached value.
    pub fn is_store_failure(&self) -> bool {
        matches!(self, Self::Store(_) | Self::StoreUnavailable(_))
    }
}
