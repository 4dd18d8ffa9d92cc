pub mod keys;
pub mod nsec;
pub mod signer;
pub mod wire;

pub use keys::{Dnskey, SigningKey};
pub use nsec::{nsec_record, NsecBitmap};
pub use signer::{sign_rrset, sign_section, SignatureWindow};

use hickory_proto::rr::{Name, Record};
use redzone_application::services::StoredKey;
use redzone_domain::config::DnssecConfig;
use redzone_domain::DomainError;
use std::str::FromStr;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::warn;

/// Signing material of one zone, built once per zone load.
#[derive(Debug)]
pub struct ZoneKeys {
    pub zsk: SigningKey,
    pub ksk: SigningKey,
    pub window: SignatureWindow,
    dnskey_records: Vec<Record>,
    dnskey_rrsig: Option<Record>,
}

impl ZoneKeys {
    pub fn load(
        zone: &str,
        zsk: &StoredKey,
        ksk: &StoredKey,
        config: &DnssecConfig,
        now: u32,
    ) -> Result<Self, DomainError> {
        let owner = Name::from_str(zone)
            .map_err(|e| DomainError::InvalidDomainName(format!("{zone}: {e}")))?;
        let zsk = SigningKey::from_stored(zone, &zsk.public, &zsk.private)?;
        let ksk = SigningKey::from_stored(zone, &ksk.public, &ksk.private)?;
        let window = SignatureWindow::from_load_time(now, config);

        let dnskey_records = vec![zsk.dnskey.to_record(&owner), ksk.dnskey.to_record(&owner)];
        let dnskey_rrsig = match sign_rrset(&ksk, &dnskey_records, &owner, window) {
            Ok(rrsig) => Some(rrsig),
            Err(e) => {
                warn!(zone = %zone, error = %e, "DNSKEY RRset left unsigned");
                None
            }
        };

        Ok(Self {
            zsk,
            ksk,
            window,
            dnskey_records,
            dnskey_rrsig,
        })
    }

    pub fn dnskey_records(&self) -> &[Record] {
        &self.dnskey_records
    }

    pub fn dnskey_rrsig(&self) -> Option<&Record> {
        self.dnskey_rrsig.as_ref()
    }
}

/// Seconds since the epoch as carried in RRSIG and cookie timestamps.
pub fn unix_now() -> u32 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as u32)
        .unwrap_or_default()
}
