use super::keys::SigningKey;
use super::wire::{canonical_rrset, owner_to_wire};
use super::ZoneKeys;
use hickory_proto::rr::rdata::NULL;
use hickory_proto::rr::{Name, RData, Record, RecordType};
use redzone_domain::config::DnssecConfig;
use redzone_domain::DomainError;
use tracing::warn;

/// Inception and expiration of every RRSIG produced for a loaded zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignatureWindow {
    pub inception: u32,
    pub expiration: u32,
}

impl SignatureWindow {
    pub fn from_load_time(now: u32, config: &DnssecConfig) -> Self {
        Self {
            inception: now.saturating_sub(config.inception_offset_secs),
            expiration: now.saturating_add(config.validity_secs),
        }
    }
}

/// RRSIG RDATA up to and including the signer name (RFC 4034 §3.1).
fn rrsig_head(
    key: &SigningKey,
    covered: RecordType,
    owner: &Name,
    original_ttl: u32,
    signer: &Name,
    window: SignatureWindow,
) -> Result<Vec<u8>, DomainError> {
    let signer_wire = owner_to_wire(signer)?;
    let mut head = Vec::with_capacity(18 + signer_wire.len());
    head.extend_from_slice(&u16::from(covered).to_be_bytes());
    head.push(key.algorithm());
    head.push(owner.num_labels());
    head.extend_from_slice(&original_ttl.to_be_bytes());
    head.extend_from_slice(&window.expiration.to_be_bytes());
    head.extend_from_slice(&window.inception.to_be_bytes());
    head.extend_from_slice(&key.key_tag().to_be_bytes());
    head.extend_from_slice(&signer_wire);
    Ok(head)
}

/// Sign one RRset (records sharing owner and type) with `key`.
pub fn sign_rrset(
    key: &SigningKey,
    rrset: &[Record],
    signer: &Name,
    window: SignatureWindow,
) -> Result<Record, DomainError> {
    let first = rrset
        .first()
        .ok_or_else(|| DomainError::Signing("Empty RRset".to_string()))?;
    let ttl = first.ttl();

    let head = rrsig_head(key, first.record_type(), first.name(), ttl, signer, window)?;
    let mut data = head.clone();
    data.extend_from_slice(&canonical_rrset(rrset, ttl)?);

    let signature = key.sign(&data)?;
    let mut rdata = head;
    rdata.extend_from_slice(&signature);

    Ok(Record::from_rdata(
        first.name().clone(),
        ttl,
        RData::Unknown {
            code: RecordType::RRSIG,
            rdata: NULL::with(rdata),
        },
    ))
}

/// Append RRSIGs for every RRset of a response section.
///
/// DNSKEY sets reuse the signature made with the KSK at load time and NS
/// sets are only signed at the apex; a delegation's NS is not
/// authoritative data.
pub fn sign_section(keys: &ZoneKeys, zone: &Name, section: &mut Vec<Record>) {
    let mut groups: Vec<(Name, RecordType, Vec<Record>)> = Vec::new();
    for record in section.iter() {
        let record_type = record.record_type();
        if matches!(record_type, RecordType::RRSIG | RecordType::OPT) {
            continue;
        }
        match groups
            .iter_mut()
            .find(|(name, kind, _)| *kind == record_type && name == record.name())
        {
            Some((_, _, records)) => records.push(record.clone()),
            None => groups.push((record.name().clone(), record_type, vec![record.clone()])),
        }
    }

    for (name, record_type, rrset) in groups {
        match record_type {
            RecordType::DNSKEY if name == *zone => {
                if let Some(rrsig) = keys.dnskey_rrsig() {
                    section.push(rrsig.clone());
                }
            }
            RecordType::NS if name != *zone => {}
            _ => match sign_rrset(&keys.zsk, &rrset, zone, keys.window) {
                Ok(rrsig) => section.push(rrsig),
                Err(e) => {
                    warn!(name = %name, record_type = %record_type, error = %e, "RRset left unsigned");
                }
            },
        }
    }
}
