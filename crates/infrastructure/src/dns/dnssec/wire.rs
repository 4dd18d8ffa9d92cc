use hickory_proto::rr::{Name, RData, Record};
use hickory_proto::serialize::binary::{BinEncodable, BinEncoder};
use redzone_domain::DomainError;

const CLASS_IN: u16 = 1;

/// Convert a DNS name to uncompressed, lowercased wire format.
///
/// ```text
/// example.com. → 0x07 e x a m p l e 0x03 c o m 0x00
/// ```
pub fn name_to_wire(name: &str) -> Result<Vec<u8>, DomainError> {
    let mut wire = Vec::with_capacity(name.len() + 2);

    let name = name.trim_end_matches('.');
    if name.is_empty() {
        wire.push(0);
        return Ok(wire);
    }

    for label in name.split('.') {
        if label.is_empty() {
            return Err(DomainError::InvalidDomainName(format!("Empty label in {name}")));
        }
        if label.len() > 63 {
            return Err(DomainError::InvalidDomainName(format!("Label too long in {name}")));
        }
        wire.push(label.len() as u8);
        wire.extend_from_slice(label.to_ascii_lowercase().as_bytes());
    }
    wire.push(0);

    Ok(wire)
}

pub fn owner_to_wire(name: &Name) -> Result<Vec<u8>, DomainError> {
    name_to_wire(&name.to_ascii())
}

/// RDATA in canonical form: embedded names lowercased and uncompressed.
pub fn rdata_to_wire(rdata: &RData) -> Result<Vec<u8>, DomainError> {
    let mut buf = Vec::with_capacity(64);
    {
        let mut encoder = BinEncoder::new(&mut buf);
        encoder.set_canonical_names(true);
        rdata
            .emit(&mut encoder)
            .map_err(|e| DomainError::Signing(format!("Failed to encode rdata: {e}")))?;
    }
    Ok(buf)
}

/// Signed-data form of an RRset (RFC 4034 §3.1.8.1): every RR with the
/// covered TTL, sorted by canonical RDATA.
pub fn canonical_rrset(rrset: &[Record], original_ttl: u32) -> Result<Vec<u8>, DomainError> {
    let mut rdatas = Vec::with_capacity(rrset.len());
    for record in rrset {
        let Some(rdata) = record.data() else {
            continue;
        };
        rdatas.push((owner_to_wire(record.name())?, record.record_type(), rdata_to_wire(rdata)?));
    }
    rdatas.sort_by(|a, b| a.2.cmp(&b.2));
    rdatas.dedup_by(|a, b| a.2 == b.2);

    let mut data = Vec::new();
    for (owner, record_type, rdata) in rdatas {
        data.extend_from_slice(&owner);
        data.extend_from_slice(&u16::from(record_type).to_be_bytes());
        data.extend_from_slice(&CLASS_IN.to_be_bytes());
        data.extend_from_slice(&original_ttl.to_be_bytes());
        data.extend_from_slice(&(rdata.len() as u16).to_be_bytes());
        data.extend_from_slice(&rdata);
    }
    Ok(data)
}

/// NSEC/NSEC3 type bitmap (RFC 4034 §4.1.2).
pub fn encode_type_bitmap(types: &[u16]) -> Vec<u8> {
    let mut types = types.to_vec();
    types.sort_unstable();
    types.dedup();

    let mut out = Vec::new();
    let mut index = 0;
    while index < types.len() {
        let window = (types[index] >> 8) as u8;
        let mut bitmap = [0u8; 32];
        let mut length = 0;
        while index < types.len() && (types[index] >> 8) as u8 == window {
            let low = (types[index] & 0xFF) as usize;
            bitmap[low / 8] |= 0x80 >> (low % 8);
            length = low / 8 + 1;
            index += 1;
        }
        out.push(window);
        out.push(length as u8);
        out.extend_from_slice(&bitmap[..length]);
    }
    out
}
