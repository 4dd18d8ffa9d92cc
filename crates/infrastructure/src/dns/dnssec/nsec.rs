use super::wire::{encode_type_bitmap, owner_to_wire};
use hickory_proto::rr::rdata::NULL;
use hickory_proto::rr::{Name, RData, Record, RecordType};
use redzone_domain::DomainError;

const ORDINARY_TYPES: [RecordType; 12] = [
    RecordType::A,
    RecordType::HINFO,
    RecordType::MX,
    RecordType::TXT,
    RecordType::AAAA,
    RecordType::SRV,
    RecordType::SSHFP,
    RecordType::RRSIG,
    RecordType::NSEC,
    RecordType::TLSA,
    RecordType::OPENPGPKEY,
    RecordType::CAA,
];

const APEX_EXTRA_TYPES: [RecordType; 3] = [RecordType::NS, RecordType::SOA, RecordType::DNSKEY];

const SUB_DELEGATION_TYPES: [RecordType; 3] = [RecordType::NS, RecordType::RRSIG, RecordType::NSEC];

const NAME_ERROR_TYPES: [RecordType; 2] = [RecordType::RRSIG, RecordType::NSEC];

/// Type set advertised by a denial NSEC.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NsecBitmap {
    Apex,
    /// Insecure delegation or DS denial
    SubDelegation,
    /// Nonexistent or empty name
    NameError,
    Ordinary,
}

impl NsecBitmap {
    /// Type codes for the bitmap. Apex and ordinary sets drop the denied
    /// type.
    pub fn types(self, denied: RecordType) -> Vec<u16> {
        let types: Vec<RecordType> = match self {
            Self::Apex => ORDINARY_TYPES
                .iter()
                .chain(APEX_EXTRA_TYPES.iter())
                .copied()
                .filter(|t| *t != denied)
                .collect(),
            Self::Ordinary => ORDINARY_TYPES
                .iter()
                .copied()
                .filter(|t| *t != denied)
                .collect(),
            Self::SubDelegation => SUB_DELEGATION_TYPES.to_vec(),
            Self::NameError => NAME_ERROR_TYPES.to_vec(),
        };
        types.into_iter().map(u16::from).collect()
    }
}

/// NSEC owned by `denied` whose next name is the immediate successor
/// `\000.<denied>`, covering nothing but the name itself.
pub fn nsec_record(
    denied: &Name,
    bitmap: NsecBitmap,
    qtype: RecordType,
    ttl: u32,
) -> Result<Record, DomainError> {
    let mut rdata = vec![1, 0];
    rdata.extend_from_slice(&owner_to_wire(denied)?);
    rdata.extend_from_slice(&encode_type_bitmap(&bitmap.types(qtype)));

    Ok(Record::from_rdata(
        denied.clone(),
        ttl,
        RData::Unknown {
            code: RecordType::NSEC,
            rdata: NULL::with(rdata),
        },
    ))
}
