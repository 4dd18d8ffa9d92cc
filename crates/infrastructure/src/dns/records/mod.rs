//! Location RRSets to wire records.

use hickory_proto::rr::rdata::{CNAME, MX, NS, NULL, PTR, SOA, SRV, TXT};
use hickory_proto::rr::{Name, RData, Record, RecordType};
use redzone_domain::rrset::{
    CaaRRSet, CnameRRSet, DsRRSet, MxRRSet, NsRRSet, PtrRRSet, SoaRRSet, SrvRRSet, TlsaRRSet,
    TxtRRSet,
};
use std::net::IpAddr;
use tracing::warn;

const TXT_CHUNK: usize = 255;

/// Wire records of an RRSet owned by `owner`.
pub trait ToRecords {
    fn to_records(&self, owner: &Name) -> Vec<Record>;
}

/// Parse a stored host name. Unparsable names are dropped from the answer.
pub fn parse_name(host: &str) -> Option<Name> {
    match Name::from_ascii(host) {
        Ok(mut name) => {
            name.set_fqdn(true);
            Some(name)
        }
        Err(e) => {
            warn!(host = %host, error = %e, "Skipping unparsable host name");
            None
        }
    }
}

fn raw(owner: &Name, ttl: u32, code: RecordType, rdata: Vec<u8>) -> Record {
    Record::from_rdata(
        owner.clone(),
        ttl,
        RData::Unknown {
            code,
            rdata: NULL::with(rdata),
        },
    )
}

fn decode_hex(field: &str, value: &str) -> Option<Vec<u8>> {
    match hex::decode(value) {
        Ok(bytes) => Some(bytes),
        Err(e) => {
            warn!(field = field, error = %e, "Skipping record with invalid hex");
            None
        }
    }
}

/// A or AAAA records for already steered addresses.
pub fn ip_records(owner: &Name, ttl: u32, ips: &[IpAddr]) -> Vec<Record> {
    ips.iter()
        .map(|ip| {
            let rdata = match ip {
                IpAddr::V4(v4) => RData::A((*v4).into()),
                IpAddr::V6(v6) => RData::AAAA((*v6).into()),
            };
            Record::from_rdata(owner.clone(), ttl, rdata)
        })
        .collect()
}

impl ToRecords for CnameRRSet {
    fn to_records(&self, owner: &Name) -> Vec<Record> {
        parse_name(&self.host)
            .map(|target| Record::from_rdata(owner.clone(), self.ttl, RData::CNAME(CNAME(target))))
            .into_iter()
            .collect()
    }
}

impl ToRecords for TxtRRSet {
    fn to_records(&self, owner: &Name) -> Vec<Record> {
        self.records
            .iter()
            .map(|txt| {
                let chunks: Vec<&[u8]> = txt.text.as_bytes().chunks(TXT_CHUNK).collect();
                Record::from_rdata(owner.clone(), self.ttl, RData::TXT(TXT::from_bytes(chunks)))
            })
            .collect()
    }
}

impl ToRecords for NsRRSet {
    fn to_records(&self, owner: &Name) -> Vec<Record> {
        self.records
            .iter()
            .filter_map(|ns| parse_name(&ns.host))
            .map(|host| Record::from_rdata(owner.clone(), self.ttl, RData::NS(NS(host))))
            .collect()
    }
}

impl ToRecords for MxRRSet {
    fn to_records(&self, owner: &Name) -> Vec<Record> {
        self.records
            .iter()
            .filter_map(|mx| {
                let host = parse_name(&mx.host)?;
                Some(Record::from_rdata(
                    owner.clone(),
                    self.ttl,
                    RData::MX(MX::new(mx.preference, host)),
                ))
            })
            .collect()
    }
}

impl ToRecords for SrvRRSet {
    fn to_records(&self, owner: &Name) -> Vec<Record> {
        self.records
            .iter()
            .filter_map(|srv| {
                let target = parse_name(&srv.target)?;
                Some(Record::from_rdata(
                    owner.clone(),
                    self.ttl,
                    RData::SRV(SRV::new(srv.priority, srv.weight, srv.port, target)),
                ))
            })
            .collect()
    }
}

impl ToRecords for PtrRRSet {
    fn to_records(&self, owner: &Name) -> Vec<Record> {
        parse_name(&self.domain)
            .map(|domain| Record::from_rdata(owner.clone(), self.ttl, RData::PTR(PTR(domain))))
            .into_iter()
            .collect()
    }
}

impl ToRecords for CaaRRSet {
    fn to_records(&self, owner: &Name) -> Vec<Record> {
        self.records
            .iter()
            .map(|caa| {
                let mut rdata = Vec::with_capacity(2 + caa.tag.len() + caa.value.len());
                rdata.push(caa.flag);
                rdata.push(caa.tag.len() as u8);
                rdata.extend_from_slice(caa.tag.as_bytes());
                rdata.extend_from_slice(caa.value.as_bytes());
                raw(owner, self.ttl, RecordType::CAA, rdata)
            })
            .collect()
    }
}

impl ToRecords for TlsaRRSet {
    fn to_records(&self, owner: &Name) -> Vec<Record> {
        self.records
            .iter()
            .filter_map(|tlsa| {
                let certificate = decode_hex("certificate", &tlsa.certificate)?;
                let mut rdata = vec![tlsa.usage, tlsa.selector, tlsa.matching_type];
                rdata.extend_from_slice(&certificate);
                Some(raw(owner, self.ttl, RecordType::TLSA, rdata))
            })
            .collect()
    }
}

impl ToRecords for DsRRSet {
    fn to_records(&self, owner: &Name) -> Vec<Record> {
        self.records
            .iter()
            .filter_map(|ds| {
                let digest = decode_hex("digest", &ds.digest)?;
                let mut rdata = Vec::with_capacity(4 + digest.len());
                rdata.extend_from_slice(&ds.key_tag.to_be_bytes());
                rdata.push(ds.algorithm);
                rdata.push(ds.digest_type);
                rdata.extend_from_slice(&digest);
                Some(raw(owner, self.ttl, RecordType::DS, rdata))
            })
            .collect()
    }
}

impl ToRecords for SoaRRSet {
    fn to_records(&self, owner: &Name) -> Vec<Record> {
        let (Some(mname), Some(rname)) = (parse_name(&self.ns), parse_name(&self.mbox)) else {
            return Vec::new();
        };
        vec![Record::from_rdata(
            owner.clone(),
            self.ttl,
            RData::SOA(SOA::new(
                mname,
                rname,
                self.serial,
                self.refresh as i32,
                self.retry as i32,
                self.expire as i32,
                self.minttl,
            )),
        )]
    }
}
