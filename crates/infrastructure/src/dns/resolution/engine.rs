use super::{RequestContext, Resolution, ResolveError};
use crate::dns::cache::{Zone, ZoneCache};
use crate::dns::dnssec::{nsec_record, sign_section, NsecBitmap};
use crate::dns::records::{ip_records, ToRecords};
use crate::dns::upstream::UpstreamLookup;
use hickory_proto::op::ResponseCode;
use hickory_proto::rr::rdata::CNAME;
use hickory_proto::rr::{Name, RData, Record, RecordType};
use redzone_application::services::TrafficSteering;
use redzone_domain::rrset::IpRRSet;
use redzone_domain::zone::{absolute_name, is_within, normalize_name, relative_to, APEX_LABEL};
use redzone_domain::{DomainError, MatchClass, Record as Location, RRSetType};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::{debug, error, warn};

/// Answers questions from the cached zone data.
///
/// One question walks at most `max_hops` locations: every in-zone alias,
/// including those behind an ANAME target, costs a hop, so alias loops end
/// in SERVFAIL instead of spinning.
pub struct ResolutionEngine {
    cache: Arc<ZoneCache>,
    steering: TrafficSteering,
    upstream: Arc<dyn UpstreamLookup>,
    max_hops: usize,
}

struct Walk<'a> {
    zone: &'a Zone,
    ctx: &'a RequestContext,
    dnssec: bool,
    flatten: bool,
    hops_left: AtomicUsize,
}

impl Walk<'_> {
    fn spend_hop(&self) -> bool {
        self.hops_left
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |n| n.checked_sub(1))
            .is_ok()
    }

    fn budget_exceeded(&self, max_hops: usize) -> ResolveError {
        ResolveError::LoopBudgetExceeded {
            qname: self.ctx.qname.to_ascii(),
            hops: max_hops,
        }
    }

    /// Owner of synthesized answers and denials for the location `current`.
    /// Flattening hides the alias chain, so everything is owned by the
    /// query name.
    fn owner<'n>(&'n self, current: &'n Name) -> &'n Name {
        if self.flatten {
            &self.ctx.qname
        } else {
            current
        }
    }
}

fn parse_name(name: &str) -> Result<Name, DomainError> {
    Name::from_ascii(name).map_err(|e| DomainError::InvalidDomainName(format!("{name}: {e}")))
}

fn address_set(location: &Location, record_type: RecordType) -> Option<&IpRRSet> {
    let set = match record_type {
        RecordType::A => location.a.as_ref(),
        RecordType::AAAA => location.aaaa.as_ref(),
        _ => None,
    };
    set.filter(|s| !s.records.is_empty())
}

/// Location one label closer to the apex, `@` above the last label.
fn aname_target(location: &Location) -> Option<String> {
    location
        .aname
        .as_ref()
        .filter(|a| !a.location.is_empty())
        .map(|a| normalize_name(&a.location))
}

fn parent_label(label: &str) -> &str {
    match label.split_once('.') {
        Some((_, parent)) => parent,
        None => APEX_LABEL,
    }
}

impl ResolutionEngine {
    pub fn new(
        cache: Arc<ZoneCache>,
        steering: TrafficSteering,
        upstream: Arc<dyn UpstreamLookup>,
        max_hops: usize,
    ) -> Self {
        Self {
            cache,
            steering,
            upstream,
            max_hops: max_hops.max(1),
        }
    }

    pub fn cache(&self) -> &Arc<ZoneCache> {
        &self.cache
    }

    pub async fn resolve(&self, ctx: &RequestContext) -> Resolution {
        let qname = normalize_name(&ctx.qname.to_ascii());

        let Some(zone_name) = self.cache.find_zone(&qname) else {
            debug!(name = %qname, "No authoritative zone");
            return Resolution::not_authoritative();
        };

        let zone = match self.cache.get_zone(&zone_name).await {
            Ok(zone) => zone,
            Err(e) => {
                error!(zone = %zone_name, name = %qname, error = %e, "Zone load failed");
                return Resolution::server_failure(Some(zone_name));
            }
        };

        let dnssec = ctx.dnssec_ok && zone.config.dnssec && zone.keys.is_some();
        let walk = Walk {
            zone: &zone,
            ctx,
            dnssec,
            flatten: zone.config.cname_flattening || dnssec,
            hops_left: AtomicUsize::new(self.max_hops),
        };

        let mut out = Resolution::new(Some(zone_name.clone()));
        if let Err(e) = self.walk(&walk, qname.clone(), &mut out).await {
            error!(
                zone = %zone_name,
                name = %qname,
                qtype = %ctx.qtype,
                error = %e,
                "Resolution failed"
            );
            return Resolution::server_failure(Some(zone_name));
        }

        if dnssec && matches!(out.rcode, ResponseCode::NoError | ResponseCode::NXDomain) {
            if let Some(keys) = zone.signing_keys() {
                sign_section(keys, &zone.origin, &mut out.answers);
                sign_section(keys, &zone.origin, &mut out.authority);
            }
        }
        out
    }

    /// Whether `name` is answered from `zone` rather than another zone
    /// served here or none at all.
    fn in_zone(&self, name: &str, zone: &Zone) -> bool {
        is_within(name, &zone.name)
            && self.cache.find_zone(name).as_deref() == Some(zone.name.as_str())
    }

    async fn walk(
        &self,
        walk: &Walk<'_>,
        mut current: String,
        out: &mut Resolution,
    ) -> Result<(), ResolveError> {
        let zone = walk.zone;
        let qtype = walk.ctx.qtype;
        let mut current_name = walk.ctx.qname.clone();

        while walk.spend_hop() {
            if !self.in_zone(&current, zone) {
                return Ok(());
            }
            let Some(relative) = relative_to(&current, &zone.name) else {
                return Ok(());
            };
            let location = zone.find_location(relative);

            match location.class {
                MatchClass::NoMatch => {
                    out.rcode = ResponseCode::NXDomain;
                    self.deny(walk, walk.owner(&current_name), NsecBitmap::NameError, out);
                    return Ok(());
                }
                MatchClass::EmptyNonTerminalMatch => {
                    self.deny(walk, walk.owner(&current_name), NsecBitmap::NameError, out);
                    return Ok(());
                }
                MatchClass::CeMatch => {
                    let record = self.cache.get_location(zone, &location.label).await?;
                    if location.label != APEX_LABEL && record.has(RRSetType::Ns) {
                        self.delegate(walk, &location.label, &record, out).await?;
                    } else {
                        out.rcode = ResponseCode::NXDomain;
                        self.deny(walk, walk.owner(&current_name), NsecBitmap::NameError, out);
                    }
                    return Ok(());
                }
                MatchClass::ExactMatch | MatchClass::WildCardMatch => {
                    let record = self.cache.get_location(zone, &location.label).await?;

                    if let Some(target) = record
                        .cname_target()
                        .filter(|_| qtype != RecordType::CNAME)
                    {
                        let target = normalize_name(target);
                        let in_zone = self.in_zone(&target, zone);
                        let target_name = parse_name(&target)?;

                        if !walk.flatten {
                            if let Some(cname) = &record.cname {
                                out.answers.extend(cname.to_records(&current_name));
                            }
                            if !in_zone {
                                return Ok(());
                            }
                        } else if !in_zone {
                            let ttl = record.cname.as_ref().map_or(0, |c| c.ttl);
                            self.flatten_upstream(walk, target_name, ttl, out).await;
                            return Ok(());
                        }

                        current = target;
                        current_name = target_name;
                        continue;
                    }

                    if location.label != APEX_LABEL
                        && record.has(RRSetType::Ns)
                        && qtype != RecordType::DS
                    {
                        self.delegate(walk, &location.label, &record, out).await?;
                        return Ok(());
                    }

                    let added = self
                        .answer(walk, &location.label, &record, &current, &current_name, out)
                        .await?;
                    if added == 0 {
                        let bitmap = if location.label == APEX_LABEL {
                            NsecBitmap::Apex
                        } else if qtype == RecordType::DS {
                            NsecBitmap::SubDelegation
                        } else {
                            NsecBitmap::Ordinary
                        };
                        self.deny(walk, walk.owner(&current_name), bitmap, out);
                    }
                    return Ok(());
                }
            }
        }

        Err(walk.budget_exceeded(self.max_hops))
    }

    /// SOA in authority, plus an NSEC for `denied` when DNSSEC applies.
    fn deny(&self, walk: &Walk<'_>, denied: &Name, bitmap: NsecBitmap, out: &mut Resolution) {
        let zone = walk.zone;
        out.authority.extend(zone.config.soa.to_records(&zone.origin));
        if walk.dnssec {
            match nsec_record(denied, bitmap, walk.ctx.qtype, zone.config.soa.minttl) {
                Ok(nsec) => out.authority.push(nsec),
                Err(e) => warn!(name = %denied, error = %e, "Failed to build NSEC"),
            }
        }
    }

    /// Referral to the nameservers of the child `label`.
    async fn delegate(
        &self,
        walk: &Walk<'_>,
        label: &str,
        record: &Location,
        out: &mut Resolution,
    ) -> Result<(), ResolveError> {
        let zone = walk.zone;
        let owner = parse_name(&absolute_name(label, &zone.name))?;
        // In-zone aliases already answered stay authoritative.
        if out.answers.is_empty() {
            out.authoritative = false;
        }

        if let Some(ns) = &record.ns {
            out.authority.extend(ns.to_records(&owner));
        }

        if walk.dnssec {
            match record.ds.as_ref().filter(|ds| !ds.records.is_empty()) {
                Some(ds) => out.authority.extend(ds.to_records(&owner)),
                None => match nsec_record(
                    &owner,
                    NsecBitmap::SubDelegation,
                    walk.ctx.qtype,
                    zone.config.soa.minttl,
                ) {
                    Ok(nsec) => out.authority.push(nsec),
                    Err(e) => warn!(name = %owner, error = %e, "Failed to build NSEC"),
                },
            }
        }

        for host in record.ns_hosts() {
            let host = normalize_name(host);
            let Some(relative) = relative_to(&host, &zone.name) else {
                continue;
            };
            let glue = zone.find_location(relative);
            if glue.class != MatchClass::ExactMatch {
                continue;
            }
            let glue_record = self.cache.get_location(zone, &glue.label).await?;
            let host_name = parse_name(&host)?;
            for set in [&glue_record.a, &glue_record.aaaa].into_iter().flatten() {
                let ips: Vec<_> = set.records.iter().map(|r| r.ip).collect();
                out.additional.extend(ip_records(&host_name, set.ttl, &ips));
            }
        }
        Ok(())
    }

    /// Answer records for the query type at a matched location. Returns
    /// the number of answers added.
    async fn answer(
        &self,
        walk: &Walk<'_>,
        label: &str,
        record: &Location,
        current: &str,
        current_name: &Name,
        out: &mut Resolution,
    ) -> Result<usize, ResolveError> {
        let zone = walk.zone;
        let owner = walk.owner(current_name);
        let before = out.answers.len();
        let at_apex = label == APEX_LABEL;

        let records: Vec<Record> = match walk.ctx.qtype {
            qtype @ (RecordType::A | RecordType::AAAA) => {
                self.address_answer(walk, record, current, owner, qtype).await?
            }
            RecordType::CNAME => record.cname.iter().flat_map(|s| s.to_records(owner)).collect(),
            RecordType::TXT => record.txt.iter().flat_map(|s| s.to_records(owner)).collect(),
            RecordType::NS => record.ns.iter().flat_map(|s| s.to_records(owner)).collect(),
            RecordType::MX => record.mx.iter().flat_map(|s| s.to_records(owner)).collect(),
            RecordType::SRV => record.srv.iter().flat_map(|s| s.to_records(owner)).collect(),
            RecordType::PTR => record.ptr.iter().flat_map(|s| s.to_records(owner)).collect(),
            RecordType::TLSA => record.tlsa.iter().flat_map(|s| s.to_records(owner)).collect(),
            RecordType::DS => record.ds.iter().flat_map(|s| s.to_records(owner)).collect(),
            RecordType::SOA if at_apex => zone.config.soa.to_records(owner),
            RecordType::DNSKEY if at_apex => zone
                .signing_keys()
                .map(|keys| {
                    keys.dnskey_records()
                        .iter()
                        .cloned()
                        .map(|mut r| {
                            r.set_name(owner.clone());
                            r
                        })
                        .collect()
                })
                .unwrap_or_default(),
            RecordType::CAA => self.caa_answer(zone, label, record, owner).await?,
            _ => Vec::new(),
        };

        out.answers.extend(records);
        Ok(out.answers.len() - before)
    }

    /// Steered A/AAAA, or the addresses of the ANAME target when the
    /// location has none of its own.
    async fn address_answer(
        &self,
        walk: &Walk<'_>,
        record: &Location,
        current: &str,
        owner: &Name,
        qtype: RecordType,
    ) -> Result<Vec<Record>, ResolveError> {
        let source = walk.ctx.source;

        if let Some(set) = address_set(record, qtype) {
            let ips = self.steering.filter(source, current, set);
            return Ok(ip_records(owner, set.ttl, &ips));
        }

        let Some(mut target) = aname_target(record) else {
            return Ok(Vec::new());
        };

        // In-zone targets are chased through their own aliases.
        while self.in_zone(&target, walk.zone) {
            if !walk.spend_hop() {
                return Err(walk.budget_exceeded(self.max_hops));
            }
            let Some(relative) = relative_to(&target, &walk.zone.name) else {
                return Ok(Vec::new());
            };
            let location = walk.zone.find_location(relative);
            if !matches!(location.class, MatchClass::ExactMatch | MatchClass::WildCardMatch) {
                return Ok(Vec::new());
            }
            let target_record = self.cache.get_location(walk.zone, &location.label).await?;

            if let Some(set) = address_set(&target_record, qtype) {
                let ips = self.steering.filter(source, &target, set);
                return Ok(ip_records(owner, set.ttl, &ips));
            }
            let next = target_record
                .cname_target()
                .map(normalize_name)
                .or_else(|| aname_target(&target_record));
            match next {
                Some(next) => target = next,
                None => return Ok(Vec::new()),
            }
        }

        let target_name = parse_name(&target)?;
        match self.upstream.lookup(&target_name, qtype).await {
            Ok(answer) => Ok(answer
                .of_type(qtype)
                .cloned()
                .map(|mut r| {
                    r.set_name(owner.clone());
                    r
                })
                .collect()),
            Err(e) => {
                warn!(name = %current, target = %target, error = %e, "ANAME target lookup failed");
                Ok(Vec::new())
            }
        }
    }

    /// CAA of the closest location at or above `label` that has any.
    async fn caa_answer(
        &self,
        zone: &Zone,
        label: &str,
        record: &Location,
        owner: &Name,
    ) -> Result<Vec<Record>, ResolveError> {
        if let Some(caa) = record.caa.as_ref().filter(|c| !c.records.is_empty()) {
            return Ok(caa.to_records(owner));
        }

        let mut label = label;
        while label != APEX_LABEL {
            label = parent_label(label);
            if label != APEX_LABEL && !zone.has_label(label) {
                continue;
            }
            let ancestor = self.cache.get_location(zone, label).await?;
            if let Some(caa) = ancestor.caa.as_ref().filter(|c| !c.records.is_empty()) {
                return Ok(caa.to_records(owner));
            }
        }
        Ok(Vec::new())
    }

    /// Answer a flattened alias leaving the zone through the upstream
    /// resolver, falling back to the alias itself.
    async fn flatten_upstream(
        &self,
        walk: &Walk<'_>,
        target: Name,
        ttl: u32,
        out: &mut Resolution,
    ) {
        let qtype = walk.ctx.qtype;
        let original = &walk.ctx.qname;

        match self.upstream.lookup(&target, qtype).await {
            Ok(answer) => {
                let records: Vec<Record> = answer
                    .of_type(qtype)
                    .cloned()
                    .map(|mut r| {
                        r.set_name(original.clone());
                        r
                    })
                    .collect();
                if !records.is_empty() {
                    out.answers.extend(records);
                    return;
                }
            }
            Err(e) => {
                warn!(name = %original, target = %target, error = %e, "Flattened CNAME target lookup failed");
            }
        }

        out.answers
            .push(Record::from_rdata(original.clone(), ttl, RData::CNAME(CNAME(target))));
    }
}
