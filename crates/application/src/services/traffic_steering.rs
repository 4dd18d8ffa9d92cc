use crate::ports::{GeoIpLookup, HealthStatusLookup};
use redzone_domain::rrset::{FilterCount, FilterOrder, GeoFilter, IpFilter, IpRRSet, IpRecord};
use redzone_domain::{Mask, MaskState};
use smallvec::SmallVec;
use std::net::IpAddr;
use std::sync::Arc;
use tracing::debug;

/// Narrows and orders the addresses of an A/AAAA set for one client.
pub struct TrafficSteering {
    geoip: Arc<dyn GeoIpLookup>,
    health: Option<Arc<dyn HealthStatusLookup>>,
}

impl TrafficSteering {
    pub fn new(geoip: Arc<dyn GeoIpLookup>) -> Self {
        Self {
            geoip,
            health: None,
        }
    }

    /// Exclude addresses the health-check subsystem reports as down, for
    /// sets that enable health checking.
    pub fn with_health_status(mut self, health: Arc<dyn HealthStatusLookup>) -> Self {
        self.health = Some(health);
        self
    }

    /// Addresses of `rrset` to answer `source` with, in answer order.
    pub fn filter(&self, source: IpAddr, fqdn: &str, rrset: &IpRRSet) -> Vec<IpAddr> {
        let candidates = rrset.records.as_slice();
        if candidates.is_empty() {
            return Vec::new();
        }

        let mut mask = Mask::all_white(candidates.len());
        if rrset.health_check_enabled() {
            if let Some(health) = &self.health {
                let down = rrset
                    .health_check
                    .as_ref()
                    .map_or(-1, |h| h.down_count.min(-1));
                mask = health_pass(mask, candidates, |ip| {
                    health.health_status(fqdn, ip) <= down
                });
            }
        }

        mask = match rrset.filter.geo_filter {
            GeoFilter::None => mask,
            GeoFilter::Country => self.country_pass(mask, source, candidates),
            GeoFilter::Asn => self.asn_pass(mask, source, candidates),
            GeoFilter::AsnCountry => {
                let mask = self.asn_pass(mask, source, candidates);
                self.country_pass(mask, source, candidates)
            }
            GeoFilter::Location => self.location_pass(mask, source, candidates),
        };

        debug!(
            fqdn = %fqdn,
            source = %source,
            candidates = candidates.len(),
            eligible = mask.white_count(),
            "Traffic steering mask computed"
        );

        order_ips(candidates, &mask, &rrset.filter)
    }

    fn country_pass(&self, mask: Mask, source: IpAddr, candidates: &[IpRecord]) -> Mask {
        let country = self.geoip.country(source).ok();
        narrow(
            mask,
            |i| !candidates[i].country.is_empty(),
            country.map(|country| move |i: usize| candidates[i].serves_country(&country)),
        )
    }

    fn asn_pass(&self, mask: Mask, source: IpAddr, candidates: &[IpRecord]) -> Mask {
        let asn = self.geoip.asn(source).ok();
        narrow(
            mask,
            |i| !candidates[i].asn.is_empty(),
            asn.map(|asn| move |i: usize| candidates[i].serves_asn(asn)),
        )
    }

    /// Keep the candidates closest to the source.
    fn location_pass(&self, mask: Mask, source: IpAddr, candidates: &[IpRecord]) -> Mask {
        let distances: Vec<Option<f64>> = match self.geoip.coordinates(source) {
            Ok((lat, lon)) => candidates
                .iter()
                .map(|c| {
                    self.geoip
                        .coordinates(c.ip)
                        .ok()
                        .map(|(clat, clon)| haversine_distance(lat, lon, clat, clon))
                })
                .collect(),
            Err(_) => vec![None; candidates.len()],
        };
        let distances = distances.as_slice();

        let nearest = mask
            .whites()
            .filter_map(|i| distances[i])
            .fold(None, |min: Option<f64>, d| Some(min.map_or(d, |m| m.min(d))));

        narrow(
            mask,
            |i| distances[i].is_some(),
            nearest.map(|nearest| {
                move |i: usize| distances[i].is_some_and(|d| d - nearest < f64::EPSILON)
            }),
        )
    }
}

/// One narrowing pass. White candidates that match stay white, the rest
/// turn grey. When nothing matches, or the source attribute is unknown,
/// un-annotated candidates become white and annotated ones black. If even
/// that leaves nothing, the mask from before the pass is kept.
fn narrow<A, M>(mut mask: Mask, annotated: A, matches: Option<M>) -> Mask
where
    A: Fn(usize) -> bool,
    M: Fn(usize) -> bool,
{
    let before = mask.clone();

    if let Some(matches) = matches {
        let mut matched = false;
        for i in 0..mask.len() {
            if !mask.is_white(i) {
                continue;
            }
            if matches(i) {
                matched = true;
            } else {
                mask.set(i, MaskState::Grey);
            }
        }
        if matched {
            return mask;
        }
    }

    let mut mask = before.clone();
    for i in 0..mask.len() {
        if before.is_white(i) && annotated(i) {
            mask.set(i, MaskState::Black);
        }
    }
    if mask.has_white() {
        mask
    } else {
        before
    }
}

fn health_pass<F>(mut mask: Mask, candidates: &[IpRecord], is_down: F) -> Mask
where
    F: Fn(IpAddr) -> bool,
{
    for (i, candidate) in candidates.iter().enumerate() {
        if mask.is_white(i) && is_down(candidate.ip) {
            mask.set(i, MaskState::Grey);
        }
    }
    if !mask.has_white() {
        mask.restore_greys();
    }
    mask
}

/// Pick a starting address among the white candidates and lay out the answer.
pub fn order_ips(candidates: &[IpRecord], mask: &Mask, filter: &IpFilter) -> Vec<IpAddr> {
    let whites: SmallVec<[usize; 8]> = mask.whites().collect();
    if whites.is_empty() {
        return Vec::new();
    }

    let start = match filter.order {
        FilterOrder::Weighted => weighted_pick(candidates, &whites)
            .unwrap_or_else(|| fastrand::usize(..whites.len())),
        FilterOrder::Rr => fastrand::usize(..whites.len()),
        FilterOrder::None => 0,
    };

    match filter.count {
        FilterCount::Single => vec![candidates[whites[start]].ip],
        FilterCount::Multi => (0..whites.len())
            .map(|k| candidates[whites[(start + k) % whites.len()]].ip)
            .collect(),
    }
}

/// Position in `whites` chosen proportionally to weight, `None` when every
/// weight is zero.
fn weighted_pick(candidates: &[IpRecord], whites: &[usize]) -> Option<usize> {
    let total: u64 = whites.iter().map(|&i| u64::from(candidates[i].weight)).sum();
    if total == 0 {
        return None;
    }
    let mut roll = fastrand::u64(..total);
    for (pos, &i) in whites.iter().enumerate() {
        let weight = u64::from(candidates[i].weight);
        if roll < weight {
            return Some(pos);
        }
        roll -= weight;
    }
    Some(whites.len() - 1)
}

/// Great-circle distance in kilometers.
pub fn haversine_distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    const EARTH_RADIUS_KM: f64 = 6371.0;

    let lat1_rad = lat1.to_radians();
    let lat2_rad = lat2.to_radians();
    let delta_lat = (lat2 - lat1).to_radians();
    let delta_lon = (lon2 - lon1).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lon / 2.0).sin().powi(2);

    EARTH_RADIUS_KM * 2.0 * a.sqrt().asin()
}
