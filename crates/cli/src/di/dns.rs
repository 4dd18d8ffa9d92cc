use redzone_application::ports::{KeyValueStore, ZoneIndex};
use redzone_application::services::{TrafficSteering, ZoneDataService};
use redzone_domain::{Config, KeyLayout};
use redzone_infrastructure::dns::edns::CookieVerifier;
use redzone_infrastructure::dns::{
    DnsHandler, QueryEvent, QueryEventEmitter, ResolutionEngine, UpstreamResolver, ZoneCache,
};
use redzone_infrastructure::geoip::build_geoip;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{info, warn};

/// Everything the listeners and background jobs share.
pub struct DnsServices {
    pub store: Arc<dyn KeyValueStore>,
    pub cache: Arc<ZoneCache>,
    pub handler: Arc<DnsHandler>,
    pub keys: KeyLayout,
    pub query_events: mpsc::Receiver<QueryEvent>,
}

impl DnsServices {
    pub async fn new(config: &Config, store: Arc<dyn KeyValueStore>) -> anyhow::Result<Self> {
        let keys = KeyLayout::new(&config.store.prefix);
        let data = ZoneDataService::new(store.clone(), keys.clone());

        let cache = Arc::new(ZoneCache::new(data, &config.cache, config.dnssec.clone()));
        match cache.reload_zone_list().await {
            Ok(count) => info!(zones = count, "Zone list loaded"),
            // The reload job retries while the flag stays dirty.
            Err(e) => warn!(error = %e, "Initial zone list load failed"),
        }

        let geoip = build_geoip(&config.geoip)?;
        let steering = TrafficSteering::new(geoip.clone());

        let upstream = Arc::new(UpstreamResolver::new(&config.upstream)?);
        info!(servers = upstream.server_count(), "Upstream resolver ready");

        let engine = Arc::new(ResolutionEngine::new(
            cache.clone(),
            steering,
            upstream,
            config.resolver.max_chain_hops,
        ));

        let (emitter, query_events) =
            QueryEventEmitter::new_enabled(config.resolver.log_queue_size);

        let mut handler = DnsHandler::new(engine, geoip, emitter, config.server.max_udp_payload);
        if config.cookie.enabled {
            handler = handler.with_cookies(CookieVerifier::new(&config.cookie)?);
            info!("DNS cookies enabled");
        }

        Ok(Self {
            store,
            cache,
            handler: Arc::new(handler),
            keys,
            query_events,
        })
    }
}
