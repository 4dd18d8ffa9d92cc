use redzone_application::ports::{DisabledGeoIp, KeyValueStore, ZoneIndex};
use redzone_application::services::{TrafficSteering, ZoneDataService};
use redzone_domain::config::{CacheConfig, DnssecConfig, UpstreamConfig};
use redzone_domain::{KeyLayout, ZoneConfig};
use redzone_infrastructure::dns::edns::CookieVerifier;
use redzone_infrastructure::dns::{
    DnsHandler, DnsServer, QueryEventEmitter, ResolutionEngine, UpstreamResolver, ZoneCache,
};
use redzone_infrastructure::store::MemoryStore;
use redzone_jobs::{InvalidationJob, JobRunner, ZoneReloadJob};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, UdpSocket};
use tokio_util::sync::CancellationToken;

const PREFIX: &str = "redzone:";

/// Real UDP and TCP listeners on ephemeral loopback ports, serving zones
/// from an in-memory store with the invalidation and zone reload jobs
/// running.
pub struct TestServer {
    udp_addr: SocketAddr,
    tcp_addr: SocketAddr,
    data: ZoneDataService,
    shutdown: CancellationToken,
    jobs: Option<JobRunner>,
}

impl TestServer {
    pub fn udp_addr(&self) -> SocketAddr {
        self.udp_addr
    }

    pub fn tcp_addr(&self) -> SocketAddr {
        self.tcp_addr
    }

    /// Writes go through the same store the server reads.
    pub fn data(&self) -> &ZoneDataService {
        &self.data
    }

    pub async fn shutdown(mut self) {
        if let Some(jobs) = self.jobs.take() {
            jobs.shutdown().await;
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

pub struct TestServerBuilder {
    zones: Vec<(String, ZoneConfig)>,
    locations: Vec<(String, String, String)>,
    cookies: bool,
    max_udp_payload: u16,
}

impl TestServerBuilder {
    pub fn new() -> Self {
        Self {
            zones: Vec::new(),
            locations: Vec::new(),
            cookies: false,
            max_udp_payload: 1232,
        }
    }

    pub fn with_zone(mut self, zone: &str, config: ZoneConfig) -> Self {
        self.zones.push((zone.to_string(), config));
        self
    }

    pub fn with_location(mut self, zone: &str, label: &str, json: &str) -> Self {
        self.locations
            .push((zone.to_string(), label.to_string(), json.to_string()));
        self
    }

    pub fn with_cookies(mut self) -> Self {
        self.cookies = true;
        self
    }

    pub async fn build(self) -> Result<TestServer, Box<dyn std::error::Error>> {
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let keys = KeyLayout::new(PREFIX);
        let data = ZoneDataService::new(store.clone(), keys.clone());

        for (zone, config) in &self.zones {
            data.set_zone(zone, config).await?;
        }
        for (zone, label, json) in &self.locations {
            data.set_location_from_json(zone, label, json).await?;
        }

        let cache = Arc::new(ZoneCache::new(
            data.clone(),
            &CacheConfig::default(),
            DnssecConfig::default(),
        ));
        cache.reload_zone_list().await?;

        let upstream = Arc::new(UpstreamResolver::new(&UpstreamConfig {
            servers: Vec::new(),
            cache_size: 16,
        })?);
        let engine = Arc::new(ResolutionEngine::new(
            cache.clone(),
            TrafficSteering::new(Arc::new(DisabledGeoIp)),
            upstream,
            10,
        ));
        let mut handler = DnsHandler::new(
            engine,
            Arc::new(DisabledGeoIp),
            QueryEventEmitter::new_disabled(),
            self.max_udp_payload,
        );
        if self.cookies {
            handler = handler.with_cookies(CookieVerifier::with_secret([9u8; 16]));
        }

        let server = Arc::new(DnsServer::new(
            Arc::new(handler),
            64,
            Duration::from_secs(2),
        ));
        let shutdown = CancellationToken::new();

        let udp = UdpSocket::bind("127.0.0.1:0").await?;
        let tcp = TcpListener::bind("127.0.0.1:0").await?;
        let udp_addr = udp.local_addr()?;
        let tcp_addr = tcp.local_addr()?;

        let udp_task = {
            let server = server.clone();
            let shutdown = shutdown.clone();
            tokio::spawn(async move {
                let _ = server.serve_udp(udp, shutdown).await;
            })
        };
        let tcp_task = {
            let server = server.clone();
            let shutdown = shutdown.clone();
            tokio::spawn(async move {
                let _ = server.serve_tcp(tcp, shutdown).await;
            })
        };

        let jobs = JobRunner::new(shutdown.clone())
            .with_invalidation(InvalidationJob::new(store, cache.clone(), keys))
            .with_zone_reload(
                ZoneReloadJob::new(cache)
                    .with_intervals(Duration::from_millis(20), Duration::from_secs(3600)),
            )
            .with_task(udp_task)
            .with_task(tcp_task)
            .start();

        Ok(TestServer {
            udp_addr,
            tcp_addr,
            data,
            shutdown,
            jobs: Some(jobs),
        })
    }
}

impl Default for TestServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}
