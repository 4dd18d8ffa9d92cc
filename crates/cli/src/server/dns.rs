use crate::di::DnsServices;
use redzone_domain::Config;
use redzone_infrastructure::dns::{DnsServer, QueryLogger};
use redzone_jobs::{InvalidationJob, JobRunner, ZoneReloadJob};
use std::net::SocketAddr;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, UdpSocket};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// Serve DNS until ctrl-c, then stop the listeners and jobs.
pub async fn run(config: &Config, services: DnsServices) -> anyhow::Result<()> {
    let bind_addr = format!("{}:{}", config.server.bind_address, config.server.dns_port);
    let socket_addr = SocketAddr::from_str(&bind_addr)?;
    let shutdown = CancellationToken::new();

    info!(bind_address = %socket_addr, "Starting DNS server");

    let server = Arc::new(DnsServer::new(
        services.handler.clone(),
        config.server.max_concurrent_queries,
        Duration::from_secs(config.server.tcp_idle_timeout_secs),
    ));

    let udp_socket = UdpSocket::bind(socket_addr).await?;
    let udp_task = {
        let server = server.clone();
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            if let Err(e) = server.serve_udp(udp_socket, shutdown).await {
                error!(error = %e, "UDP listener failed");
            }
        })
    };

    let tcp_task = if config.server.tcp_enabled {
        let tcp_listener = TcpListener::bind(socket_addr).await?;
        let server = server.clone();
        let shutdown = shutdown.clone();
        Some(tokio::spawn(async move {
            if let Err(e) = server.serve_tcp(tcp_listener, shutdown).await {
                error!(error = %e, "TCP listener failed");
            }
        }))
    } else {
        None
    };

    let logger = QueryLogger::new(services.query_events, config.resolver.access_log)
        .start(shutdown.clone());

    let mut jobs = JobRunner::new(shutdown.clone())
        .with_invalidation(InvalidationJob::new(
            services.store.clone(),
            services.cache.clone(),
            services.keys.clone(),
        ))
        .with_zone_reload(ZoneReloadJob::new(services.cache.clone()).with_intervals(
            Duration::from_secs(config.cache.zone_reload_interval_secs),
            Duration::from_secs(config.cache.forced_reload_interval_secs),
        ))
        .with_task(logger)
        .with_task(udp_task);
    if let Some(tcp_task) = tcp_task {
        jobs = jobs.with_task(tcp_task);
    }
    let jobs = jobs.start();

    info!("DNS server ready to accept queries");

    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received");

    jobs.shutdown().await;
    info!("DNS server stopped");

    Ok(())
}
