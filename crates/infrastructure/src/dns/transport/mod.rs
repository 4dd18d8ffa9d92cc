//! Upstream exchanges. Each call sends one query and waits for one answer
//! within the server's timeout.

pub mod tcp;
pub mod udp;

use async_trait::async_trait;
use redzone_domain::config::{UpstreamProtocol, UpstreamServerConfig};
use redzone_domain::DomainError;
use std::future::Future;
use std::net::SocketAddr;
use std::time::Duration;

#[async_trait]
pub trait DnsTransport: Send + Sync {
    /// Send `query` and return the raw response.
    async fn exchange(&self, query: &[u8], timeout: Duration) -> Result<Vec<u8>, DomainError>;

    fn server_addr(&self) -> SocketAddr;
}

/// Transport configured for one upstream server.
pub enum Transport {
    Udp(udp::UdpTransport),
    Tcp(tcp::TcpTransport),
}

impl Transport {
    pub async fn exchange(&self, query: &[u8], timeout: Duration) -> Result<Vec<u8>, DomainError> {
        match self {
            Self::Udp(t) => t.exchange(query, timeout).await,
            Self::Tcp(t) => t.exchange(query, timeout).await,
        }
    }

    pub fn server_addr(&self) -> SocketAddr {
        match self {
            Self::Udp(t) => t.server_addr(),
            Self::Tcp(t) => t.server_addr(),
        }
    }

    pub fn is_udp(&self) -> bool {
        matches!(self, Self::Udp(_))
    }
}

pub fn create_transport(server: &UpstreamServerConfig) -> Result<Transport, DomainError> {
    let addr = server
        .socket_addr()
        .map_err(|e| DomainError::Upstream(e.to_string()))?;
    Ok(match server.protocol {
        UpstreamProtocol::Udp => Transport::Udp(udp::UdpTransport::new(addr)),
        UpstreamProtocol::Tcp => Transport::Tcp(tcp::TcpTransport::new(addr)),
    })
}

/// Run `io` under `timeout`, mapping both failure kinds to upstream errors.
pub(crate) async fn with_deadline<T, F>(
    server: SocketAddr,
    protocol: &str,
    timeout: Duration,
    io: F,
) -> Result<T, DomainError>
where
    F: Future<Output = std::io::Result<T>>,
{
    match tokio::time::timeout(timeout, io).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => Err(DomainError::Upstream(format!(
            "{protocol} exchange with {server} failed: {e}"
        ))),
        Err(_) => Err(DomainError::Upstream(format!(
            "{protocol} exchange with {server} timed out after {}ms",
            timeout.as_millis()
        ))),
    }
}
