use super::{with_deadline, DnsTransport};
use async_trait::async_trait;
use redzone_domain::DomainError;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};
use std::time::Duration;
use tokio::net::UdpSocket;
use tracing::debug;

/// Largest answer accepted from an upstream over UDP.
const MAX_UDP_RESPONSE_SIZE: usize = 4096;

/// One ephemeral socket per query.
pub struct UdpTransport {
    server_addr: SocketAddr,
}

impl UdpTransport {
    pub fn new(server_addr: SocketAddr) -> Self {
        Self { server_addr }
    }

    fn local_addr(&self) -> SocketAddr {
        if self.server_addr.is_ipv4() {
            (Ipv4Addr::UNSPECIFIED, 0).into()
        } else {
            (Ipv6Addr::UNSPECIFIED, 0).into()
        }
    }

    /// The socket is connected, so datagrams from other sources never
    /// reach `recv`.
    async fn round_trip(&self, query: &[u8]) -> std::io::Result<Vec<u8>> {
        let socket = UdpSocket::bind(self.local_addr()).await?;
        socket.connect(self.server_addr).await?;
        socket.send(query).await?;

        let mut buf = vec![0u8; MAX_UDP_RESPONSE_SIZE];
        let len = socket.recv(&mut buf).await?;
        buf.truncate(len);
        Ok(buf)
    }
}

#[async_trait]
impl DnsTransport for UdpTransport {
    async fn exchange(&self, query: &[u8], timeout: Duration) -> Result<Vec<u8>, DomainError> {
        let response =
            with_deadline(self.server_addr, "UDP", timeout, self.round_trip(query)).await?;
        debug!(server = %self.server_addr, bytes_received = response.len(), "UDP response received");
        Ok(response)
    }

    fn server_addr(&self) -> SocketAddr {
        self.server_addr
    }
}
