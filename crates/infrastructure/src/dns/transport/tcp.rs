use super::{with_deadline, DnsTransport};
use async_trait::async_trait;
use redzone_domain::DomainError;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::debug;

/// Two-byte length framing, one connection per query.
pub struct TcpTransport {
    server_addr: SocketAddr,
}

impl TcpTransport {
    pub fn new(server_addr: SocketAddr) -> Self {
        Self { server_addr }
    }

    async fn round_trip(&self, query: &[u8], length: u16) -> std::io::Result<Vec<u8>> {
        let mut stream = TcpStream::connect(self.server_addr).await?;

        let mut frame = Vec::with_capacity(2 + query.len());
        frame.extend_from_slice(&length.to_be_bytes());
        frame.extend_from_slice(query);
        stream.write_all(&frame).await?;

        let mut prefix = [0u8; 2];
        stream.read_exact(&mut prefix).await?;
        let mut response = vec![0u8; usize::from(u16::from_be_bytes(prefix))];
        stream.read_exact(&mut response).await?;
        Ok(response)
    }
}

#[async_trait]
impl DnsTransport for TcpTransport {
    async fn exchange(&self, query: &[u8], timeout: Duration) -> Result<Vec<u8>, DomainError> {
        let length = u16::try_from(query.len())
            .map_err(|_| DomainError::Upstream("DNS message exceeds TCP frame size".to_string()))?;

        let response =
            with_deadline(self.server_addr, "TCP", timeout, self.round_trip(query, length)).await?;
        debug!(server = %self.server_addr, bytes_received = response.len(), "TCP response received");
        Ok(response)
    }

    fn server_addr(&self) -> SocketAddr {
        self.server_addr
    }
}
