use super::handler::{DnsHandler, Protocol};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream, UdpSocket};
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

const MAX_DATAGRAM: usize = 65535;

/// UDP and TCP listeners feeding a shared `DnsHandler`.
///
/// Each datagram and each TCP connection runs in its own task. A
/// semaphore bounds the queries being resolved at once; new datagrams
/// wait for a permit, which applies back-pressure to the socket.
pub struct DnsServer {
    handler: Arc<DnsHandler>,
    permits: Arc<Semaphore>,
    tcp_idle_timeout: Duration,
}

impl DnsServer {
    pub fn new(
        handler: Arc<DnsHandler>,
        max_concurrent_queries: usize,
        tcp_idle_timeout: Duration,
    ) -> Self {
        Self {
            handler,
            permits: Arc::new(Semaphore::new(max_concurrent_queries.max(1))),
            tcp_idle_timeout,
        }
    }

    pub async fn serve_udp(
        &self,
        socket: UdpSocket,
        shutdown: CancellationToken,
    ) -> std::io::Result<()> {
        let socket = Arc::new(socket);
        info!(protocol = "UDP", bind_address = %socket.local_addr()?, "DNS server listening");
        let mut buf = vec![0u8; MAX_DATAGRAM];

        loop {
            let (len, peer) = tokio::select! {
                _ = shutdown.cancelled() => break,
                received = socket.recv_from(&mut buf) => match received {
                    Ok(received) => received,
                    Err(e) => {
                        // ICMP errors surface here on some platforms.
                        debug!(error = %e, "UDP receive failed");
                        continue;
                    }
                },
            };

            let Ok(permit) = self.permits.clone().acquire_owned().await else {
                break;
            };
            let request = buf[..len].to_vec();
            let handler = self.handler.clone();
            let socket = socket.clone();
            tokio::spawn(async move {
                let _permit = permit;
                if let Some(response) = handler.handle(&request, peer, Protocol::Udp).await {
                    if let Err(e) = socket.send_to(&response, peer).await {
                        debug!(peer = %peer, error = %e, "UDP send failed");
                    }
                }
            });
        }

        info!(protocol = "UDP", "DNS server stopped");
        Ok(())
    }

    pub async fn serve_tcp(
        &self,
        listener: TcpListener,
        shutdown: CancellationToken,
    ) -> std::io::Result<()> {
        info!(protocol = "TCP", bind_address = %listener.local_addr()?, "DNS server listening");

        loop {
            let (stream, peer) = tokio::select! {
                _ = shutdown.cancelled() => break,
                accepted = listener.accept() => match accepted {
                    Ok(accepted) => accepted,
                    Err(e) => {
                        warn!(error = %e, "TCP accept failed");
                        continue;
                    }
                },
            };

            let connection = TcpConnection {
                handler: self.handler.clone(),
                permits: self.permits.clone(),
                idle_timeout: self.tcp_idle_timeout,
                peer,
            };
            tokio::spawn(connection.run(stream, shutdown.clone()));
        }

        info!(protocol = "TCP", "DNS server stopped");
        Ok(())
    }
}

struct TcpConnection {
    handler: Arc<DnsHandler>,
    permits: Arc<Semaphore>,
    idle_timeout: Duration,
    peer: SocketAddr,
}

impl TcpConnection {
    /// Serve length-prefixed messages until the client closes, idles out or
    /// the server shuts down.
    async fn run(self, mut stream: TcpStream, shutdown: CancellationToken) {
        loop {
            let request = tokio::select! {
                _ = shutdown.cancelled() => break,
                read = tokio::time::timeout(self.idle_timeout, read_frame(&mut stream)) => match read {
                    Ok(Ok(Some(request))) => request,
                    Ok(Ok(None)) => break,
                    Ok(Err(e)) => {
                        debug!(peer = %self.peer, error = %e, "TCP read failed");
                        break;
                    }
                    Err(_) => {
                        debug!(peer = %self.peer, "TCP connection idle, closing");
                        break;
                    }
                },
            };

            let Ok(_permit) = self.permits.acquire().await else {
                break;
            };
            let response = self.handler.handle(&request, self.peer, Protocol::Tcp).await;
            let Some(response) = response else {
                continue;
            };
            if let Err(e) = write_frame(&mut stream, &response).await {
                debug!(peer = %self.peer, error = %e, "TCP write failed");
                break;
            }
        }
    }
}

/// One message with its two-byte length prefix; `None` on a clean close.
async fn read_frame(stream: &mut TcpStream) -> std::io::Result<Option<Vec<u8>>> {
    let mut length = [0u8; 2];
    match stream.read_exact(&mut length).await {
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(e),
    }
    let mut message = vec![0u8; u16::from_be_bytes(length) as usize];
    stream.read_exact(&mut message).await?;
    Ok(Some(message))
}

async fn write_frame(stream: &mut TcpStream, message: &[u8]) -> std::io::Result<()> {
    let length = u16::try_from(message.len())
        .map_err(|_| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, "response exceeds 65535 bytes")
        })?;
    let mut frame = Vec::with_capacity(2 + message.len());
    frame.extend_from_slice(&length.to_be_bytes());
    frame.extend_from_slice(message);
    stream.write_all(&frame).await
}
