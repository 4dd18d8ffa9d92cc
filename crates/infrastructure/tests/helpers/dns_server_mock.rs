#![allow(dead_code)]
use hickory_proto::op::{Message, MessageType, ResponseCode};
use hickory_proto::rr::rdata::A;
use hickory_proto::rr::{RData, Record, RecordType};
use std::net::{Ipv4Addr, SocketAddr};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::net::UdpSocket;
use tokio::sync::oneshot;

/// Upstream stand-in answering every A query with one fixed address, or
/// with a fixed error rcode.
pub struct MockDnsServer {
    addr: SocketAddr,
    queries: Arc<AtomicUsize>,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

#[derive(Debug, Clone, Copy)]
pub enum MockAnswer {
    Address { ip: Ipv4Addr, ttl: u32 },
    Error(ResponseCode),
}

impl MockDnsServer {
    /// Bind on an ephemeral loopback port.
    pub async fn start(answer: MockAnswer) -> std::io::Result<Self> {
        let socket = UdpSocket::bind("127.0.0.1:0").await?;
        let addr = socket.local_addr()?;
        let queries = Arc::new(AtomicUsize::new(0));
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel();

        let counter = queries.clone();
        tokio::spawn(async move {
            let mut buf = vec![0u8; 4096];
            loop {
                tokio::select! {
                    _ = &mut shutdown_rx => break,
                    result = socket.recv_from(&mut buf) => {
                        if let Ok((len, peer)) = result {
                            counter.fetch_add(1, Ordering::SeqCst);
                            if let Some(response) = Self::build_response(&buf[..len], answer) {
                                let _ = socket.send_to(&response, peer).await;
                            }
                        }
                    }
                }
            }
        });

        Ok(Self {
            addr,
            queries,
            shutdown_tx: Some(shutdown_tx),
        })
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn queries(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }

    fn build_response(query: &[u8], answer: MockAnswer) -> Option<Vec<u8>> {
        let request = Message::from_vec(query).ok()?;
        let question = request.queries().first()?.clone();

        let mut response = Message::new();
        response
            .set_id(request.id())
            .set_message_type(MessageType::Response)
            .set_recursion_desired(true)
            .set_recursion_available(true)
            .add_query(question.clone());

        match answer {
            MockAnswer::Address { ip, ttl } if question.query_type() == RecordType::A => {
                response.add_answer(Record::from_rdata(
                    question.name().clone(),
                    ttl,
                    RData::A(A::from(ip)),
                ));
            }
            MockAnswer::Address { .. } => {}
            MockAnswer::Error(rcode) => {
                response.set_response_code(rcode);
            }
        }
        response.to_vec().ok()
    }

    pub fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

impl Drop for MockDnsServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}
