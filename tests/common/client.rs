use hickory_proto::op::{Edns, Message, MessageType, OpCode, Query};
use hickory_proto::rr::{Name, RecordType};
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpStream, UdpSocket};

type ClientResult<T> = Result<T, Box<dyn std::error::Error>>;

const TIMEOUT: Duration = Duration::from_secs(2);

/// Wire DNS client speaking to a `TestServer`.
pub struct TestClient {
    udp_addr: SocketAddr,
    tcp_addr: SocketAddr,
}

impl TestClient {
    pub fn new(udp_addr: SocketAddr, tcp_addr: SocketAddr) -> Self {
        Self { udp_addr, tcp_addr }
    }

    pub fn request(qname: &str, qtype: RecordType) -> Message {
        let mut message = Message::new();
        message
            .set_id(message_id(qname))
            .set_message_type(MessageType::Query)
            .set_op_code(OpCode::Query)
            .add_query(Query::query(Name::from_str(qname).unwrap(), qtype));
        message
    }

    pub fn with_edns(mut message: Message, max_payload: u16, dnssec_ok: bool) -> Message {
        let mut edns = Edns::new();
        edns.set_max_payload(max_payload);
        edns.set_dnssec_ok(dnssec_ok);
        message.set_edns(edns);
        message
    }

    pub async fn query(&self, qname: &str, qtype: RecordType) -> ClientResult<Message> {
        self.send_udp(&Self::request(qname, qtype)).await
    }

    pub async fn send_udp(&self, message: &Message) -> ClientResult<Message> {
        let socket = UdpSocket::bind("127.0.0.1:0").await?;
        socket.send_to(&message.to_vec()?, self.udp_addr).await?;

        let mut buf = vec![0u8; 65535];
        let (len, _) = tokio::time::timeout(TIMEOUT, socket.recv_from(&mut buf)).await??;
        Ok(Message::from_vec(&buf[..len])?)
    }

    /// Sends every message over one TCP connection, in order.
    pub async fn send_tcp(&self, messages: &[Message]) -> ClientResult<Vec<Message>> {
        let mut stream = TcpStream::connect(self.tcp_addr).await?;
        let mut responses = Vec::with_capacity(messages.len());

        for message in messages {
            let bytes = message.to_vec()?;
            stream.write_all(&(bytes.len() as u16).to_be_bytes()).await?;
            stream.write_all(&bytes).await?;

            let mut len = [0u8; 2];
            tokio::time::timeout(TIMEOUT, stream.read_exact(&mut len)).await??;
            let mut body = vec![0u8; u16::from_be_bytes(len) as usize];
            tokio::time::timeout(TIMEOUT, stream.read_exact(&mut body)).await??;
            responses.push(Message::from_vec(&body)?);
        }

        Ok(responses)
    }
}

/// Stable per-name id so responses are easy to match in assertions.
fn message_id(qname: &str) -> u16 {
    qname
        .bytes()
        .fold(0x1234u16, |acc, b| acc.rotate_left(5) ^ u16::from(b))
}
