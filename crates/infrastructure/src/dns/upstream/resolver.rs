use super::{UpstreamAnswer, UpstreamLookup};
use crate::dns::single_flight::SingleFlight;
use crate::dns::transport::tcp::TcpTransport;
use crate::dns::transport::{create_transport, DnsTransport, Transport};
use arc_swap::ArcSwap;
use async_trait::async_trait;
use hickory_proto::op::{Edns, Message, MessageType, OpCode, Query, ResponseCode};
use hickory_proto::rr::{DNSClass, Name, RecordType};
use lru::LruCache;
use redzone_domain::config::UpstreamConfig;
use redzone_domain::DomainError;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, warn};

const EDNS_PAYLOAD: u16 = 4096;

type CacheKey = (Name, RecordType);

struct UpstreamServer {
    transport: Transport,
    timeout: Duration,
}

struct CachedAnswer {
    answer: UpstreamAnswer,
    stored_at: Instant,
    expires_at: Instant,
}

impl CachedAnswer {
    /// The answer with TTLs reduced by the time spent in the cache.
    fn aged(&self, now: Instant) -> UpstreamAnswer {
        let elapsed = now.duration_since(self.stored_at).as_secs() as u32;
        let mut answer = self.answer.clone();
        for record in &mut answer.records {
            record.set_ttl(record.ttl().saturating_sub(elapsed));
        }
        answer
    }
}

/// Stub resolver over the configured upstream pool.
///
/// Servers are tried in order; the last one that answered moves to the
/// front. Answers are cached until their smallest TTL runs out and
/// concurrent identical queries share one exchange.
pub struct UpstreamResolver {
    servers: Vec<UpstreamServer>,
    order: ArcSwap<Vec<usize>>,
    cache: Mutex<LruCache<CacheKey, CachedAnswer>>,
    flight: SingleFlight<CacheKey, Result<UpstreamAnswer, DomainError>>,
}

impl UpstreamResolver {
    pub fn new(config: &UpstreamConfig) -> Result<Self, DomainError> {
        let servers = config
            .servers
            .iter()
            .map(|server| {
                Ok(UpstreamServer {
                    transport: create_transport(server)?,
                    timeout: Duration::from_millis(server.timeout_ms),
                })
            })
            .collect::<Result<Vec<_>, DomainError>>()?;

        let capacity = NonZeroUsize::new(config.cache_size.max(1)).unwrap_or(NonZeroUsize::MIN);

        Ok(Self {
            order: ArcSwap::from_pointee((0..servers.len()).collect()),
            servers,
            cache: Mutex::new(LruCache::new(capacity)),
            flight: SingleFlight::new(),
        })
    }

    pub fn server_count(&self) -> usize {
        self.servers.len()
    }

    async fn cached(&self, key: &CacheKey) -> Option<UpstreamAnswer> {
        let mut cache = self.cache.lock().await;
        let now = Instant::now();
        match cache.get(key) {
            Some(entry) if now < entry.expires_at => Some(entry.aged(now)),
            Some(_) => {
                cache.pop(key);
                None
            }
            None => None,
        }
    }

    async fn store(&self, key: CacheKey, answer: &UpstreamAnswer) {
        let Some(min_ttl) = answer.records.iter().map(|r| r.ttl()).min() else {
            return;
        };
        if min_ttl == 0 {
            return;
        }
        let now = Instant::now();
        self.cache.lock().await.put(
            key,
            CachedAnswer {
                answer: answer.clone(),
                stored_at: now,
                expires_at: now + Duration::from_secs(u64::from(min_ttl)),
            },
        );
    }

    async fn resolve(
        &self,
        name: &Name,
        record_type: RecordType,
    ) -> Result<UpstreamAnswer, DomainError> {
        let order = self.order.load_full();

        for &index in order.iter() {
            let server = &self.servers[index];
            match exchange(server, name, record_type).await {
                Ok(answer) if is_terminal(answer.rcode) => {
                    self.promote(index);
                    return Ok(answer);
                }
                Ok(answer) => {
                    debug!(
                        server = %server.transport.server_addr(),
                        rcode = %answer.rcode,
                        name = %name,
                        "Upstream returned non-terminal rcode, trying next"
                    );
                }
                Err(e) => {
                    warn!(
                        server = %server.transport.server_addr(),
                        name = %name,
                        error = %e,
                        "Upstream exchange failed"
                    );
                }
            }
        }

        Err(DomainError::UpstreamExhausted(name.to_ascii()))
    }

    fn promote(&self, index: usize) {
        let current = self.order.load();
        if current.first() == Some(&index) {
            return;
        }
        let mut order: Vec<usize> = Vec::with_capacity(current.len());
        order.push(index);
        order.extend(current.iter().copied().filter(|&i| i != index));
        self.order.store(Arc::new(order));
    }
}

fn is_terminal(rcode: ResponseCode) -> bool {
    matches!(rcode, ResponseCode::NoError | ResponseCode::NXDomain)
}

fn build_query(name: &Name, record_type: RecordType) -> Result<(u16, Vec<u8>), DomainError> {
    let mut query = Query::new();
    query.set_name(name.clone());
    query.set_query_type(record_type);
    query.set_query_class(DNSClass::IN);

    let id = fastrand::u16(..);
    let mut message = Message::new();
    message
        .set_id(id)
        .set_message_type(MessageType::Query)
        .set_op_code(OpCode::Query)
        .set_recursion_desired(true)
        .add_query(query);

    let mut edns = Edns::new();
    edns.set_max_payload(EDNS_PAYLOAD);
    message.set_edns(edns);

    let bytes = message
        .to_vec()
        .map_err(|e| DomainError::Upstream(format!("Failed to serialize query: {e}")))?;
    Ok((id, bytes))
}

fn parse_response(id: u16, bytes: &[u8]) -> Result<Message, DomainError> {
    let message = Message::from_vec(bytes)
        .map_err(|e| DomainError::Upstream(format!("Failed to parse DNS response: {e}")))?;
    if message.id() != id {
        return Err(DomainError::Upstream(format!(
            "Response id {} does not match query id {}",
            message.id(),
            id
        )));
    }
    Ok(message)
}

async fn exchange(
    server: &UpstreamServer,
    name: &Name,
    record_type: RecordType,
) -> Result<UpstreamAnswer, DomainError> {
    let (id, bytes) = build_query(name, record_type)?;
    let response = server.transport.exchange(&bytes, server.timeout).await?;
    let mut message = parse_response(id, &response)?;

    if message.truncated() && server.transport.is_udp() {
        debug!(server = %server.transport.server_addr(), name = %name, "Truncated UDP answer, retrying over TCP");
        let tcp = TcpTransport::new(server.transport.server_addr());
        let response = tcp.exchange(&bytes, server.timeout).await?;
        message = parse_response(id, &response)?;
    }

    Ok(UpstreamAnswer {
        rcode: message.response_code(),
        records: message.take_answers(),
    })
}

#[async_trait]
impl UpstreamLookup for UpstreamResolver {
    async fn lookup(
        &self,
        name: &Name,
        record_type: RecordType,
    ) -> Result<UpstreamAnswer, DomainError> {
        let mut name = name.to_lowercase();
        name.set_fqdn(true);
        let key = (name, record_type);

        if let Some(answer) = self.cached(&key).await {
            return Ok(answer);
        }

        self.flight
            .run(key.clone(), || async {
                let answer = self.resolve(&key.0, key.1).await?;
                self.store(key.clone(), &answer).await;
                Ok(answer)
            })
            .await
    }
}
