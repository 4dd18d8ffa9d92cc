use async_trait::async_trait;
use futures::StreamExt;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client, RedisError};
use redzone_application::ports::{KeyValueStore, KeyspaceEvent};
use redzone_domain::config::StoreConfig;
use redzone_domain::DomainError;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Semaphore, SemaphorePermit};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

const SCAN_BATCH: usize = 200;
const SUBSCRIBER_BUFFER: usize = 1024;

fn map_redis_error(e: RedisError) -> DomainError {
    if e.is_io_error() || e.is_connection_refusal() || e.is_connection_dropped() || e.is_timeout()
    {
        DomainError::StoreUnavailable(e.to_string())
    } else {
        DomainError::Store(e.to_string())
    }
}

/// Redis-backed zone store.
///
/// Commands run over a fixed pool of multiplexed connections, picked round
/// robin. A semaphore bounds the commands in flight; with
/// `wait_for_connection = false` a saturated pool fails immediately.
pub struct RedisStore {
    client: Client,
    connections: Vec<ConnectionManager>,
    next: AtomicUsize,
    permits: Arc<Semaphore>,
    wait_for_connection: bool,
    reconnect_delay: Duration,
    db: i64,
}

impl RedisStore {
    pub async fn connect(config: &StoreConfig) -> Result<Self, DomainError> {
        let client = Client::open(config.url.as_str()).map_err(map_redis_error)?;
        let connect_timeout = Duration::from_millis(config.connect_timeout_ms);
        let pool_size = config.pool_size.max(1);

        let mut connections = Vec::with_capacity(pool_size);
        for _ in 0..pool_size {
            let connect = ConnectionManager::new(client.clone());
            let manager = tokio::time::timeout(connect_timeout, connect)
                .await
                .map_err(|_| {
                    DomainError::StoreUnavailable(format!("Timeout connecting to {}", config.url))
                })?
                .map_err(map_redis_error)?;
            connections.push(manager);
        }

        let store = Self {
            db: client.get_connection_info().redis.db,
            client,
            connections,
            next: AtomicUsize::new(0),
            permits: Arc::new(Semaphore::new(config.max_active.max(1))),
            wait_for_connection: config.wait_for_connection,
            reconnect_delay: Duration::from_millis(config.reconnect_delay_ms),
        };
        store.enable_keyspace_events().await;

        info!(
            pool_size = pool_size,
            max_active = config.max_active,
            db = store.db,
            "Connected to redis store"
        );
        Ok(store)
    }

    /// Keyspace notifications are off by default on redis. Managed servers
    /// often forbid CONFIG, so failure is only logged.
    async fn enable_keyspace_events(&self) {
        let mut conn = self.connections[0].clone();
        let result: Result<(), RedisError> = redis::cmd("CONFIG")
            .arg("SET")
            .arg("notify-keyspace-events")
            .arg("Kg$s")
            .query_async(&mut conn)
            .await;
        if let Err(e) = result {
            warn!(error = %e, "Could not enable keyspace notifications; configure them on the server");
        }
    }

    async fn acquire(&self) -> Result<(SemaphorePermit<'_>, ConnectionManager), DomainError> {
        let permit = if self.wait_for_connection {
            self.permits
                .acquire()
                .await
                .map_err(|e| DomainError::StoreUnavailable(e.to_string()))?
        } else {
            self.permits.try_acquire().map_err(|_| {
                DomainError::StoreUnavailable("Connection pool saturated".to_string())
            })?
        };
        let index = self.next.fetch_add(1, Ordering::Relaxed) % self.connections.len();
        Ok((permit, self.connections[index].clone()))
    }
}

#[async_trait]
impl KeyValueStore for RedisStore {
    async fn get(&self, key: &str) -> Result<Option<String>, DomainError> {
        let (_permit, mut conn) = self.acquire().await?;
        conn.get::<_, Option<String>>(key)
            .await
            .map_err(map_redis_error)
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), DomainError> {
        let (_permit, mut conn) = self.acquire().await?;
        conn.set::<_, _, ()>(key, value)
            .await
            .map_err(map_redis_error)
    }

    async fn del(&self, key: &str) -> Result<(), DomainError> {
        let (_permit, mut conn) = self.acquire().await?;
        conn.del::<_, ()>(key).await.map_err(map_redis_error)
    }

    async fn sadd(&self, key: &str, member: &str) -> Result<(), DomainError> {
        let (_permit, mut conn) = self.acquire().await?;
        conn.sadd::<_, _, ()>(key, member)
            .await
            .map_err(map_redis_error)
    }

    async fn srem(&self, key: &str, member: &str) -> Result<(), DomainError> {
        let (_permit, mut conn) = self.acquire().await?;
        conn.srem::<_, _, ()>(key, member)
            .await
            .map_err(map_redis_error)
    }

    async fn smembers(&self, key: &str) -> Result<Vec<String>, DomainError> {
        let (_permit, mut conn) = self.acquire().await?;
        conn.smembers::<_, Vec<String>>(key)
            .await
            .map_err(map_redis_error)
    }

    async fn scan(&self, pattern: &str) -> Result<Vec<String>, DomainError> {
        let (_permit, mut conn) = self.acquire().await?;
        let mut found = Vec::new();
        let mut cursor = 0u64;

        loop {
            let (next_cursor, keys): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(pattern)
                .arg("COUNT")
                .arg(SCAN_BATCH)
                .query_async(&mut conn)
                .await
                .map_err(map_redis_error)?;

            found.extend(keys);
            cursor = next_cursor;
            if cursor == 0 {
                break;
            }
        }

        // SCAN may return a key more than once.
        found.sort_unstable();
        found.dedup();
        Ok(found)
    }

    fn subscribe(
        &self,
        pattern: &str,
        shutdown: CancellationToken,
    ) -> mpsc::Receiver<KeyspaceEvent> {
        let (tx, rx) = mpsc::channel(SUBSCRIBER_BUFFER);
        let subscriber = KeyspaceSubscriber {
            client: self.client.clone(),
            channel: format!("__keyspace@{}__:{}", self.db, pattern),
            reconnect_delay: self.reconnect_delay,
            tx,
        };
        tokio::spawn(subscriber.run(shutdown));
        rx
    }
}

/// Owns one pub/sub connection and re-subscribes after it drops.
struct KeyspaceSubscriber {
    client: Client,
    channel: String,
    reconnect_delay: Duration,
    tx: mpsc::Sender<KeyspaceEvent>,
}

enum SessionEnd {
    Shutdown,
    Disconnected,
}

impl KeyspaceSubscriber {
    async fn run(self, shutdown: CancellationToken) {
        info!(channel = %self.channel, "Keyspace subscriber started");
        loop {
            match self.session(&shutdown).await {
                Ok(SessionEnd::Shutdown) => break,
                Ok(SessionEnd::Disconnected) => {
                    warn!(channel = %self.channel, "Keyspace subscription dropped, reconnecting");
                }
                Err(e) => {
                    warn!(channel = %self.channel, error = %e, "Keyspace subscription failed");
                }
            }

            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = tokio::time::sleep(self.reconnect_delay) => {}
            }
        }
        info!(channel = %self.channel, "Keyspace subscriber stopped");
    }

    async fn session(&self, shutdown: &CancellationToken) -> Result<SessionEnd, RedisError> {
        let mut pubsub = self.client.get_async_connection().await?.into_pubsub();
        pubsub.psubscribe(&self.channel).await?;
        debug!(channel = %self.channel, "Keyspace subscription active");

        let mut messages = pubsub.on_message();
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => return Ok(SessionEnd::Shutdown),
                message = messages.next() => {
                    let Some(message) = message else {
                        return Ok(SessionEnd::Disconnected);
                    };
                    let Some(event) = parse_keyspace_message(
                        message.get_channel_name(),
                        message.get_payload::<String>().ok(),
                    ) else {
                        continue;
                    };
                    if self.tx.send(event).await.is_err() {
                        return Ok(SessionEnd::Shutdown);
                    }
                }
            }
        }
    }
}

/// `__keyspace@0__:<key>` with the operation as payload.
fn parse_keyspace_message(channel: &str, payload: Option<String>) -> Option<KeyspaceEvent> {
    let (_, key) = channel.split_once("__:")?;
    Some(KeyspaceEvent::new(key, payload?))
}
