use super::matches_pattern;
use async_trait::async_trait;
use dashmap::DashMap;
use redzone_application::ports::{KeyValueStore, KeyspaceEvent};
use redzone_domain::DomainError;
use rustc_hash::{FxBuildHasher, FxHashSet};
use tokio::sync::{broadcast, mpsc};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

const EVENT_BUFFER: usize = 1024;
const SUBSCRIBER_BUFFER: usize = 256;

/// Process-local store with the same contract as the redis backend,
/// keyspace notifications included.
pub struct MemoryStore {
    values: DashMap<String, String, FxBuildHasher>,
    sets: DashMap<String, FxHashSet<String>, FxBuildHasher>,
    events: broadcast::Sender<KeyspaceEvent>,
}

impl MemoryStore {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_BUFFER);
        Self {
            values: DashMap::with_hasher(FxBuildHasher),
            sets: DashMap::with_hasher(FxBuildHasher),
            events,
        }
    }

    fn notify(&self, key: &str, operation: &str) {
        // No receivers just means nobody subscribed yet.
        let _ = self.events.send(KeyspaceEvent::new(key, operation));
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, DomainError> {
        Ok(self.values.get(key).map(|v| v.value().clone()))
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), DomainError> {
        self.values.insert(key.to_string(), value.to_string());
        self.notify(key, "set");
        Ok(())
    }

    async fn del(&self, key: &str) -> Result<(), DomainError> {
        let removed = self.values.remove(key).is_some() | self.sets.remove(key).is_some();
        if removed {
            self.notify(key, "del");
        }
        Ok(())
    }

    async fn sadd(&self, key: &str, member: &str) -> Result<(), DomainError> {
        let added = self
            .sets
            .entry(key.to_string())
            .or_default()
            .insert(member.to_string());
        if added {
            self.notify(key, "sadd");
        }
        Ok(())
    }

    async fn srem(&self, key: &str, member: &str) -> Result<(), DomainError> {
        let removed = self
            .sets
            .get_mut(key)
            .map(|mut set| set.remove(member))
            .unwrap_or(false);
        if removed {
            self.notify(key, "srem");
        }
        Ok(())
    }

    async fn smembers(&self, key: &str) -> Result<Vec<String>, DomainError> {
        Ok(self
            .sets
            .get(key)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default())
    }

    async fn scan(&self, pattern: &str) -> Result<Vec<String>, DomainError> {
        Ok(self
            .values
            .iter()
            .filter(|entry| matches_pattern(pattern, entry.key()))
            .map(|entry| entry.key().clone())
            .collect())
    }

    fn subscribe(
        &self,
        pattern: &str,
        shutdown: CancellationToken,
    ) -> mpsc::Receiver<KeyspaceEvent> {
        let (tx, rx) = mpsc::channel(SUBSCRIBER_BUFFER);
        let mut events = self.events.subscribe();
        let pattern = pattern.to_string();

        tokio::spawn(async move {
            debug!(pattern = %pattern, "Memory keyspace subscriber started");
            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => break,
                    received = events.recv() => match received {
                        Ok(event) => {
                            if matches_pattern(&pattern, &event.key) && tx.send(event).await.is_err() {
                                break;
                            }
                        }
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            warn!(pattern = %pattern, skipped, "Keyspace subscriber lagged");
                        }
                        Err(broadcast::error::RecvError::Closed) => break,
                    },
                }
            }
            debug!(pattern = %pattern, "Memory keyspace subscriber stopped");
        });

        rx
    }
}
