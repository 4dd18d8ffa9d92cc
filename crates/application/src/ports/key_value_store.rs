use async_trait::async_trait;
use redzone_domain::DomainError;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// A change notification for one key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyspaceEvent {
    pub key: String,
    /// Store command that touched the key (`set`, `del`, `sadd`, `expired`, ...)
    pub operation: String,
}

impl KeyspaceEvent {
    pub fn new(key: impl Into<String>, operation: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            operation: operation.into(),
        }
    }

    /// Whether the key was removed rather than written.
    pub fn is_removal(&self) -> bool {
        matches!(self.operation.as_str(), "del" | "expired" | "evicted")
    }
}

/// Remote key/value + set + pub/sub store holding zone data.
///
/// Patterns are globs with a single trailing `*`, matched against full keys.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, DomainError>;

    async fn set(&self, key: &str, value: &str) -> Result<(), DomainError>;

    async fn del(&self, key: &str) -> Result<(), DomainError>;

    async fn sadd(&self, key: &str, member: &str) -> Result<(), DomainError>;

    async fn srem(&self, key: &str, member: &str) -> Result<(), DomainError>;

    async fn smembers(&self, key: &str) -> Result<Vec<String>, DomainError>;

    /// All keys matching `pattern`.
    async fn scan(&self, pattern: &str) -> Result<Vec<String>, DomainError>;

    /// Start a task that owns a subscription for keys matching `pattern`
    /// and forwards their change events until `shutdown` fires. The task
    /// reconnects on its own after transient failures.
    fn subscribe(
        &self,
        pattern: &str,
        shutdown: CancellationToken,
    ) -> mpsc::Receiver<KeyspaceEvent>;
}
