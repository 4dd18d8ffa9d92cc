pub mod memory;
pub mod redis;

pub use memory::MemoryStore;
pub use redis::RedisStore;

use redzone_application::ports::KeyValueStore;
use redzone_domain::config::{StoreBackend, StoreConfig};
use redzone_domain::DomainError;
use std::sync::Arc;

/// Glob match supporting a single trailing `*`.
pub(crate) fn matches_pattern(pattern: &str, key: &str) -> bool {
    match pattern.strip_suffix('*') {
        Some(prefix) => key.starts_with(prefix),
        None => pattern == key,
    }
}

/// Open the backend selected by `config`.
pub async fn connect(config: &StoreConfig) -> Result<Arc<dyn KeyValueStore>, DomainError> {
    match config.backend {
        StoreBackend::Redis => Ok(Arc::new(RedisStore::connect(config).await?)),
        StoreBackend::Memory => Ok(Arc::new(MemoryStore::new())),
    }
}
