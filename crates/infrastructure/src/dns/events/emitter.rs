use super::QueryEvent;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::warn;

/// Non-blocking emitter for query events.
///
/// Events go through a bounded channel with `try_send`, so the request
/// path never awaits the consumer. When the queue is full the event is
/// dropped; a warning is logged for the first drop and every 1000th after.
#[derive(Clone)]
pub struct QueryEventEmitter {
    /// `None` when query logging is disabled and `emit` is a no-op
    sender: Option<mpsc::Sender<QueryEvent>>,
    dropped: Arc<AtomicU64>,
}

impl QueryEventEmitter {
    pub fn new_disabled() -> Self {
        Self {
            sender: None,
            dropped: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Creates an enabled emitter and the receiver for the consumer task.
    pub fn new_enabled(capacity: usize) -> (Self, mpsc::Receiver<QueryEvent>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let emitter = Self {
            sender: Some(tx),
            dropped: Arc::new(AtomicU64::new(0)),
        };
        (emitter, rx)
    }

    pub fn emit(&self, event: QueryEvent) {
        let Some(tx) = &self.sender else {
            return;
        };
        match tx.try_send(event) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(_)) => {
                let dropped = self.dropped.fetch_add(1, Ordering::Relaxed);
                if dropped % 1000 == 0 {
                    warn!(dropped = dropped + 1, "Query log queue full, dropping events");
                }
            }
            // Consumer gone during shutdown.
            Err(mpsc::error::TrySendError::Closed(_)) => {}
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.sender.is_some()
    }

    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

impl Default for QueryEventEmitter {
    fn default() -> Self {
        Self::new_disabled()
    }
}

impl std::fmt::Debug for QueryEventEmitter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryEventEmitter")
            .field("enabled", &self.is_enabled())
            .field("dropped", &self.dropped())
            .finish()
    }
}
