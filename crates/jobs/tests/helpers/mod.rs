#![allow(dead_code)]

use async_trait::async_trait;
use redzone_application::ports::{KeyValueStore, KeyspaceEvent, ZoneIndex};
use redzone_domain::DomainError;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

pub const PREFIX: &str = "redzone:";

// ============================================================================
// Mock ZoneIndex
// ============================================================================

#[derive(Default)]
pub struct MockZoneIndex {
    events: Mutex<Vec<KeyspaceEvent>>,
    dirty: AtomicBool,
    reloads: AtomicUsize,
    fail_reload: AtomicBool,
}

impl MockZoneIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<KeyspaceEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn reloads(&self) -> usize {
        self.reloads.load(Ordering::SeqCst)
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty.load(Ordering::SeqCst)
    }

    pub fn set_fail_reload(&self, fail: bool) {
        self.fail_reload.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl ZoneIndex for MockZoneIndex {
    fn apply_event(&self, event: &KeyspaceEvent) {
        if event.key == format!("{PREFIX}zones") {
            self.mark_zone_list_dirty();
        }
        self.events.lock().unwrap().push(event.clone());
    }

    fn mark_zone_list_dirty(&self) {
        self.dirty.store(true, Ordering::SeqCst);
    }

    fn take_zone_list_dirty(&self) -> bool {
        self.dirty.swap(false, Ordering::SeqCst)
    }

    async fn reload_zone_list(&self) -> Result<usize, DomainError> {
        self.reloads.fetch_add(1, Ordering::SeqCst);
        if self.fail_reload.load(Ordering::SeqCst) {
            self.mark_zone_list_dirty();
            return Err(DomainError::StoreUnavailable("mock store down".to_string()));
        }
        Ok(1)
    }
}

// ============================================================================
// Mock store: only subscriptions are used by the jobs
// ============================================================================

#[derive(Default)]
pub struct MockSubscriptionStore {
    subscribers: Mutex<HashMap<String, mpsc::Sender<KeyspaceEvent>>>,
}

impl MockSubscriptionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn patterns(&self) -> Vec<String> {
        let mut patterns: Vec<String> = self.subscribers.lock().unwrap().keys().cloned().collect();
        patterns.sort();
        patterns
    }

    pub async fn publish(&self, pattern: &str, key: &str, operation: &str) {
        let sender = self.subscribers.lock().unwrap().get(pattern).cloned();
        sender
            .expect("no subscriber for pattern")
            .send(KeyspaceEvent::new(key, operation))
            .await
            .unwrap();
    }

    /// Drop the sending side, as a store task does when it gives up.
    pub fn close(&self, pattern: &str) {
        self.subscribers.lock().unwrap().remove(pattern);
    }
}

#[async_trait]
impl KeyValueStore for MockSubscriptionStore {
    async fn get(&self, _key: &str) -> Result<Option<String>, DomainError> {
        Ok(None)
    }

    async fn set(&self, _key: &str, _value: &str) -> Result<(), DomainError> {
        Ok(())
    }

    async fn del(&self, _key: &str) -> Result<(), DomainError> {
        Ok(())
    }

    async fn sadd(&self, _key: &str, _member: &str) -> Result<(), DomainError> {
        Ok(())
    }

    async fn srem(&self, _key: &str, _member: &str) -> Result<(), DomainError> {
        Ok(())
    }

    async fn smembers(&self, _key: &str) -> Result<Vec<String>, DomainError> {
        Ok(Vec::new())
    }

    async fn scan(&self, _pattern: &str) -> Result<Vec<String>, DomainError> {
        Ok(Vec::new())
    }

    fn subscribe(
        &self,
        pattern: &str,
        _shutdown: CancellationToken,
    ) -> mpsc::Receiver<KeyspaceEvent> {
        let (tx, rx) = mpsc::channel(16);
        self.subscribers.lock().unwrap().insert(pattern.to_string(), tx);
        rx
    }
}

/// Poll `check` until it holds or a second has passed.
pub async fn eventually<F: Fn() -> bool>(check: F) -> bool {
    for _ in 0..100 {
        if check() {
            return true;
        }
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }
    check()
}

pub fn index() -> Arc<MockZoneIndex> {
    Arc::new(MockZoneIndex::new())
}
