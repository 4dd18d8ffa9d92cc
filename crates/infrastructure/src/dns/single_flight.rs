use dashmap::DashMap;
use rustc_hash::FxBuildHasher;
use std::future::Future;
use std::hash::Hash;
use std::sync::Arc;
use tokio::sync::OnceCell;

/// Coalesces concurrent work for the same key.
///
/// The first caller for a key runs the future; callers arriving while it is
/// in flight wait for and clone its result. The slot is released once the
/// result is published, so the next call after completion runs fresh work.
pub struct SingleFlight<K, V> {
    in_flight: DashMap<K, Arc<OnceCell<V>>, FxBuildHasher>,
}

impl<K, V> SingleFlight<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    pub fn new() -> Self {
        Self {
            in_flight: DashMap::with_hasher(FxBuildHasher),
        }
    }

    pub async fn run<F, Fut>(&self, key: K, work: F) -> V
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = V>,
    {
        let cell = self
            .in_flight
            .entry(key.clone())
            .or_insert_with(|| Arc::new(OnceCell::new()))
            .value()
            .clone();

        let value = cell.get_or_init(work).await.clone();

        self.in_flight
            .remove_if(&key, |_, current| Arc::ptr_eq(current, &cell));
        value
    }

    /// Keys with work currently in flight.
    pub fn len(&self) -> usize {
        self.in_flight.len()
    }

    pub fn is_empty(&self) -> bool {
        self.in_flight.is_empty()
    }
}

impl<K, V> Default for SingleFlight<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    fn default() -> Self {
        Self::new()
    }
}
