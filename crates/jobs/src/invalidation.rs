use redzone_application::ports::{KeyValueStore, KeyspaceEvent, ZoneIndex};
use redzone_domain::KeyLayout;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Applies keyspace events of the zone store to the zone index.
///
/// Two subscriptions are held: one on the zone-name set and one on every
/// per-zone key. Each is owned by a store task that reconnects on its own;
/// this job only consumes their channels.
pub struct InvalidationJob {
    store: Arc<dyn KeyValueStore>,
    index: Arc<dyn ZoneIndex>,
    keys: KeyLayout,
    shutdown: CancellationToken,
}

impl InvalidationJob {
    pub fn new(store: Arc<dyn KeyValueStore>, index: Arc<dyn ZoneIndex>, keys: KeyLayout) -> Self {
        Self {
            store,
            index,
            keys,
            shutdown: CancellationToken::new(),
        }
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.shutdown = token;
        self
    }

    pub fn start(self: Arc<Self>) -> JoinHandle<()> {
        let zone_list = self
            .store
            .subscribe(&self.keys.zone_list_pattern(), self.shutdown.clone());
        let zone_data = self
            .store
            .subscribe(&self.keys.zone_data_pattern(), self.shutdown.clone());
        info!(
            zone_list = %self.keys.zone_list_pattern(),
            zone_data = %self.keys.zone_data_pattern(),
            "Starting invalidation job"
        );

        tokio::spawn(async move { self.run(zone_list, zone_data).await })
    }

    async fn run(
        &self,
        mut zone_list: mpsc::Receiver<KeyspaceEvent>,
        mut zone_data: mpsc::Receiver<KeyspaceEvent>,
    ) {
        let mut list_open = true;
        let mut data_open = true;

        while list_open || data_open {
            tokio::select! {
                _ = self.shutdown.cancelled() => break,
                event = zone_list.recv(), if list_open => match event {
                    Some(event) => self.apply(&event),
                    None => list_open = false,
                },
                event = zone_data.recv(), if data_open => match event {
                    Some(event) => self.apply(&event),
                    None => data_open = false,
                },
            }
        }
        info!("InvalidationJob: shutting down");
    }

    fn apply(&self, event: &KeyspaceEvent) {
        debug!(key = %event.key, operation = %event.operation, "Keyspace event");
        self.index.apply_event(event);
    }
}
