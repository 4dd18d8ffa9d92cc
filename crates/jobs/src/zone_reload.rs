use redzone_application::ports::ZoneIndex;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// Reloads the authoritative zone-name set when it was marked dirty.
///
/// The check runs every `interval`; every `forced_interval` the set is
/// marked dirty regardless, which recovers from missed notifications.
pub struct ZoneReloadJob {
    index: Arc<dyn ZoneIndex>,
    interval: Duration,
    forced_interval: Duration,
    shutdown: CancellationToken,
}

impl ZoneReloadJob {
    pub fn new(index: Arc<dyn ZoneIndex>) -> Self {
        Self {
            index,
            interval: Duration::from_secs(10),
            forced_interval: Duration::from_secs(3600),
            shutdown: CancellationToken::new(),
        }
    }

    pub fn with_intervals(mut self, interval: Duration, forced_interval: Duration) -> Self {
        self.interval = interval;
        self.forced_interval = forced_interval;
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.shutdown = token;
        self
    }

    pub fn start(self: Arc<Self>) -> JoinHandle<()> {
        info!(
            interval_secs = self.interval.as_secs(),
            forced_interval_secs = self.forced_interval.as_secs(),
            "Starting zone reload job"
        );

        tokio::spawn(async move {
            let now = Instant::now();
            let mut check = interval_at(now + self.interval, self.interval);
            let mut forced = interval_at(now + self.forced_interval, self.forced_interval);
            check.set_missed_tick_behavior(MissedTickBehavior::Delay);
            forced.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = self.shutdown.cancelled() => {
                        info!("ZoneReloadJob: shutting down");
                        break;
                    }
                    _ = check.tick() => {
                        self.reload_if_dirty().await;
                    }
                    _ = forced.tick() => self.index.mark_zone_list_dirty(),
                }
            }
        })
    }

    /// Returns whether a reload was attempted.
    pub async fn reload_if_dirty(&self) -> bool {
        if !self.index.take_zone_list_dirty() {
            return false;
        }
        if let Err(e) = self.index.reload_zone_list().await {
            error!(error = %e, "Zone list reload failed");
        }
        true
    }
}
