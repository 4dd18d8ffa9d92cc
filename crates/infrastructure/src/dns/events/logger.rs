use super::QueryEvent;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Consumer of query events, writing one access log line per query under
/// the `redzone::access` target.
pub struct QueryLogger {
    rx: mpsc::Receiver<QueryEvent>,
    access_log: bool,
}

impl QueryLogger {
    pub fn new(rx: mpsc::Receiver<QueryEvent>, access_log: bool) -> Self {
        Self { rx, access_log }
    }

    pub fn start(self, shutdown: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(self.run(shutdown))
    }

    async fn run(mut self, shutdown: CancellationToken) {
        debug!("Query logger started");
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                event = self.rx.recv() => match event {
                    Some(event) => self.log(&event),
                    None => break,
                },
            }
        }

        // Flush what was queued before shutdown.
        while let Ok(event) = self.rx.try_recv() {
            self.log(&event);
        }
        debug!("Query logger stopped");
    }

    fn log(&self, event: &QueryEvent) {
        if !self.access_log {
            return;
        }
        info!(
            target: "redzone::access",
            zone = event.zone.as_deref().unwrap_or("-"),
            name = %event.name,
            qtype = %event.record_type,
            rcode = %event.rcode,
            process_time_us = event.process_time_us,
            source = %event.source,
            country = event.country.as_deref().unwrap_or("-"),
            asn = event.asn.unwrap_or_default(),
            protocol = event.protocol,
            "query"
        );
    }
}
