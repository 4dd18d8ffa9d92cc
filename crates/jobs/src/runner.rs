use crate::{InvalidationJob, ZoneReloadJob};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Central orchestrator for all background jobs.
///
/// Register jobs with the builder methods, call `.start()` once and
/// `.shutdown()` to cancel every job and wait for it to finish.
///
/// # Example
///
/// ```rust,ignore
/// let jobs = JobRunner::new(shutdown.clone())
///     .with_invalidation(InvalidationJob::new(store, cache.clone(), keys))
///     .with_zone_reload(ZoneReloadJob::new(cache))
///     .start();
/// // ...
/// jobs.shutdown().await;
/// ```
pub struct JobRunner {
    shutdown: CancellationToken,
    invalidation: Option<InvalidationJob>,
    zone_reload: Option<ZoneReloadJob>,
    tasks: Vec<JoinHandle<()>>,
}

impl JobRunner {
    pub fn new(shutdown: CancellationToken) -> Self {
        Self {
            shutdown,
            invalidation: None,
            zone_reload: None,
            tasks: Vec::new(),
        }
    }

    pub fn with_invalidation(mut self, job: InvalidationJob) -> Self {
        self.invalidation = Some(job);
        self
    }

    pub fn with_zone_reload(mut self, job: ZoneReloadJob) -> Self {
        self.zone_reload = Some(job);
        self
    }

    /// Join an already spawned task on shutdown, e.g. the query logger.
    pub fn with_task(mut self, task: JoinHandle<()>) -> Self {
        self.tasks.push(task);
        self
    }

    /// Start all registered background jobs.
    pub fn start(mut self) -> Self {
        info!("Starting background job runner");

        if let Some(job) = self.invalidation.take() {
            let job = job.with_cancellation(self.shutdown.clone());
            self.tasks.push(Arc::new(job).start());
        }

        if let Some(job) = self.zone_reload.take() {
            let job = job.with_cancellation(self.shutdown.clone());
            self.tasks.push(Arc::new(job).start());
        }

        info!(jobs = self.tasks.len(), "All background jobs started");
        self
    }

    /// Cancel every job and wait for all of them.
    pub async fn shutdown(self) {
        self.shutdown.cancel();
        for task in self.tasks {
            if let Err(e) = task.await {
                warn!(error = %e, "Background job ended abnormally");
            }
        }
        info!("Background jobs stopped");
    }
}
