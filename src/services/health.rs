//! Periodic liveness monitor for the analysis service.
//!
//! The monitor probes `GET /api/test` as soon as it becomes active and then
//! on a fixed interval. It goes quiet while a completed report is on screen
//! and probes again immediately once the job is reset. A probe that has not
//! answered within one interval counts as offline. Probe failures only
//! change the published status; they are never returned to the caller.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::models::health::{HealthStatus, ServiceHealth};
use crate::models::job::{Job, JobStage};
use crate::services::backend::{AnalysisBackend, BackendError};

pub struct HealthMonitor {
    backend: Arc<dyn AnalysisBackend>,
    health: watch::Sender<ServiceHealth>,
    interval: Duration,
}

impl HealthMonitor {
    pub fn new(backend: Arc<dyn AnalysisBackend>, interval: Duration) -> Self {
        let (health, _) = watch::channel(ServiceHealth::default());
        Self {
            backend,
            health,
            interval,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<ServiceHealth> {
        self.health.subscribe()
    }

    pub fn current(&self) -> ServiceHealth {
        self.health.borrow().clone()
    }

    /// Probe the service once and publish the outcome.
    pub async fn probe(&self) -> HealthStatus {
        let outcome = tokio::time::timeout(self.interval, self.backend.probe())
            .await
            .unwrap_or(Err(BackendError::TimedOut(self.interval)));

        let (status, message) = match outcome {
            Ok(()) => (HealthStatus::Online, None),
            Err(e) => {
                tracing::warn!(error = %e, "Analysis service probe failed");
                (HealthStatus::Offline, Some(e.to_string()))
            }
        };

        metrics::counter!("audit_health_probes_total", "status" => status.to_string())
            .increment(1);

        self.health.send_modify(|h| h.record(status, message));
        tracing::debug!(status = %status, "Service health updated");
        status
    }

    /// Start the probe loop. It follows `job` to decide when to pause and
    /// stops when `shutdown` is cancelled.
    pub fn start(
        self: Arc<Self>,
        job: watch::Receiver<Job>,
        shutdown: CancellationToken,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            self.run(job, shutdown).await;
        })
    }

    async fn run(&self, mut job: watch::Receiver<Job>, shutdown: CancellationToken) {
        tracing::info!(
            interval_secs = self.interval.as_secs(),
            "Health monitor started"
        );

        'active: loop {
            if report_displayed(&job.borrow_and_update()) {
                tracing::debug!("Report displayed, health monitor suspended");
                tokio::select! {
                    biased;
                    _ = shutdown.cancelled() => break 'active,
                    changed = job.changed() => {
                        if changed.is_err() {
                            break 'active;
                        }
                        continue 'active;
                    }
                }
            }

            // First tick completes immediately.
            let mut ticker = tokio::time::interval(self.interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    biased;
                    _ = shutdown.cancelled() => break 'active,
                    changed = job.changed() => {
                        if changed.is_err() {
                            break 'active;
                        }
                        if report_displayed(&job.borrow_and_update()) {
                            continue 'active;
                        }
                    }
                    _ = ticker.tick() => {
                        tokio::select! {
                            biased;
                            _ = shutdown.cancelled() => break 'active,
                            _ = self.probe() => {}
                        }
                    }
                }
            }
        }

        tracing::info!("Health monitor stopped");
    }
}

fn report_displayed(job: &Job) -> bool {
    job.stage == JobStage::Completed
}
