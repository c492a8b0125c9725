//! Status poller for a submitted analysis job.
//!
//! One poller task tracks one job id. Every tick it issues a status request
//! without waiting for earlier requests to finish, so responses may arrive
//! out of order. By default the most recently *completed* response is
//! applied. With `discard_stale` set, each request carries a sequence number
//! and responses older than the last applied one are dropped. A request
//! unanswered after `request_timeout` fails like any other transport error,
//! which also caps how many requests can be outstanding at once.
//!
//! The task ends on a terminal stage, when its token is cancelled, when the
//! job it tracks has been replaced, or when the optional timeout elapses.

use std::sync::Arc;
use std::time::Duration;

use serde_json::Map;
use tokio::sync::watch;
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::models::api::{RemoteStage, StatusResponse};
use crate::models::job::{Job, JobFailure, STATUS_CHECK_FAILED, STATUS_CHECK_TIMED_OUT};
use crate::services::backend::{AnalysisBackend, BackendError};
use crate::services::report::Report;

#[derive(Debug, Clone)]
pub struct PollerConfig {
    pub interval: Duration,
    /// Deadline for each status request.
    pub request_timeout: Duration,
    pub discard_stale: bool,
    pub timeout: Option<Duration>,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(1),
            request_timeout: Duration::from_secs(10),
            discard_stale: false,
            timeout: None,
        }
    }
}

/// How a polling task ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    Completed,
    Failed,
    Cancelled,
    /// The job was reset or replaced while polling.
    Superseded,
}

/// Owner's handle on a running poller.
pub struct PollHandle {
    cancel: CancellationToken,
    task: JoinHandle<PollOutcome>,
}

impl PollHandle {
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Wait for the task to end.
    pub async fn finished(self) -> PollOutcome {
        match self.task.await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::error!(error = %e, "Status poller task aborted");
                PollOutcome::Cancelled
            }
        }
    }
}

enum Step {
    Continue,
    Done(PollOutcome),
}

#[derive(Clone)]
pub struct JobPoller {
    backend: Arc<dyn AnalysisBackend>,
    config: PollerConfig,
}

impl JobPoller {
    pub fn new(backend: Arc<dyn AnalysisBackend>, config: PollerConfig) -> Self {
        Self { backend, config }
    }

    /// Start polling `file_id`. The task updates `job` and, on completion,
    /// publishes the materialized report into `report`.
    pub fn start(
        &self,
        file_id: String,
        job: Arc<watch::Sender<Job>>,
        report: Arc<watch::Sender<Option<Report>>>,
        parent: &CancellationToken,
    ) -> PollHandle {
        let cancel = parent.child_token();
        let poller = self.clone();
        let token = cancel.clone();
        let task = tokio::spawn(async move { poller.run(file_id, job, report, token).await });
        PollHandle { cancel, task }
    }

    async fn run(
        self,
        file_id: String,
        job: Arc<watch::Sender<Job>>,
        report: Arc<watch::Sender<Option<Report>>>,
        cancel: CancellationToken,
    ) -> PollOutcome {
        tracing::info!(
            job_id = %file_id,
            interval_ms = self.config.interval.as_millis() as u64,
            discard_stale = self.config.discard_stale,
            "Status poller started"
        );

        let started = Instant::now();
        let mut ticker = tokio::time::interval_at(started + self.config.interval, self.config.interval);
        let deadline = self.config.timeout.map(|t| started + t);
        let timeout = async move {
            match deadline {
                Some(at) => tokio::time::sleep_until(at).await,
                None => std::future::pending::<()>().await,
            }
        };
        tokio::pin!(timeout);

        let mut in_flight: JoinSet<(u64, Result<StatusResponse, BackendError>)> = JoinSet::new();
        let mut next_seq: u64 = 0;
        let mut last_applied: Option<u64> = None;

        let outcome = loop {
            tokio::select! {
                biased;

                _ = cancel.cancelled() => break PollOutcome::Cancelled,

                _ = &mut timeout => {
                    tracing::warn!(job_id = %file_id, "Job exceeded client-side timeout");
                    break self.fail(&file_id, &job, STATUS_CHECK_TIMED_OUT);
                }

                Some(joined) = in_flight.join_next() => {
                    let (seq, result) = match joined {
                        Ok(done) => done,
                        Err(e) => {
                            tracing::error!(job_id = %file_id, error = %e, "Status request task failed");
                            continue;
                        }
                    };

                    if self.config.discard_stale && last_applied.is_some_and(|last| seq < last) {
                        tracing::debug!(job_id = %file_id, seq, "Dropping stale status response");
                        continue;
                    }
                    last_applied = Some(seq);

                    let step = match result {
                        Ok(status) => self.apply(&file_id, &job, &report, status),
                        Err(e) => {
                            tracing::error!(job_id = %file_id, seq, error = %e, "Status check failed");
                            Step::Done(self.fail(&file_id, &job, STATUS_CHECK_FAILED))
                        }
                    };
                    if let Step::Done(outcome) = step {
                        break outcome;
                    }
                }

                _ = ticker.tick() => {
                    let seq = next_seq;
                    next_seq += 1;
                    metrics::counter!("audit_status_polls_total").increment(1);
                    tracing::trace!(job_id = %file_id, seq, "Requesting job status");

                    let backend = Arc::clone(&self.backend);
                    let id = file_id.clone();
                    let deadline = self.config.request_timeout;
                    in_flight.spawn(async move {
                        let result = tokio::time::timeout(deadline, backend.status(&id))
                            .await
                            .unwrap_or(Err(BackendError::TimedOut(deadline)));
                        (seq, result)
                    });
                }
            }
        };

        in_flight.abort_all();
        cancel.cancel();
        tracing::info!(job_id = %file_id, outcome = ?outcome, "Status poller stopped");
        outcome
    }

    fn apply(
        &self,
        file_id: &str,
        job: &watch::Sender<Job>,
        report: &watch::Sender<Option<Report>>,
        status: StatusResponse,
    ) -> Step {
        let mut step = Step::Done(PollOutcome::Superseded);
        let mut completed_with = None;

        job.send_if_modified(|j| {
            if !j.is_tracking(file_id) {
                return false;
            }
            step = match status.stage {
                RemoteStage::Completed => {
                    let results = status.results.clone().unwrap_or_else(|| {
                        tracing::warn!(job_id = %file_id, "Completed job carried no results");
                        Map::new()
                    });
                    completed_with = Some(results.clone());
                    j.complete(status.progress, status.message.clone(), results);
                    Step::Done(PollOutcome::Completed)
                }
                RemoteStage::Failed => {
                    j.record_progress(status.progress, status.message.clone());
                    j.fail(JobFailure::Backend(status.message.clone()));
                    Step::Done(PollOutcome::Failed)
                }
                RemoteStage::Upload | RemoteStage::Processing | RemoteStage::Unknown => {
                    j.record_progress(status.progress, status.message.clone());
                    Step::Continue
                }
            };
            true
        });

        match &step {
            Step::Continue => {
                tracing::debug!(job_id = %file_id, progress = status.progress, detail = %status.message, "Job progress");
            }
            Step::Done(PollOutcome::Completed) => {
                metrics::counter!("audit_jobs_completed").increment(1);
                tracing::info!(job_id = %file_id, "Job completed, materializing report");
                if let Some(results) = completed_with {
                    report.send_replace(Some(Report::materialize(&results)));
                }
            }
            Step::Done(PollOutcome::Failed) => {
                metrics::counter!("audit_jobs_failed").increment(1);
                tracing::warn!(job_id = %file_id, detail = %status.message, "Analysis service reported failure");
            }
            Step::Done(_) => {
                tracing::debug!(job_id = %file_id, "Job no longer tracked, ignoring status");
            }
        }
        step
    }

    fn fail(&self, file_id: &str, job: &watch::Sender<Job>, message: &str) -> PollOutcome {
        let applied = job.send_if_modified(|j| {
            if !j.is_tracking(file_id) {
                return false;
            }
            j.fail(JobFailure::Transport(message.to_string()));
            true
        });

        if applied {
            metrics::counter!("audit_jobs_failed").increment(1);
            PollOutcome::Failed
        } else {
            PollOutcome::Superseded
        }
    }
}
