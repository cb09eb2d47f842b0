//! Status polling loop.
//!
//! One job at a time: query the kind-specific status endpoint on a
//! fixed interval until a terminal state is observed, updating the
//! record and emitting a [`JobEvent`] on every iteration. A transport
//! or decode error fails the job immediately -- retrying a status
//! request the backend already refused does not converge.

use std::time::Duration;

use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

use drawbridge_client::CadBackend;
use drawbridge_core::job::{JobId, JobRecord, PROGRESS_MID_JOB};
use drawbridge_core::status::{classify, StatusClass};

use crate::events::{emit, JobEvent};

/// Default delay between status queries.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(1200);

/// Default overall polling budget before a never-settling job is
/// failed. `None` restores unbounded polling.
pub const DEFAULT_POLL_TIMEOUT: Duration = Duration::from_secs(600);

/// Tunable parameters for the polling loop.
#[derive(Debug, Clone)]
pub struct PollConfig {
    /// Delay between status queries.
    pub interval: Duration,
    /// Overall budget for one job's polling; expiry fails the job.
    pub timeout: Option<Duration>,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            timeout: Some(DEFAULT_POLL_TIMEOUT),
        }
    }
}

fn fail_job(
    job_id: JobId,
    job: &mut JobRecord,
    events: &broadcast::Sender<JobEvent>,
    message: String,
) {
    tracing::warn!(job_id, error = %message, "Job failed during polling");
    job.fail(message.clone());
    emit(events, JobEvent::Failed { job: job_id, error: message });
}

/// Poll one job until it settles, resolving `true` on `Done`.
///
/// The job must already be `Processing` with an assigned remote id.
/// Iterations never overlap: the next query is scheduled only after
/// the previous one (and its record update) completes. Cancelling the
/// token fails the job cleanly instead of leaving it in flight.
pub async fn poll_until_terminal(
    backend: &dyn CadBackend,
    job_id: JobId,
    job: &mut JobRecord,
    config: &PollConfig,
    events: &broadcast::Sender<JobEvent>,
    cancel: &CancellationToken,
) -> bool {
    let Some(remote_id) = job.remote_id().map(str::to_owned) else {
        fail_job(job_id, job, events, "cannot poll before upload".to_string());
        return false;
    };

    let deadline = config.timeout.map(|t| tokio::time::Instant::now() + t);

    loop {
        let report = match backend.status(job.kind, &remote_id).await {
            Ok(report) => report,
            Err(e) => {
                fail_job(job_id, job, events, format!("status poll failed: {e}"));
                return false;
            }
        };

        // Every iteration updates the record and notifies the view,
        // terminal or not.
        job.phase_label = report.state_text.clone();
        job.set_log(report.log_line().to_string());
        job.set_progress(report.progress.unwrap_or(PROGRESS_MID_JOB));
        emit(
            events,
            JobEvent::Progress {
                job: job_id,
                status: job.status(),
                progress: job.progress(),
                label: job.phase_label.clone(),
            },
        );

        match classify(&report, job.kind) {
            StatusClass::Done => {
                if let Err(e) = job.complete(report.artifact_path.clone()) {
                    fail_job(job_id, job, events, e.to_string());
                    return false;
                }
                tracing::info!(job_id, remote_id = %remote_id, "Job completed");
                emit(events, JobEvent::Completed { job: job_id });
                return true;
            }
            StatusClass::Failed => {
                fail_job(job_id, job, events, report.log_line().to_string());
                return false;
            }
            StatusClass::Running => {}
        }

        if let Some(deadline) = deadline {
            if tokio::time::Instant::now() >= deadline {
                fail_job(
                    job_id,
                    job,
                    events,
                    format!(
                        "no terminal status after {:?}, giving up",
                        config.timeout.unwrap_or_default(),
                    ),
                );
                return false;
            }
        }

        tokio::select! {
            _ = cancel.cancelled() => {
                fail_job(job_id, job, events, "polling cancelled".to_string());
                return false;
            }
            _ = tokio::time::sleep(config.interval) => {}
        }
    }
}
