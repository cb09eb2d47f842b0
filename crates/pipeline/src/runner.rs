//! Sequential batch driver.
//!
//! Drives each job in the store through upload -> trigger -> poll ->
//! best-effort artifact fetch, strictly one job at a time. Sequential
//! execution bounds backend load and keeps per-job log and progress
//! updates ordered. A failure on one job marks that job `Failed` and
//! the runner proceeds to the next -- batch failure is per-item, never
//! whole-batch-aborting.

use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

use drawbridge_client::CadBackend;
use drawbridge_core::job::{
    JobId, JobKind, JobRecord, JobStatus, JobStore, PROGRESS_UPLOADED,
};

use crate::events::{emit, JobEvent};
use crate::fetcher::{
    load_entity_table, load_parsed_geometry, load_semantic_summary, RetryConfig,
};
use crate::poller::{poll_until_terminal, PollConfig};

/// Outcome of driving one job to settlement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchOutcome {
    pub job: JobId,
    pub success: bool,
}

/// Drives a list of jobs sequentially through their full lifecycle.
pub struct BatchRunner<'a> {
    backend: &'a dyn CadBackend,
    events: broadcast::Sender<JobEvent>,
    poll: PollConfig,
    retry: RetryConfig,
    cancel: CancellationToken,
}

impl<'a> BatchRunner<'a> {
    pub fn new(backend: &'a dyn CadBackend, events: broadcast::Sender<JobEvent>) -> Self {
        Self {
            backend,
            events,
            poll: PollConfig::default(),
            retry: RetryConfig::default(),
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_poll_config(mut self, poll: PollConfig) -> Self {
        self.poll = poll;
        self
    }

    pub fn with_retry_config(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Token cancelling the whole batch; child tokens are handed to
    /// each poll loop.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Run every job in the store to a terminal outcome, in insertion
    /// order. Jobs already terminal are left untouched. Stops early
    /// only when the batch token is cancelled; jobs not yet started
    /// keep their current state.
    pub async fn run(&self, store: &mut JobStore) -> Vec<BatchOutcome> {
        let mut outcomes = Vec::with_capacity(store.len());

        for job_id in 0..store.len() {
            if self.cancel.is_cancelled() {
                tracing::info!(job_id, "Batch cancelled, remaining jobs not started");
                break;
            }

            let Some(job) = store.get_mut(job_id) else {
                break;
            };

            let success = self.run_one(job_id, job).await;
            outcomes.push(BatchOutcome { job: job_id, success });
        }

        let failed = outcomes.iter().filter(|o| !o.success).count();
        tracing::info!(
            total = outcomes.len(),
            failed,
            "Batch finished",
        );
        outcomes
    }

    async fn run_one(&self, job_id: JobId, job: &mut JobRecord) -> bool {
        if job.status().is_terminal() {
            return job.status() == JobStatus::Done;
        }

        tracing::info!(job_id, file_name = %job.file_name, kind = ?job.kind, "Job started");

        if !self.ensure_uploaded(job_id, job).await {
            return false;
        }

        // remote_id is guaranteed present after a successful upload step.
        let Some(remote_id) = job.remote_id().map(str::to_owned) else {
            self.fail(job_id, job, "upload yielded no remote id".to_string());
            return false;
        };

        // Trigger the remote action.
        if let Err(e) = self.backend.trigger(job.kind, &remote_id).await {
            self.fail(job_id, job, format!("trigger failed: {e}"));
            return false;
        }
        if let Err(e) = job.transition(JobStatus::Processing) {
            self.fail(job_id, job, e.to_string());
            return false;
        }
        job.phase_label = match job.kind {
            JobKind::Convert => "converting".to_string(),
            JobKind::Analyze => "parsing".to_string(),
        };
        job.set_log("remote action triggered");
        self.progress_event(job_id, job);

        // Poll to a terminal state.
        let child_cancel = self.cancel.child_token();
        if !poll_until_terminal(
            self.backend,
            job_id,
            job,
            &self.poll,
            &self.events,
            &child_cancel,
        )
        .await
        {
            return false;
        }

        // Artifacts are best effort: the job stays Done even when a
        // fetch fails or comes back empty.
        if job.kind == JobKind::Analyze {
            if let Err(e) = load_parsed_geometry(self.backend, job, &self.retry).await {
                tracing::warn!(job_id, error = %e, "Parsed geometry fetch failed");
            }
            if let Err(e) = load_entity_table(self.backend, job, &self.retry).await {
                tracing::warn!(job_id, error = %e, "Entity table fetch failed");
            }
            if let Err(e) = load_semantic_summary(self.backend, job, &self.retry).await {
                tracing::warn!(job_id, error = %e, "Semantic summary fetch failed");
            }
        }

        true
    }

    /// Upload step. Idempotent: a job that already has a remote id
    /// skips the network round-trip entirely.
    async fn ensure_uploaded(&self, job_id: JobId, job: &mut JobRecord) -> bool {
        if job.remote_id().is_some() {
            tracing::debug!(job_id, "Upload skipped, remote id already assigned");
            if job.status() == JobStatus::Ready {
                if job.transition(JobStatus::Uploading).is_err()
                    || job.transition(JobStatus::Uploaded).is_err()
                {
                    self.fail(job_id, job, "job not in an uploadable state".to_string());
                    return false;
                }
            }
            return true;
        }

        if let Err(e) = job.transition(JobStatus::Uploading) {
            self.fail(job_id, job, e.to_string());
            return false;
        }
        self.progress_event(job_id, job);

        let uploaded = self
            .backend
            .upload(&job.file_name, job.source.clone())
            .await;
        let remote_id = match uploaded {
            Ok(id) => id,
            Err(e) => {
                self.fail(job_id, job, format!("upload failed: {e}"));
                return false;
            }
        };

        if let Err(e) = job.assign_remote_id(remote_id) {
            self.fail(job_id, job, e.to_string());
            return false;
        }
        if let Err(e) = job.transition(JobStatus::Uploaded) {
            self.fail(job_id, job, e.to_string());
            return false;
        }
        job.set_progress(PROGRESS_UPLOADED);
        job.set_log("uploaded");
        self.progress_event(job_id, job);
        true
    }

    fn progress_event(&self, job_id: JobId, job: &JobRecord) {
        emit(
            &self.events,
            JobEvent::Progress {
                job: job_id,
                status: job.status(),
                progress: job.progress(),
                label: job.phase_label.clone(),
            },
        );
    }

    fn fail(&self, job_id: JobId, job: &mut JobRecord, message: String) {
        tracing::warn!(job_id, error = %message, "Job failed");
        job.fail(message.clone());
        emit(
            &self.events,
            JobEvent::Failed {
                job: job_id,
                error: message,
            },
        );
    }
}
