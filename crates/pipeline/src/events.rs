//! Job lifecycle events, broadcast to whatever view is listening.
//!
//! The poller and batch runner emit an event on every observable
//! change so list views can re-render without owning the job store.
//! Delivery is best-effort: with no subscribers, events are dropped.

use tokio::sync::broadcast;

use drawbridge_core::job::{JobId, JobStatus};

/// Broadcast channel capacity for job events.
pub const EVENT_CHANNEL_CAPACITY: usize = 256;

/// One observable change to a job record.
#[derive(Debug, Clone)]
pub enum JobEvent {
    /// Status/label/progress changed; emitted on every poll iteration,
    /// terminal or not.
    Progress {
        job: JobId,
        status: JobStatus,
        progress: u8,
        label: String,
    },
    /// The job reached `Done`.
    Completed { job: JobId },
    /// The job reached `Failed`, with the captured error message.
    Failed { job: JobId, error: String },
}

/// Create the event channel used by a batch run.
pub fn channel() -> (broadcast::Sender<JobEvent>, broadcast::Receiver<JobEvent>) {
    broadcast::channel(EVENT_CHANNEL_CAPACITY)
}

/// Send an event, ignoring the no-subscribers case.
pub(crate) fn emit(events: &broadcast::Sender<JobEvent>, event: JobEvent) {
    let _ = events.send(event);
}
