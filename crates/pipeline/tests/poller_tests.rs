//! Status poller integration tests against the scripted mock backend.

mod common;

use std::sync::atomic::Ordering;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use common::{done, failed, processing_job, running, MockBackend};
use drawbridge_core::job::{JobKind, JobStatus};
use drawbridge_pipeline::events::{channel, JobEvent};
use drawbridge_pipeline::poller::{poll_until_terminal, PollConfig};

fn fast_poll() -> PollConfig {
    PollConfig {
        interval: Duration::from_millis(1),
        timeout: None,
    }
}

#[tokio::test]
async fn polls_until_done_and_updates_on_every_iteration() {
    let backend = MockBackend::default();
    backend.push_status(running(Some(55)));
    backend.push_status(running(Some(80)));
    backend.push_status(done(None));

    let mut job = processing_job(JobKind::Analyze);
    let (tx, mut rx) = channel();
    let cancel = CancellationToken::new();

    let ok = poll_until_terminal(&backend, 0, &mut job, &fast_poll(), &tx, &cancel).await;

    assert!(ok);
    assert_eq!(job.status(), JobStatus::Done);
    assert_eq!(job.progress(), 100);
    assert_eq!(backend.status_calls.load(Ordering::SeqCst), 3);

    // One progress event per iteration, then the completion event.
    let mut progress_events = 0;
    let mut completed = false;
    while let Ok(event) = rx.try_recv() {
        match event {
            JobEvent::Progress { .. } => progress_events += 1,
            JobEvent::Completed { job } => {
                assert_eq!(job, 0);
                completed = true;
            }
            JobEvent::Failed { .. } => panic!("unexpected failure event"),
        }
    }
    assert_eq!(progress_events, 3);
    assert!(completed);
}

#[tokio::test]
async fn convert_job_keeps_polling_until_artifact_appears() {
    let backend = MockBackend::default();
    // "done" without an artifact is not terminal for conversion.
    backend.push_status(done(None));
    backend.push_status(done(Some("derived/plan.dxf")));

    let mut job = processing_job(JobKind::Convert);
    let (tx, _rx) = channel();
    let cancel = CancellationToken::new();

    let ok = poll_until_terminal(&backend, 0, &mut job, &fast_poll(), &tx, &cancel).await;

    assert!(ok);
    assert_eq!(backend.status_calls.load(Ordering::SeqCst), 2);
    assert_eq!(job.artifact_path.as_deref(), Some("derived/plan.dxf"));
}

#[tokio::test]
async fn transport_error_fails_immediately_without_retry() {
    let backend = MockBackend::default();
    backend.push_status_error();
    // A healthy follow-up that must never be reached.
    backend.push_status(done(None));

    let mut job = processing_job(JobKind::Analyze);
    let (tx, _rx) = channel();
    let cancel = CancellationToken::new();

    let ok = poll_until_terminal(&backend, 0, &mut job, &fast_poll(), &tx, &cancel).await;

    assert!(!ok);
    assert_eq!(job.status(), JobStatus::Failed);
    assert_eq!(backend.status_calls.load(Ordering::SeqCst), 1);
    assert!(job.log.contains("status poll failed"));
}

#[tokio::test]
async fn backend_failure_status_surfaces_its_message() {
    let backend = MockBackend::default();
    backend.push_status(failed("conversion crashed on sheet 3"));

    let mut job = processing_job(JobKind::Analyze);
    let (tx, _rx) = channel();
    let cancel = CancellationToken::new();

    let ok = poll_until_terminal(&backend, 0, &mut job, &fast_poll(), &tx, &cancel).await;

    assert!(!ok);
    assert_eq!(job.status(), JobStatus::Failed);
    assert_eq!(job.log, "conversion crashed on sheet 3");
}

#[tokio::test]
async fn poll_timeout_fails_a_never_settling_job() {
    // Empty status queue: the mock reports "running" forever.
    let backend = MockBackend::default();
    let mut job = processing_job(JobKind::Analyze);
    let (tx, _rx) = channel();
    let cancel = CancellationToken::new();

    let config = PollConfig {
        interval: Duration::from_millis(2),
        timeout: Some(Duration::from_millis(10)),
    };
    let ok = poll_until_terminal(&backend, 0, &mut job, &config, &tx, &cancel).await;

    assert!(!ok);
    assert_eq!(job.status(), JobStatus::Failed);
    assert!(job.log.contains("no terminal status"));
}

#[tokio::test]
async fn cancellation_stops_the_loop_without_completing() {
    let backend = MockBackend::default();
    let mut job = processing_job(JobKind::Analyze);
    let (tx, _rx) = channel();
    let cancel = CancellationToken::new();
    cancel.cancel();

    let ok = poll_until_terminal(&backend, 0, &mut job, &fast_poll(), &tx, &cancel).await;

    assert!(!ok);
    assert_eq!(job.status(), JobStatus::Failed);
    assert_eq!(backend.status_calls.load(Ordering::SeqCst), 1);
    assert!(job.log.contains("cancelled"));
}

#[tokio::test]
async fn polling_without_remote_id_fails_cleanly() {
    let backend = MockBackend::default();
    let mut job = drawbridge_core::job::JobRecord::new(
        "plan.dxf",
        Vec::new(),
        JobKind::Analyze,
        None,
    );
    let (tx, _rx) = channel();
    let cancel = CancellationToken::new();

    let ok = poll_until_terminal(&backend, 0, &mut job, &fast_poll(), &tx, &cancel).await;

    assert!(!ok);
    assert_eq!(backend.status_calls.load(Ordering::SeqCst), 0);
    assert_eq!(job.status(), JobStatus::Failed);
}
