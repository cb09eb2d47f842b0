//! Scripted mock backend shared by the pipeline integration tests.

use std::collections::HashSet;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use drawbridge_client::{ApiError, CadBackend};
use drawbridge_core::job::{JobKind, JobRecord, JobStatus};
use drawbridge_core::payload::{EntityTable, ParsedGeometry, SemanticSummary};
use drawbridge_core::status::StatusReport;

/// One scripted response: success, not-materialized-yet, or a
/// transport failure.
pub enum Scripted<T> {
    Ok(T),
    NotFound,
    Error,
}

impl<T> Scripted<T> {
    fn into_result(self) -> Result<T, ApiError> {
        match self {
            Scripted::Ok(value) => Ok(value),
            Scripted::NotFound => Err(ApiError::NotFound {
                path: "/mock".to_string(),
            }),
            Scripted::Error => Err(ApiError::Http {
                status: 500,
                body: "mock failure".to_string(),
            }),
        }
    }
}

/// Backend double driven by per-endpoint response queues.
///
/// When a queue runs dry the endpoint falls back to a benign default
/// (a "running" status, an empty payload), so endless-polling
/// scenarios do not need hundreds of queued entries.
#[derive(Default)]
pub struct MockBackend {
    pub uploads: Mutex<VecDeque<Scripted<String>>>,
    pub statuses: Mutex<VecDeque<Scripted<StatusReport>>>,
    pub tables: Mutex<VecDeque<Scripted<EntityTable>>>,
    pub parsed: Mutex<VecDeque<Scripted<ParsedGeometry>>>,
    pub summaries: Mutex<VecDeque<Scripted<SemanticSummary>>>,
    pub fail_trigger_for: Mutex<HashSet<String>>,

    pub upload_calls: AtomicUsize,
    pub trigger_calls: AtomicUsize,
    pub status_calls: AtomicUsize,
    pub table_calls: AtomicUsize,
    pub parsed_calls: AtomicUsize,
    pub summary_calls: AtomicUsize,
}

impl MockBackend {
    pub fn push_status(&self, report: StatusReport) {
        self.statuses.lock().unwrap().push_back(Scripted::Ok(report));
    }

    pub fn push_status_error(&self) {
        self.statuses.lock().unwrap().push_back(Scripted::Error);
    }

    pub fn push_table(&self, table: Scripted<EntityTable>) {
        self.tables.lock().unwrap().push_back(table);
    }

    pub fn push_upload(&self, upload: Scripted<String>) {
        self.uploads.lock().unwrap().push_back(upload);
    }

    pub fn fail_trigger(&self, remote_id: &str) {
        self.fail_trigger_for
            .lock()
            .unwrap()
            .insert(remote_id.to_string());
    }
}

#[async_trait]
impl CadBackend for MockBackend {
    async fn upload(&self, _file_name: &str, _bytes: Vec<u8>) -> Result<String, ApiError> {
        let n = self.upload_calls.fetch_add(1, Ordering::SeqCst);
        match self.uploads.lock().unwrap().pop_front() {
            Some(scripted) => scripted.into_result(),
            None => Ok(format!("f-{}", n + 1)),
        }
    }

    async fn trigger(&self, _kind: JobKind, remote_id: &str) -> Result<(), ApiError> {
        self.trigger_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_trigger_for.lock().unwrap().contains(remote_id) {
            return Err(ApiError::Http {
                status: 500,
                body: "trigger rejected".to_string(),
            });
        }
        Ok(())
    }

    async fn status(&self, _kind: JobKind, _remote_id: &str) -> Result<StatusReport, ApiError> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        match self.statuses.lock().unwrap().pop_front() {
            Some(scripted) => scripted.into_result(),
            None => Ok(running(None)),
        }
    }

    async fn parsed_geometry(&self, _remote_id: &str) -> Result<ParsedGeometry, ApiError> {
        self.parsed_calls.fetch_add(1, Ordering::SeqCst);
        match self.parsed.lock().unwrap().pop_front() {
            Some(scripted) => scripted.into_result(),
            None => Ok(ParsedGeometry::default()),
        }
    }

    async fn entity_table(&self, _remote_id: &str) -> Result<EntityTable, ApiError> {
        self.table_calls.fetch_add(1, Ordering::SeqCst);
        match self.tables.lock().unwrap().pop_front() {
            Some(scripted) => scripted.into_result(),
            None => Ok(EntityTable::default()),
        }
    }

    async fn semantic_summary(&self, _remote_id: &str) -> Result<SemanticSummary, ApiError> {
        self.summary_calls.fetch_add(1, Ordering::SeqCst);
        match self.summaries.lock().unwrap().pop_front() {
            Some(scripted) => scripted.into_result(),
            None => Ok(SemanticSummary::default()),
        }
    }

    async fn download_geometry(&self, _remote_id: &str) -> Result<String, ApiError> {
        Ok(String::new())
    }
}

// ---- status report builders ----

pub fn running(progress: Option<u8>) -> StatusReport {
    StatusReport {
        state_text: "processing".to_string(),
        progress,
        ..Default::default()
    }
}

pub fn done(artifact: Option<&str>) -> StatusReport {
    StatusReport {
        state_text: "done".to_string(),
        artifact_path: artifact.map(String::from),
        ..Default::default()
    }
}

pub fn failed(message: &str) -> StatusReport {
    StatusReport {
        state_text: "failed".to_string(),
        message: Some(message.to_string()),
        ..Default::default()
    }
}

// ---- job builders ----

/// A job that has been uploaded and triggered, ready for polling.
pub fn processing_job(kind: JobKind) -> JobRecord {
    let mut job = JobRecord::new("plan.dxf", b"0\nEOF\n".to_vec(), kind, None);
    job.transition(JobStatus::Uploading).unwrap();
    job.assign_remote_id("f-1").unwrap();
    job.transition(JobStatus::Uploaded).unwrap();
    job.transition(JobStatus::Processing).unwrap();
    job
}

/// A small non-empty entity table.
pub fn non_empty_table() -> EntityTable {
    EntityTable {
        columns: vec!["handle".to_string()],
        rows: vec![serde_json::json!({"handle": "A1"})
            .as_object()
            .unwrap()
            .clone()],
    }
}
