//! Job records and their lifecycle state machine.
//!
//! One [`JobRecord`] tracks one uploaded file through upload, remote
//! action, polling, and artifact retrieval. Records live in a
//! [`JobStore`] owned by the application and passed by reference to
//! whatever component needs it -- there is no ambient registry.

use std::collections::HashMap;
use std::fmt;

use crate::error::CoreError;
use crate::payload::{EntityTable, ParsedGeometry, SemanticSummary};
use crate::table::SortState;

/// Index of a job inside its [`JobStore`].
pub type JobId = usize;

/// Advisory progress shown right after a successful upload.
pub const PROGRESS_UPLOADED: u8 = 40;
/// Advisory progress while the backend is working and reports nothing
/// more precise.
pub const PROGRESS_MID_JOB: u8 = 70;
/// Progress at any terminal state.
pub const PROGRESS_TERMINAL: u8 = 100;

// ---------------------------------------------------------------------------
// Kind / mode
// ---------------------------------------------------------------------------

/// What the backend is asked to do with the file. Fixed at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobKind {
    /// Format conversion (DWG <-> DXF).
    Convert,
    /// Geometry parsing plus semantic extraction.
    Analyze,
}

/// Conversion direction, relevant only when the kind is [`JobKind::Convert`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConvertMode {
    DwgToDxf,
    DxfToDwg,
}

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

/// Lifecycle state of a job.
///
/// `Ready` is the sole initial state. `Done` and `Failed` are terminal
/// and are never left. The intermediate backend phase (converting vs
/// parsing) is carried as a display label on the record, not as extra
/// states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Ready,
    Uploading,
    Uploaded,
    Processing,
    Done,
    Failed,
}

impl JobStatus {
    /// `Done` and `Failed` accept no further transitions.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }

    /// Whether the edge `self -> next` exists in the lifecycle graph.
    ///
    /// `Failed` is reachable from every non-terminal state; everything
    /// else moves strictly forward.
    pub fn can_transition_to(self, next: Self) -> bool {
        if self.is_terminal() {
            return false;
        }
        match (self, next) {
            (_, Self::Failed) => true,
            (Self::Ready, Self::Uploading) => true,
            (Self::Uploading, Self::Uploaded) => true,
            (Self::Uploaded, Self::Processing) => true,
            (Self::Processing, Self::Done) => true,
            _ => false,
        }
    }

    /// Short label for table display.
    pub fn label(self) -> &'static str {
        match self {
            Self::Ready => "ready",
            Self::Uploading => "uploading",
            Self::Uploaded => "uploaded",
            Self::Processing => "processing",
            Self::Done => "done",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ---------------------------------------------------------------------------
// Lazily fetched artifact cache
// ---------------------------------------------------------------------------

/// A lazily populated artifact with its own loading flag.
///
/// The flag guards against duplicate concurrent fetches of the same
/// resource: [`Cached::begin_load`] returns `false` while a fetch is
/// already in flight. [`Cached::settle`] always clears the flag,
/// whether or not a value arrived.
#[derive(Debug)]
pub struct Cached<T> {
    value: Option<T>,
    loading: bool,
}

impl<T> Default for Cached<T> {
    fn default() -> Self {
        Self {
            value: None,
            loading: false,
        }
    }
}

impl<T> Cached<T> {
    /// Mark the cache as loading. Returns `false` if a fetch is
    /// already in flight, in which case the caller must not start
    /// another one.
    pub fn begin_load(&mut self) -> bool {
        if self.loading {
            return false;
        }
        self.loading = true;
        true
    }

    /// Clear the loading flag, storing `value` if the fetch produced one.
    /// A failed fetch (`None`) keeps any previously cached value.
    pub fn settle(&mut self, value: Option<T>) {
        if let Some(v) = value {
            self.value = Some(v);
        }
        self.loading = false;
    }

    pub fn get(&self) -> Option<&T> {
        self.value.as_ref()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }
}

// ---------------------------------------------------------------------------
// JobRecord
// ---------------------------------------------------------------------------

/// One uploaded file's tracked unit of work.
#[derive(Debug)]
pub struct JobRecord {
    /// Original file name, used for upload and display.
    pub file_name: String,
    /// Raw file bytes held for upload.
    pub source: Vec<u8>,
    pub kind: JobKind,
    pub mode: Option<ConvertMode>,
    remote_id: Option<String>,
    status: JobStatus,
    progress: u8,
    /// Backend phase label shown next to the status (e.g. "converting").
    pub phase_label: String,
    /// Last human-readable status or error line.
    pub log: String,
    /// Conversion artifact path; populated only on transition to `Done`
    /// for convert jobs.
    pub artifact_path: Option<String>,
    pub parsed_geometry: Cached<ParsedGeometry>,
    pub entity_table: Cached<EntityTable>,
    pub semantic_summary: Cached<SemanticSummary>,
    /// Per-table-name sort state, driven by user interaction and
    /// independent of the job lifecycle.
    pub sort_state: HashMap<String, SortState>,
    /// When the record last changed (status, progress, or log).
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl JobRecord {
    pub fn new(
        file_name: impl Into<String>,
        source: Vec<u8>,
        kind: JobKind,
        mode: Option<ConvertMode>,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            source,
            kind,
            mode,
            remote_id: None,
            status: JobStatus::Ready,
            progress: 0,
            phase_label: String::new(),
            log: String::new(),
            artifact_path: None,
            parsed_geometry: Cached::default(),
            entity_table: Cached::default(),
            semantic_summary: Cached::default(),
            sort_state: HashMap::new(),
            updated_at: chrono::Utc::now(),
        }
    }

    pub fn status(&self) -> JobStatus {
        self.status
    }

    pub fn progress(&self) -> u8 {
        self.progress
    }

    pub fn remote_id(&self) -> Option<&str> {
        self.remote_id.as_deref()
    }

    /// Move the job along an edge of the lifecycle graph.
    pub fn transition(&mut self, next: JobStatus) -> Result<(), CoreError> {
        if !self.status.can_transition_to(next) {
            return Err(CoreError::InvalidTransition {
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        if next == JobStatus::Done {
            self.progress = PROGRESS_TERMINAL;
        }
        self.touch();
        Ok(())
    }

    /// Assign the backend identity, at most once.
    ///
    /// Re-assigning the same id is a no-op so that repeated uploads of
    /// the same record stay idempotent; a different id is rejected.
    pub fn assign_remote_id(&mut self, id: impl Into<String>) -> Result<(), CoreError> {
        let id = id.into();
        match &self.remote_id {
            None => {
                self.remote_id = Some(id);
                self.touch();
                Ok(())
            }
            Some(existing) if *existing == id => Ok(()),
            Some(existing) => Err(CoreError::RemoteIdConflict {
                existing: existing.clone(),
                rejected: id,
            }),
        }
    }

    /// Advisory progress update: clamped to 0-100 and monotonically
    /// non-decreasing within a run. Regressions are ignored.
    pub fn set_progress(&mut self, value: u8) {
        let value = value.min(100);
        if value > self.progress {
            self.progress = value;
            self.touch();
        }
    }

    /// Record a log line without touching the state machine.
    pub fn set_log(&mut self, line: impl Into<String>) {
        self.log = line.into();
        self.touch();
    }

    /// Mark the job failed with a captured error message.
    ///
    /// Safe to call from any state; a job already in a terminal state
    /// is left untouched.
    pub fn fail(&mut self, message: impl Into<String>) {
        if self.status.is_terminal() {
            return;
        }
        self.status = JobStatus::Failed;
        self.log = message.into();
        self.touch();
    }

    /// Mark the job done, capturing the conversion artifact when present.
    pub fn complete(&mut self, artifact_path: Option<String>) -> Result<(), CoreError> {
        self.transition(JobStatus::Done)?;
        if self.kind == JobKind::Convert {
            self.artifact_path = artifact_path;
        }
        Ok(())
    }

    /// Flip or set the sort state for a named table. The active column
    /// toggles direction; a new column resets to ascending.
    pub fn toggle_sort(&mut self, table: &str, column: &str) -> &SortState {
        let next = SortState::toggled(self.sort_state.get(table), column);
        self.sort_state.insert(table.to_string(), next);
        &self.sort_state[table]
    }

    fn touch(&mut self) {
        self.updated_at = chrono::Utc::now();
    }
}

// ---------------------------------------------------------------------------
// JobStore
// ---------------------------------------------------------------------------

/// The application's collection of job records, in insertion order.
///
/// Purely in-memory; nothing survives a restart. Passed by reference
/// to the batch runner and the view-model builders.
#[derive(Debug, Default)]
pub struct JobStore {
    jobs: Vec<JobRecord>,
}

impl JobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a record, returning its id.
    pub fn add(&mut self, job: JobRecord) -> JobId {
        self.jobs.push(job);
        self.jobs.len() - 1
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    pub fn get(&self, id: JobId) -> Option<&JobRecord> {
        self.jobs.get(id)
    }

    pub fn get_mut(&mut self, id: JobId) -> Option<&mut JobRecord> {
        self.jobs.get_mut(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (JobId, &JobRecord)> {
        self.jobs.iter().enumerate()
    }

    /// Analyze-kind jobs in insertion order, as used by the semantic
    /// aggregator.
    pub fn analyze_jobs(&self) -> impl Iterator<Item = (JobId, &JobRecord)> {
        self.iter().filter(|(_, job)| job.kind == JobKind::Analyze)
    }
}
