//! Terminal-state detection on loosely-typed backend status payloads.
//!
//! The backend reports job state as free-form text ("done",
//! "Completed", "CONVERT_FAILED", ...) and may attach a conversion
//! artifact path. Classification is deliberately tolerant: exact
//! case-insensitive match for success words, substring match for
//! failure words.

use crate::job::JobKind;

/// Status strings that mean the job finished successfully.
const DONE_WORDS: [&str; 3] = ["done", "completed", "success"];

/// Substrings that mean the job failed.
const FAIL_WORDS: [&str; 2] = ["fail", "error"];

/// Normalized status payload produced by the decode boundary.
#[derive(Debug, Clone, Default)]
pub struct StatusReport {
    /// Raw backend state text, verbatim.
    pub state_text: String,
    /// Optional human-readable message (surfaced verbatim on failure).
    pub message: Option<String>,
    /// Optional backend-reported progress percentage.
    pub progress: Option<u8>,
    /// Conversion artifact path, when the backend has produced one.
    pub artifact_path: Option<String>,
}

impl StatusReport {
    /// Best line to surface in the job log for this report.
    pub fn log_line(&self) -> &str {
        match &self.message {
            Some(msg) if !msg.is_empty() => msg,
            _ => &self.state_text,
        }
    }
}

/// Outcome of classifying one status payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusClass {
    Running,
    Done,
    Failed,
}

/// Whether the status text signals success.
fn is_done_text(text: &str) -> bool {
    let lower = text.trim().to_lowercase();
    DONE_WORDS.iter().any(|w| lower == *w)
}

/// Whether the status text signals failure (substring match).
fn is_failure_text(text: &str) -> bool {
    let lower = text.to_lowercase();
    FAIL_WORDS.iter().any(|w| lower.contains(w))
}

fn has_artifact(report: &StatusReport) -> bool {
    report
        .artifact_path
        .as_deref()
        .is_some_and(|p| !p.trim().is_empty())
}

/// Classify a status payload for a job of the given kind.
///
/// Completion is signalled either by a success word or by the presence
/// of an artifact. For convert jobs an artifact is additionally
/// *required*: a "done" status without one is not yet terminal,
/// because the conversion output is the whole point of the job.
pub fn classify(report: &StatusReport, kind: JobKind) -> StatusClass {
    if is_failure_text(&report.state_text) {
        return StatusClass::Failed;
    }
    let done_signal = is_done_text(&report.state_text) || has_artifact(report);
    match kind {
        JobKind::Convert => {
            if done_signal && has_artifact(report) {
                StatusClass::Done
            } else {
                StatusClass::Running
            }
        }
        JobKind::Analyze => {
            if done_signal {
                StatusClass::Done
            } else {
                StatusClass::Running
            }
        }
    }
}
