use crate::job::JobStatus;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Invalid status transition: {from} -> {to}")]
    InvalidTransition { from: JobStatus, to: JobStatus },

    #[error("Remote id already assigned as {existing}, refusing {rejected}")]
    RemoteIdConflict { existing: String, rejected: String },
}
