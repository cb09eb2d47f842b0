//! The backend seam.
//!
//! [`CadBackend`] is the narrow interface the orchestration pipeline
//! is written against. Production code uses [`HttpBackend`] (a thin
//! wrapper over [`CadApi`]); pipeline tests substitute a scripted
//! mock.

use async_trait::async_trait;

use drawbridge_core::job::JobKind;
use drawbridge_core::payload::{EntityTable, ParsedGeometry, SemanticSummary};
use drawbridge_core::status::StatusReport;

use crate::api::{ApiError, CadApi};

/// Everything the pipeline needs from the remote backend.
#[async_trait]
pub trait CadBackend: Send + Sync {
    /// Upload a file, returning the server-assigned remote id.
    async fn upload(&self, file_name: &str, bytes: Vec<u8>) -> Result<String, ApiError>;

    /// Trigger the conversion or parse action for an uploaded file.
    async fn trigger(&self, kind: JobKind, remote_id: &str) -> Result<(), ApiError>;

    /// Query the current job status.
    async fn status(&self, kind: JobKind, remote_id: &str) -> Result<StatusReport, ApiError>;

    /// Fetch the first-pass parse summary.
    async fn parsed_geometry(&self, remote_id: &str) -> Result<ParsedGeometry, ApiError>;

    /// Fetch the flattened entity table.
    async fn entity_table(&self, remote_id: &str) -> Result<EntityTable, ApiError>;

    /// Fetch the semantic summary.
    async fn semantic_summary(&self, remote_id: &str) -> Result<SemanticSummary, ApiError>;

    /// Download the raw geometry text for preview.
    async fn download_geometry(&self, remote_id: &str) -> Result<String, ApiError>;
}

/// Production [`CadBackend`] backed by the REST API.
pub struct HttpBackend {
    api: CadApi,
}

impl HttpBackend {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            api: CadApi::new(base_url),
        }
    }

    pub fn with_api(api: CadApi) -> Self {
        Self { api }
    }
}

#[async_trait]
impl CadBackend for HttpBackend {
    async fn upload(&self, file_name: &str, bytes: Vec<u8>) -> Result<String, ApiError> {
        self.api.upload(file_name, bytes).await
    }

    async fn trigger(&self, kind: JobKind, remote_id: &str) -> Result<(), ApiError> {
        self.api.trigger(kind, remote_id).await
    }

    async fn status(&self, kind: JobKind, remote_id: &str) -> Result<StatusReport, ApiError> {
        self.api.status(kind, remote_id).await
    }

    async fn parsed_geometry(&self, remote_id: &str) -> Result<ParsedGeometry, ApiError> {
        self.api.parsed_geometry(remote_id).await
    }

    async fn entity_table(&self, remote_id: &str) -> Result<EntityTable, ApiError> {
        self.api.entity_table(remote_id).await
    }

    async fn semantic_summary(&self, remote_id: &str) -> Result<SemanticSummary, ApiError> {
        self.api.semantic_summary(remote_id).await
    }

    async fn download_geometry(&self, remote_id: &str) -> Result<String, ApiError> {
        self.api.download_geometry(remote_id).await
    }
}
