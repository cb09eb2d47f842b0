//! REST API client for the conversion/parsing backend.
//!
//! Wraps the backend HTTP endpoints (multipart upload, action trigger,
//! status query, artifact retrieval) using [`reqwest`]. Payload shapes
//! are backend-defined and only partially validated here; the heavy
//! lifting lives in [`crate::decode`].

use drawbridge_core::job::JobKind;
use drawbridge_core::payload::{EntityTable, ParsedGeometry, SemanticSummary};
use drawbridge_core::status::StatusReport;

use crate::decode;

/// Errors from the backend REST layer.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The HTTP request itself failed (network, DNS, TLS, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The backend answered 404. For artifact endpoints this usually
    /// means "not materialized yet" and is absorbed by the retry
    /// policy upstream.
    #[error("Not found: {path}")]
    NotFound { path: String },

    /// The backend returned another non-2xx status code.
    #[error("Backend error ({status}): {body}")]
    Http {
        /// HTTP status code.
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },

    /// The response body could not be normalized into the typed model.
    #[error("Unexpected payload: {0}")]
    Decode(String),
}

/// URL path segment for a job kind's endpoints.
fn kind_segment(kind: JobKind) -> &'static str {
    match kind {
        JobKind::Convert => "convert",
        JobKind::Analyze => "parsing",
    }
}

/// Remote action name triggered for a job kind.
fn kind_action(kind: JobKind) -> &'static str {
    match kind {
        JobKind::Convert => "convert",
        JobKind::Analyze => "parse",
    }
}

/// HTTP client for one backend instance.
pub struct CadApi {
    client: reqwest::Client,
    base_url: String,
}

impl CadApi {
    /// Create a new API client.
    ///
    /// * `base_url` - Base HTTP URL, e.g. `http://localhost:8000`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Create an API client reusing an existing [`reqwest::Client`]
    /// (connection pooling across components).
    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Upload a file via `POST /uploads/init`.
    ///
    /// Sends the bytes as a multipart form together with a client-side
    /// correlation id, and returns the server-assigned remote id
    /// (accepted under several field-name aliases).
    pub async fn upload(&self, file_name: &str, bytes: Vec<u8>) -> Result<String, ApiError> {
        let part = reqwest::multipart::Part::bytes(bytes).file_name(file_name.to_string());
        let form = reqwest::multipart::Form::new()
            .part("file", part)
            .text("client_ref", uuid::Uuid::new_v4().to_string());

        let response = self
            .client
            .post(format!("{}/uploads/init", self.base_url))
            .multipart(form)
            .send()
            .await?;

        let value = Self::parse_json(response).await?;
        let remote_id = decode::remote_id(&value)?;

        tracing::debug!(file_name, remote_id = %remote_id, "Upload accepted");
        Ok(remote_id)
    }

    /// Trigger the remote action for a job via
    /// `POST /{kind}/{remote_id}/{action}`.
    pub async fn trigger(&self, kind: JobKind, remote_id: &str) -> Result<(), ApiError> {
        let response = self
            .client
            .post(format!(
                "{}/{}/{}/{}",
                self.base_url,
                kind_segment(kind),
                remote_id,
                kind_action(kind),
            ))
            .send()
            .await?;

        Self::check_status(response).await
    }

    /// Query job status via `GET /{kind}/{remote_id}/status`.
    pub async fn status(&self, kind: JobKind, remote_id: &str) -> Result<StatusReport, ApiError> {
        let response = self
            .client
            .get(format!(
                "{}/{}/{}/status",
                self.base_url,
                kind_segment(kind),
                remote_id,
            ))
            .send()
            .await?;

        let value = Self::parse_json(response).await?;
        Ok(decode::status_report(&value))
    }

    /// Fetch the first-pass parse summary via
    /// `GET /parsing/{remote_id}/parsed1`.
    pub async fn parsed_geometry(&self, remote_id: &str) -> Result<ParsedGeometry, ApiError> {
        let response = self
            .client
            .get(format!("{}/parsing/{}/parsed1", self.base_url, remote_id))
            .send()
            .await?;

        let value = Self::parse_json(response).await?;
        Ok(decode::parsed_geometry(&value))
    }

    /// Fetch the flattened entity table via
    /// `GET /parsing/{remote_id}/entities-table`.
    pub async fn entity_table(&self, remote_id: &str) -> Result<EntityTable, ApiError> {
        let response = self
            .client
            .get(format!(
                "{}/parsing/{}/entities-table",
                self.base_url, remote_id,
            ))
            .send()
            .await?;

        let value = Self::parse_json(response).await?;
        Ok(decode::entity_table(&value))
    }

    /// Fetch the semantic summary via
    /// `GET /parsing/{remote_id}/semantic-summary`.
    pub async fn semantic_summary(&self, remote_id: &str) -> Result<SemanticSummary, ApiError> {
        let response = self
            .client
            .get(format!(
                "{}/parsing/{}/semantic-summary",
                self.base_url, remote_id,
            ))
            .send()
            .await?;

        let value = Self::parse_json(response).await?;
        Ok(decode::semantic_summary(&value))
    }

    /// Download the raw geometry text for preview via
    /// `GET /parsing/{remote_id}/download?kind=dxf`.
    pub async fn download_geometry(&self, remote_id: &str) -> Result<String, ApiError> {
        let response = self
            .client
            .get(format!("{}/parsing/{}/download", self.base_url, remote_id))
            .query(&[("kind", "dxf")])
            .send()
            .await?;

        let response = Self::ensure_success(response).await?;
        Ok(response.text().await?)
    }

    // ---- private helpers ----

    /// Map non-2xx responses to [`ApiError::NotFound`] / [`ApiError::Http`],
    /// returning the response unchanged on success.
    async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(ApiError::NotFound {
                path: response.url().path().to_string(),
            });
        }
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(ApiError::Http {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    /// Parse a successful response body as loose JSON.
    async fn parse_json(response: reqwest::Response) -> Result<serde_json::Value, ApiError> {
        let response = Self::ensure_success(response).await?;
        Ok(response.json::<serde_json::Value>().await?)
    }

    /// Assert a success status code, discarding the body.
    async fn check_status(response: reqwest::Response) -> Result<(), ApiError> {
        Self::ensure_success(response).await?;
        Ok(())
    }
}
