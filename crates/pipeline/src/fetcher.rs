//! Bounded-retry fetching for eventually-consistent artifacts.
//!
//! A job can report `done` before its derived artifacts (parsed
//! geometry, entity table, semantic summary) are queryable. The
//! fetcher retries a small fixed number of times against a
//! kind-specific readiness predicate and then returns whatever it last
//! saw -- deliberately never an error, so downstream rendering treats
//! an empty result as "still loading" rather than "definitively
//! empty".

use std::future::Future;
use std::time::Duration;

use drawbridge_client::{ApiError, CadBackend};
use drawbridge_core::job::JobRecord;
use drawbridge_core::payload::{EntityTable, ParsedGeometry, SemanticSummary};

/// Default delay between retry attempts.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(800);

/// Default number of additional attempts after the first (5 total).
pub const DEFAULT_MAX_RETRIES: u32 = 4;

/// Tunable parameters for the bounded-retry policy.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Delay between attempts.
    pub delay: Duration,
    /// Additional attempts after the first.
    pub max_retries: u32,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            delay: DEFAULT_RETRY_DELAY,
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }
}

/// Fetch until `is_ready` accepts the payload or the retry budget is
/// exhausted, in which case the last payload received is returned
/// as-is.
///
/// A 404 counts as "not materialized yet" and is retried; any other
/// error is a genuine transport failure and surfaces immediately.
pub async fn fetch_until_ready<T, F, Fut, P>(
    mut fetch: F,
    is_ready: P,
    config: &RetryConfig,
) -> Result<T, ApiError>
where
    T: Default,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ApiError>>,
    P: Fn(&T) -> bool,
{
    let attempts = config.max_retries + 1;
    let mut last = T::default();

    for attempt in 1..=attempts {
        match fetch().await {
            Ok(value) => {
                if is_ready(&value) {
                    return Ok(value);
                }
                last = value;
            }
            Err(ApiError::NotFound { ref path }) => {
                tracing::debug!(attempt, path = %path, "Artifact not materialized yet");
            }
            Err(e) => return Err(e),
        }

        if attempt < attempts {
            tokio::time::sleep(config.delay).await;
        }
    }

    tracing::debug!(attempts, "Retry budget exhausted, keeping partial payload");
    Ok(last)
}

/// Populate a job's parsed-geometry cache, best effort.
///
/// Returns without fetching when another fetch for the same cache is
/// already in flight, or when the job has no remote id yet.
pub async fn load_parsed_geometry(
    backend: &dyn CadBackend,
    job: &mut JobRecord,
    config: &RetryConfig,
) -> Result<(), ApiError> {
    let Some(remote_id) = job.remote_id().map(str::to_owned) else {
        return Ok(());
    };
    if !job.parsed_geometry.begin_load() {
        return Ok(());
    }

    let result = fetch_until_ready(
        || backend.parsed_geometry(&remote_id),
        ParsedGeometry::is_ready,
        config,
    )
    .await;

    match result {
        Ok(parsed) => {
            job.parsed_geometry.settle(Some(parsed));
            Ok(())
        }
        Err(e) => {
            job.parsed_geometry.settle(None);
            Err(e)
        }
    }
}

/// Populate a job's entity-table cache, best effort.
pub async fn load_entity_table(
    backend: &dyn CadBackend,
    job: &mut JobRecord,
    config: &RetryConfig,
) -> Result<(), ApiError> {
    let Some(remote_id) = job.remote_id().map(str::to_owned) else {
        return Ok(());
    };
    if !job.entity_table.begin_load() {
        return Ok(());
    }

    let result = fetch_until_ready(
        || backend.entity_table(&remote_id),
        EntityTable::is_ready,
        config,
    )
    .await;

    match result {
        Ok(table) => {
            job.entity_table.settle(Some(table));
            Ok(())
        }
        Err(e) => {
            job.entity_table.settle(None);
            Err(e)
        }
    }
}

/// Populate a job's semantic-summary cache, best effort.
pub async fn load_semantic_summary(
    backend: &dyn CadBackend,
    job: &mut JobRecord,
    config: &RetryConfig,
) -> Result<(), ApiError> {
    let Some(remote_id) = job.remote_id().map(str::to_owned) else {
        return Ok(());
    };
    if !job.semantic_summary.begin_load() {
        return Ok(());
    }

    let result = fetch_until_ready(
        || backend.semantic_summary(&remote_id),
        SemanticSummary::is_ready,
        config,
    )
    .await;

    match result {
        Ok(summary) => {
            job.semantic_summary.settle(Some(summary));
            Ok(())
        }
        Err(e) => {
            job.semantic_summary.settle(None);
            Err(e)
        }
    }
}
