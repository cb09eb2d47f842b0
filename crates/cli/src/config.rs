use std::time::Duration;

use drawbridge_pipeline::{PollConfig, RetryConfig};

/// Client configuration loaded from environment variables.
///
/// All fields have sensible defaults suitable for a local backend.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Backend base URL (default: `http://localhost:8000`).
    pub backend_url: String,
    /// Status poll interval in milliseconds (default: `1200`).
    pub poll_interval_ms: u64,
    /// Overall poll timeout in seconds; `0` disables the timeout
    /// (default: `600`).
    pub poll_timeout_secs: u64,
    /// Delay between artifact fetch retries in milliseconds
    /// (default: `800`).
    pub fetch_retry_ms: u64,
    /// Retries after the first artifact fetch attempt (default: `4`).
    pub fetch_retries: u32,
}

impl ClientConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var             | Default                  |
    /// |---------------------|--------------------------|
    /// | `BACKEND_URL`       | `http://localhost:8000`  |
    /// | `POLL_INTERVAL_MS`  | `1200`                   |
    /// | `POLL_TIMEOUT_SECS` | `600` (`0` = unbounded)  |
    /// | `FETCH_RETRY_MS`    | `800`                    |
    /// | `FETCH_RETRIES`     | `4`                      |
    pub fn from_env() -> Self {
        let backend_url =
            std::env::var("BACKEND_URL").unwrap_or_else(|_| "http://localhost:8000".into());

        let poll_interval_ms: u64 = std::env::var("POLL_INTERVAL_MS")
            .unwrap_or_else(|_| "1200".into())
            .parse()
            .expect("POLL_INTERVAL_MS must be a valid u64");

        let poll_timeout_secs: u64 = std::env::var("POLL_TIMEOUT_SECS")
            .unwrap_or_else(|_| "600".into())
            .parse()
            .expect("POLL_TIMEOUT_SECS must be a valid u64");

        let fetch_retry_ms: u64 = std::env::var("FETCH_RETRY_MS")
            .unwrap_or_else(|_| "800".into())
            .parse()
            .expect("FETCH_RETRY_MS must be a valid u64");

        let fetch_retries: u32 = std::env::var("FETCH_RETRIES")
            .unwrap_or_else(|_| "4".into())
            .parse()
            .expect("FETCH_RETRIES must be a valid u32");

        Self {
            backend_url,
            poll_interval_ms,
            poll_timeout_secs,
            fetch_retry_ms,
            fetch_retries,
        }
    }

    pub fn poll_config(&self) -> PollConfig {
        PollConfig {
            interval: Duration::from_millis(self.poll_interval_ms),
            timeout: match self.poll_timeout_secs {
                0 => None,
                secs => Some(Duration::from_secs(secs)),
            },
        }
    }

    pub fn retry_config(&self) -> RetryConfig {
        RetryConfig {
            delay: Duration::from_millis(self.fetch_retry_ms),
            max_retries: self.fetch_retries,
        }
    }
}
