//! Orchestration engine: drives job records through upload, remote
//! action, status polling, and best-effort artifact retrieval.
//!
//! Everything here is written against the [`drawbridge_client::CadBackend`]
//! seam, so the whole pipeline can be exercised with a scripted mock
//! backend in tests.

pub mod events;
pub mod fetcher;
pub mod poller;
pub mod runner;

pub use events::{channel, JobEvent};
pub use fetcher::RetryConfig;
pub use poller::PollConfig;
pub use runner::{BatchOutcome, BatchRunner};
