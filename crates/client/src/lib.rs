//! HTTP client for the CAD conversion/parsing backend.
//!
//! [`api::CadApi`] wraps the REST endpoints with [`reqwest`];
//! [`decode`] is the tolerant-decode boundary that normalizes the
//! backend's loosely-shaped JSON into the typed `drawbridge-core`
//! payload model; [`backend::CadBackend`] is the seam the pipeline is
//! written against, so orchestration logic can be driven by a mock in
//! tests.

pub mod api;
pub mod backend;
pub mod decode;

pub use api::{ApiError, CadApi};
pub use backend::{CadBackend, HttpBackend};
