//! Pure domain logic for the drawbridge client: job records and their
//! state machine, loose backend-status classification, entity-table and
//! semantic view models, bounding-box camera fitting, and ACI color
//! mapping.
//!
//! This crate performs no I/O. Everything that talks to the backend
//! lives in `drawbridge-client`; everything that schedules work lives
//! in `drawbridge-pipeline`.

pub mod bbox;
pub mod color;
pub mod error;
pub mod job;
pub mod payload;
pub mod semantic;
pub mod status;
pub mod table;

pub use error::CoreError;
