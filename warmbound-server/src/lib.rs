//! Warmbound ROI server and CLI.
//!
//! - `routes`: the axum research endpoint plus ROI and defaults routes
//! - `estimate`: single-company lookup, seed and edit flow for the CLI
//! - `batch`: CSV input estimated in parallel
//! - `report`: human and JSON rendering

pub mod batch;
pub mod config;
pub mod error;
pub mod estimate;
pub mod report;
pub mod routes;

pub use config::{Config, ConfigError};
pub use error::ApiError;
pub use routes::{create_router, AppState};
