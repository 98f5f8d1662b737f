//! # Materials Gateway
//!
//! A query normalization and multi-dataset aggregation gateway in front of
//! the Materials Project catalog.
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - [`models`]: Canonical search parameters, summary records and per-dataset property types
//! - [`datasets`]: The static registry of detail datasets
//! - [`query`]: Parameter normalization and upstream query compilation
//! - [`upstream`]: The catalog client trait and its Materials Project implementation
//! - [`gateway`]: Summary search and the concurrent detail aggregation
//! - [`server`]: HTTP routes over the gateway
//! - [`utils`]: HTTP client and CLI table rendering
//! - [`config`]: Configuration management

pub mod config;
pub mod datasets;
pub mod error;
pub mod gateway;
pub mod models;
pub mod query;
pub mod server;
pub mod upstream;
pub mod utils;

// Re-export commonly used types
pub use error::{GatewayError, Result};
pub use gateway::Gateway;
pub use upstream::{Catalog, MaterialsProjectClient};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
