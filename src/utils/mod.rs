//! Utility modules supporting the gateway and its CLI.
//!
//! - [`HttpClient`]: shared reqwest client with bounded timeouts
//! - [`summary_table`], [`dataset_table`], [`detail_table`]: comfy-table renderings for the CLI

mod display;
mod http;

pub use display::{dataset_table, detail_table, fmt_number, summary_table, truncate};
pub use http::HttpClient;
