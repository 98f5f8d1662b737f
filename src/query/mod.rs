//! Turning caller input into catalog queries.
//!
//! - [`normalize`]: untyped input to canonical [`SearchParams`](crate::models::SearchParams)
//! - [`compile_search`] / [`compile_dataset`]: canonical form to upstream query parameters
//! - [`parse_compiled`]: the inverse of [`compile_search`], for checking round trips

mod compile;
mod normalize;

pub use compile::{compile_dataset, compile_search, parse_compiled, UpstreamQuery, SUMMARY_FIELDS};
pub use normalize::{normalize, normalize_pairs, DetailRequest};
