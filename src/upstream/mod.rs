//! Access to the external materials catalog.
//!
//! The [`Catalog`] trait is the seam between the gateway and the upstream
//! service. [`MaterialsProjectClient`] is the HTTP implementation;
//! [`MockCatalog`] serves canned envelopes in tests.

mod materials_project;
pub mod mock;

pub use materials_project::MaterialsProjectClient;
pub use mock::MockCatalog;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;
use crate::query::UpstreamQuery;

/// Path of the summary search endpoint, relative to the base URL
pub const SUMMARY_ENDPOINT: &str = "materials/summary/";

/// Paging metadata reported by the catalog
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct UpstreamMeta {
    #[serde(default)]
    pub total_doc: Option<u64>,

    #[serde(default)]
    pub message: Option<String>,
}

/// The `{ data, meta }` body every catalog endpoint returns
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct UpstreamEnvelope {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub data: Vec<Value>,

    #[serde(default)]
    pub meta: Option<UpstreamMeta>,
}

impl UpstreamEnvelope {
    pub fn new(data: Vec<Value>) -> Self {
        Self { data, meta: None }
    }

    /// Total result count, falling back to the length of this page
    pub fn total(&self) -> u64 {
        self.meta
            .as_ref()
            .and_then(|meta| meta.total_doc)
            .unwrap_or(self.data.len() as u64)
    }

    pub fn message(&self) -> Option<&str> {
        self.meta.as_ref().and_then(|meta| meta.message.as_deref())
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> std::result::Result<Vec<Value>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<Vec<Value>>::deserialize(deserializer)?.unwrap_or_default())
}

/// A catalog the gateway can query.
///
/// Implementations make exactly one outbound call per [`fetch`](Catalog::fetch)
/// and never retry.
#[async_trait]
pub trait Catalog: Send + Sync + std::fmt::Debug {
    /// Human-readable name of this catalog
    fn name(&self) -> &str;

    /// Fail early when the catalog cannot be reached for lack of credentials
    fn check_credentials(&self) -> Result<()> {
        Ok(())
    }

    /// GET `endpoint` with the compiled query and decode the envelope
    async fn fetch(&self, endpoint: &str, query: &UpstreamQuery) -> Result<UpstreamEnvelope>;
}
