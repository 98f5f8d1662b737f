//! The gateway facade: summary search and multi-dataset material detail.

mod assembler;
mod orchestrator;

pub use assembler::shape;
pub use orchestrator::{aggregate, effective_selection};

use std::sync::Arc;

use crate::datasets::DatasetRegistry;
use crate::error::{GatewayError, Result};
use crate::models::{MaterialPropertyResponse, MaterialSummary, MaterialsMeta, MaterialsResponse, SearchParams};
use crate::query::{compile_search, DetailRequest};
use crate::upstream::{Catalog, SUMMARY_ENDPOINT};

/// Entry point for both request kinds, shared across handlers
#[derive(Debug, Clone)]
pub struct Gateway {
    catalog: Arc<dyn Catalog>,
    registry: DatasetRegistry,
}

impl Gateway {
    pub fn new(catalog: Arc<dyn Catalog>) -> Self {
        Self {
            catalog,
            registry: DatasetRegistry::new(),
        }
    }

    pub fn catalog(&self) -> &Arc<dyn Catalog> {
        &self.catalog
    }

    pub fn registry(&self) -> &DatasetRegistry {
        &self.registry
    }

    /// Run one page of a summary search.
    ///
    /// `meta.total_doc` is the catalog's reported total when present, else the
    /// number of records on this page.
    pub async fn search(&self, params: &SearchParams) -> Result<MaterialsResponse> {
        self.catalog.check_credentials()?;

        let query = compile_search(params);
        tracing::debug!(query = %query.to_query_string(), "Searching materials");

        let envelope = self.catalog.fetch(SUMMARY_ENDPOINT, &query).await?;
        let meta = MaterialsMeta {
            total_doc: envelope.total(),
            limit: params.page_size(),
            skip: params.offset(),
            message: envelope.message().map(String::from),
        };

        let data = envelope
            .data
            .into_iter()
            .map(serde_json::from_value::<MaterialSummary>)
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(GatewayError::from)?;

        tracing::info!(returned = data.len(), total = meta.total_doc, "Material search complete");
        Ok(MaterialsResponse { data, meta })
    }

    /// Fetch and merge the selected datasets for one material
    pub async fn detail(&self, request: &DetailRequest) -> Result<MaterialPropertyResponse> {
        let response = aggregate(Arc::clone(&self.catalog), self.registry, request).await?;
        tracing::info!(
            material_id = %response.material_id,
            datasets = response.present().len(),
            "Material detail complete"
        );
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datasets::DatasetKey;
    use crate::models::RequestKind;
    use crate::query::normalize;
    use crate::upstream::{MockCatalog, UpstreamEnvelope, UpstreamMeta};
    use http::StatusCode;
    use serde_json::json;

    fn summaries(count: usize) -> Vec<serde_json::Value> {
        (0..count)
            .map(|i| {
                json!({
                    "material_id": format!("mp-{}", i),
                    "formula_pretty": "Fe2O3",
                    "band_gap": 2.1,
                    "energy_above_hull": 0.0
                })
            })
            .collect()
    }

    #[tokio::test]
    async fn test_search_uses_reported_total() {
        let catalog = Arc::new(MockCatalog::new());
        catalog.respond_envelope(
            SUMMARY_ENDPOINT,
            UpstreamEnvelope {
                data: summaries(3),
                meta: Some(UpstreamMeta {
                    total_doc: Some(412),
                    message: None,
                }),
            },
        );
        let gateway = Gateway::new(catalog.clone());

        let params = normalize(&json!({ "formula": "Fe2O3", "page": 3 }), RequestKind::Search);
        let response = gateway.search(&params).await.unwrap();

        assert_eq!(response.data.len(), 3);
        assert_eq!(response.meta.total_doc, 412);
        assert_eq!(response.meta.limit, 18);
        assert_eq!(response.meta.skip, 36);

        let query = catalog.query_for(SUMMARY_ENDPOINT).unwrap();
        assert_eq!(query.get("formula"), Some("Fe2O3"));
        assert_eq!(query.get("_skip"), Some("36"));
    }

    #[tokio::test]
    async fn test_search_total_falls_back_to_page_length() {
        let catalog = Arc::new(MockCatalog::new());
        catalog.respond(SUMMARY_ENDPOINT, summaries(2));
        let gateway = Gateway::new(catalog);

        let response = gateway
            .search(&SearchParams::default().with_defaults())
            .await
            .unwrap();
        assert_eq!(response.meta.total_doc, 2);
        assert_eq!(response.meta.skip, 0);
    }

    #[tokio::test]
    async fn test_search_passes_through_map_shaped_fields() {
        let catalog = Arc::new(MockCatalog::new());
        catalog.respond(
            SUMMARY_ENDPOINT,
            vec![json!({
                "material_id": "mp-149",
                "formula_pretty": "Si",
                "has_props": { "elasticity": true, "dielectric": false },
                "calc_types": { "mp-1791": "GGA Static" }
            })],
        );
        let gateway = Gateway::new(catalog);

        let response = gateway
            .search(&SearchParams::default().with_defaults())
            .await
            .unwrap();
        assert_eq!(response.data.len(), 1);
        assert_eq!(
            response.data[0].has_props,
            Some(json!({ "elasticity": true, "dielectric": false }))
        );
    }

    #[tokio::test]
    async fn test_search_upstream_error_passes_through() {
        let catalog = Arc::new(MockCatalog::new());
        catalog.fail(SUMMARY_ENDPOINT, StatusCode::UNPROCESSABLE_ENTITY, "bad chemsys");
        let gateway = Gateway::new(catalog);

        let err = gateway
            .search(&SearchParams::default().with_defaults())
            .await
            .unwrap_err();
        assert_eq!(err.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(err.to_string(), "bad chemsys");
    }

    #[tokio::test]
    async fn test_search_without_credentials() {
        let gateway = Gateway::new(Arc::new(MockCatalog::without_credentials()));
        let err = gateway
            .search(&SearchParams::default().with_defaults())
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::Configuration(_)));
    }

    #[tokio::test]
    async fn test_detail_delegates_to_orchestrator() {
        let catalog = Arc::new(MockCatalog::new());
        catalog.respond(
            "materials/eos/",
            vec![json!({ "material_id": "mp-13", "energies": [1.0, 2.0] })],
        );
        let gateway = Gateway::new(catalog);

        let request = DetailRequest::from_pairs("mp-13", [("datasets", "eos,unknown")]);
        let response = gateway.detail(&request).await.unwrap();

        assert_eq!(response.present(), vec![DatasetKey::Eos]);
    }
}
