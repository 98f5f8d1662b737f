//! Integration tests for the Materials Gateway
//!
//! These tests run the real HTTP client against a local mock of the
//! Materials Project API, through the gateway and the HTTP routes.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use materials_gateway::config::UpstreamConfig;
use materials_gateway::datasets::{DatasetKey, DatasetSelection};
use materials_gateway::models::RequestKind;
use materials_gateway::query::{compile_search, normalize, parse_compiled, DetailRequest};
use materials_gateway::server::router;
use materials_gateway::{Gateway, GatewayError, MaterialsProjectClient};
use mockito::{Matcher, Server, ServerGuard};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

const API_KEY: &str = "integration-test-key";

fn gateway_for(server: &ServerGuard, api_key: Option<&str>) -> Gateway {
    let config = UpstreamConfig {
        base_url: server.url(),
        api_key: api_key.map(String::from),
        timeout_secs: 5,
        connect_timeout_secs: 5,
    };
    let client = MaterialsProjectClient::new(&config).unwrap();
    Gateway::new(Arc::new(client))
}

async fn mock_dataset(server: &mut ServerGuard, path: &str, body: Value) -> mockito::Mock {
    server
        .mock("GET", path)
        .match_header("x-api-key", API_KEY)
        .match_query(Matcher::Any)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(body.to_string())
        .create_async()
        .await
}

#[tokio::test]
async fn test_search_end_to_end() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/materials/summary/")
        .match_header("x-api-key", API_KEY)
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("formula".into(), "LiFePO4".into()),
            Matcher::UrlEncoded("_limit".into(), "6".into()),
            Matcher::UrlEncoded("_skip".into(), "6".into()),
            Matcher::UrlEncoded("is_stable".into(), "true".into()),
            Matcher::UrlEncoded("_sort_fields".into(), "band_gap".into()),
            Matcher::UrlEncoded("band_gap_min".into(), "1".into()),
        ]))
        .with_status(200)
        .with_body(
            json!({
                "data": [
                    { "material_id": "mp-19017", "formula_pretty": "LiFePO4", "band_gap": 3.7 }
                ],
                "meta": { "total_doc": 7 }
            })
            .to_string(),
        )
        .create_async()
        .await;

    let gateway = gateway_for(&server, Some(API_KEY));
    let params = normalize(
        &json!({ "material": "LiFePO4", "page": "2", "limit": 2, "sort": "band_gap", "bandGap": { "min": 1 } }),
        RequestKind::Search,
    );
    let response = gateway.search(&params).await.unwrap();

    mock.assert_async().await;
    assert_eq!(response.data.len(), 1);
    assert_eq!(response.data[0].material_id, "mp-19017");
    assert_eq!(response.meta.total_doc, 7);
    assert_eq!(response.meta.limit, 6);
    assert_eq!(response.meta.skip, 6);
}

#[test]
fn test_compiled_search_round_trips() {
    let params = normalize(
        &json!({
            "chemsys": "Li-Fe-O",
            "excludeElements": "Co, Ni",
            "energyAboveHull": { "max": 0.05 },
            "sortField": "density",
            "sortOrder": "desc",
            "page": 4,
            "pageSize": 24
        }),
        RequestKind::Search,
    );

    let compiled = compile_search(&params);
    assert_eq!(compile_search(&parse_compiled(&compiled)), compiled);
}

#[tokio::test]
async fn test_detail_end_to_end() {
    let mut server = Server::new_async().await;
    let thermo = mock_dataset(
        &mut server,
        "/materials/thermo/",
        json!({ "data": [{ "material_id": "mp-149", "energy_above_hull": 0.0, "formation_energy_per_atom": 0.0 }] }),
    )
    .await;
    let substrates = mock_dataset(
        &mut server,
        "/materials/substrates/",
        json!({ "data": [{ "sub_id": "mp-2", "sub_form": "GaAs", "_norients": 3 }] }),
    )
    .await;
    let tasks = mock_dataset(
        &mut server,
        "/materials/tasks/",
        json!({ "data": [{ "task_id": "mp-1791", "task_type": "GGA Structure Optimization" }] }),
    )
    .await;

    let gateway = gateway_for(&server, Some(API_KEY));
    let request = DetailRequest::from_pairs(
        "mp-149",
        [("datasets", "thermo,substrates"), ("taskIds", "mp-1791")],
    );
    assert!(request.datasets.contains(DatasetSelection::TASKS));

    let detail = gateway.detail(&request).await.unwrap();

    thermo.assert_async().await;
    substrates.assert_async().await;
    tasks.assert_async().await;

    assert_eq!(
        detail.present(),
        vec![DatasetKey::Thermo, DatasetKey::Tasks, DatasetKey::Substrates]
    );
    let substrates = detail.substrates.unwrap();
    assert_eq!(substrates[0].norients, Some(3));
    assert_eq!(detail.tasks.unwrap().len(), 1);
}

#[tokio::test]
async fn test_detail_partial_failure_fails_whole_request() {
    let mut server = Server::new_async().await;
    let mut mocks = Vec::new();
    for path in ["/materials/thermo/", "/materials/magnetism/", "/materials/eos/"] {
        mocks.push(mock_dataset(&mut server, path, json!({ "data": [{ "material_id": "mp-149" }] })).await);
    }
    for path in ["/materials/dielectric/", "/materials/elasticity/"] {
        let mock = server
            .mock("GET", path)
            .match_query(Matcher::Any)
            .with_status(404)
            .with_body("No document found")
            .create_async()
            .await;
        mocks.push(mock);
    }

    let gateway = gateway_for(&server, Some(API_KEY));
    let request = DetailRequest::from_pairs(
        "mp-149",
        [("datasets", "thermo,magnetism,eos,dielectric,elasticity")],
    );

    let err = gateway.detail(&request).await.unwrap_err();
    assert_eq!(err.status(), StatusCode::NOT_FOUND);
    assert_eq!(err.to_string(), "No document found");
}

#[tokio::test]
async fn test_missing_api_key_never_reaches_upstream() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", Matcher::Any)
        .expect(0)
        .create_async()
        .await;

    let gateway = gateway_for(&server, None);
    let err = gateway
        .detail(&DetailRequest::from_pairs("mp-149", Vec::<(String, String)>::new()))
        .await
        .unwrap_err();

    mock.assert_async().await;
    assert!(matches!(err, GatewayError::Configuration(_)));
    assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_http_routes_over_real_client() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("GET", "/materials/summary/")
        .match_query(Matcher::Any)
        .with_status(401)
        .with_body("API key rejected")
        .create_async()
        .await;

    let app = router(Arc::new(gateway_for(&server, Some(API_KEY))));
    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/materials?elements=Si")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body, json!({ "error": "API key rejected" }));
}
