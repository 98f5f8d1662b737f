//! HTTP surface over the gateway.
//!
//! | Route | Handler |
//! |-------|---------|
//! | `GET /api/materials` | summary search from the query string |
//! | `POST /api/materials` | summary search from a JSON body |
//! | `GET /api/materials/{material_id}` | multi-dataset detail |
//! | `GET /api/datasets` | the dataset registry |
//! | `GET /api/health` | liveness |

use axum::{
    body::Bytes,
    extract::{Path, RawQuery, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::datasets::DatasetDescriptor;
use crate::error::GatewayError;
use crate::gateway::Gateway;
use crate::models::{MaterialPropertyResponse, MaterialsResponse, RequestKind};
use crate::query::{normalize, normalize_pairs, DetailRequest};

type SharedGateway = Arc<Gateway>;

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), error = ?self, "Request failed");
        } else {
            tracing::warn!(status = status.as_u16(), error = %self, "Request rejected");
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

/// Decode `application/x-www-form-urlencoded` query text into pairs
fn query_pairs(raw: Option<String>) -> Vec<(String, String)> {
    raw.map(|raw| {
        url::form_urlencoded::parse(raw.as_bytes())
            .into_owned()
            .collect()
    })
    .unwrap_or_default()
}

async fn search_get(
    State(gateway): State<SharedGateway>,
    RawQuery(raw): RawQuery,
) -> Result<Json<MaterialsResponse>, GatewayError> {
    let params = normalize_pairs(query_pairs(raw), RequestKind::Search);
    Ok(Json(gateway.search(&params).await?))
}

async fn search_post(
    State(gateway): State<SharedGateway>,
    body: Bytes,
) -> Result<Json<MaterialsResponse>, GatewayError> {
    // Unparseable bodies are searched as an empty filter set
    let input: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);
    let params = normalize(&input, RequestKind::Search);
    Ok(Json(gateway.search(&params).await?))
}

async fn material_detail(
    State(gateway): State<SharedGateway>,
    Path(material_id): Path<String>,
    RawQuery(raw): RawQuery,
) -> Result<Json<MaterialPropertyResponse>, GatewayError> {
    let request = DetailRequest::from_pairs(&material_id, query_pairs(raw));
    Ok(Json(gateway.detail(&request).await?))
}

async fn list_datasets(State(gateway): State<SharedGateway>) -> Json<Value> {
    let registry = gateway.registry();
    let defaults = registry.default_selection();
    let datasets: Vec<Value> = registry
        .all()
        .map(|descriptor: &DatasetDescriptor| {
            let mut entry = json!(descriptor);
            entry["default"] = json!(defaults.has(descriptor.key));
            entry
        })
        .collect();
    Json(json!({ "datasets": datasets }))
}

async fn health(State(gateway): State<SharedGateway>) -> (StatusCode, Json<Value>) {
    let configured = gateway.catalog().check_credentials().is_ok();
    (
        StatusCode::OK,
        Json(json!({
            "status": "ok",
            "version": crate::VERSION,
            "catalog": gateway.catalog().name(),
            "credentials": configured,
        })),
    )
}

/// Build the router with request tracing
pub fn router(gateway: SharedGateway) -> Router {
    Router::new()
        .route("/api/materials", get(search_get).post(search_post))
        .route("/api/materials/{material_id}", get(material_detail))
        .route("/api/datasets", get(list_datasets))
        .route("/api/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(gateway)
}

/// Bind `addr` and serve until Ctrl-C
pub async fn serve(gateway: SharedGateway, addr: &str) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Materials gateway listening on {}", listener.local_addr()?);

    axum::serve(listener, router(gateway))
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}
