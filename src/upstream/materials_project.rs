//! HTTP client for the Materials Project REST API.

use async_trait::async_trait;
use reqwest::header::ACCEPT;
use std::time::Duration;
use url::Url;

use crate::config::UpstreamConfig;
use crate::error::{GatewayError, Result};
use crate::query::UpstreamQuery;
use crate::upstream::{Catalog, UpstreamEnvelope};
use crate::utils::HttpClient;

/// Header carrying the API key on every call
const API_KEY_HEADER: &str = "x-api-key";

/// Materials Project catalog
///
/// Issues one authenticated GET per fetch. No retries.
#[derive(Debug, Clone)]
pub struct MaterialsProjectClient {
    http: HttpClient,
    base_url: Url,
    api_key: Option<String>,
}

impl MaterialsProjectClient {
    /// Build a client from the upstream section of the configuration
    pub fn new(config: &UpstreamConfig) -> Result<Self> {
        let http = HttpClient::new(
            Duration::from_secs(config.timeout_secs),
            Duration::from_secs(config.connect_timeout_secs),
        )
        .map_err(|e| GatewayError::Configuration(format!("Failed to create HTTP client: {}", e)))?;

        Self::with_http(http, &config.base_url, config.api_key.clone())
    }

    /// Build a client on top of an existing HTTP client
    pub fn with_http(http: HttpClient, base_url: &str, api_key: Option<String>) -> Result<Self> {
        let mut base_url = Url::parse(base_url).map_err(|e| {
            GatewayError::Configuration(format!("Invalid upstream base URL '{}': {}", base_url, e))
        })?;

        // Relative joins replace the last segment unless the path ends in '/'
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        Ok(Self {
            http,
            base_url,
            api_key: api_key.filter(|key| !key.trim().is_empty()),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Full URL for an endpoint with the compiled query attached
    fn build_url(&self, endpoint: &str, query: &UpstreamQuery) -> Result<Url> {
        let mut url = self.base_url.join(endpoint.trim_start_matches('/')).map_err(|e| {
            GatewayError::Configuration(format!("Invalid endpoint '{}': {}", endpoint, e))
        })?;

        if !query.is_empty() {
            url.query_pairs_mut()
                .extend_pairs(query.pairs().iter().map(|(k, v)| (k.as_str(), v.as_str())));
        }

        Ok(url)
    }
}

#[async_trait]
impl Catalog for MaterialsProjectClient {
    fn name(&self) -> &str {
        "Materials Project"
    }

    fn check_credentials(&self) -> Result<()> {
        match self.api_key {
            Some(_) => Ok(()),
            None => Err(GatewayError::missing_api_key()),
        }
    }

    async fn fetch(&self, endpoint: &str, query: &UpstreamQuery) -> Result<UpstreamEnvelope> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(GatewayError::missing_api_key)?;
        let url = self.build_url(endpoint, query)?;

        tracing::debug!(endpoint, params = query.len(), "Querying Materials Project");

        let response = self
            .http
            .client()
            .get(url)
            .header(API_KEY_HEADER, api_key)
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| {
                tracing::warn!(endpoint, error = %e, "Materials Project request failed");
                GatewayError::Transport(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = match response.text().await {
                Ok(body) => body,
                Err(e) => {
                    tracing::debug!(endpoint, error = %e, "Failed to read error body");
                    String::new()
                }
            };
            let message = if !body.trim().is_empty() {
                body
            } else if let Some(reason) = status.canonical_reason() {
                reason.to_string()
            } else {
                format!("Materials Project API returned status: {}", status)
            };
            tracing::warn!(endpoint, status = status.as_u16(), "Materials Project rejected request");
            return Err(GatewayError::Upstream { status, message });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;
        let envelope: UpstreamEnvelope = serde_json::from_slice(&bytes).map_err(|e| {
            tracing::warn!(endpoint, error = %e, "Malformed Materials Project response");
            GatewayError::from(e)
        })?;

        tracing::debug!(endpoint, returned = envelope.data.len(), "Materials Project responded");
        Ok(envelope)
    }
}
