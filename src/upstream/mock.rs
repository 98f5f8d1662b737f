//! Mock catalog for testing purposes.

use async_trait::async_trait;
use http::StatusCode;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use crate::error::{GatewayError, Result};
use crate::query::UpstreamQuery;
use crate::upstream::{Catalog, UpstreamEnvelope};

#[derive(Debug, Clone)]
enum Reply {
    Envelope(UpstreamEnvelope),
    Status(StatusCode, String),
    Network(String),
}

/// A catalog that returns predefined envelopes per endpoint and records calls.
///
/// Endpoints with nothing configured answer with an empty page.
#[derive(Debug, Default)]
pub struct MockCatalog {
    replies: Mutex<HashMap<String, Reply>>,
    delays: Mutex<HashMap<String, Duration>>,
    calls: Mutex<Vec<(String, UpstreamQuery)>>,
    missing_credentials: bool,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn endpoint_key(endpoint: &str) -> String {
    endpoint.trim_matches('/').to_string()
}

impl MockCatalog {
    /// Create a new mock catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// A catalog that reports a missing credential.
    pub fn without_credentials() -> Self {
        Self {
            missing_credentials: true,
            ..Self::default()
        }
    }

    /// Answer `endpoint` with these records.
    pub fn respond(&self, endpoint: &str, data: Vec<Value>) -> &Self {
        self.set_reply(endpoint, Reply::Envelope(UpstreamEnvelope::new(data)))
    }

    /// Answer `endpoint` with a full envelope, including meta.
    pub fn respond_envelope(&self, endpoint: &str, envelope: UpstreamEnvelope) -> &Self {
        self.set_reply(endpoint, Reply::Envelope(envelope))
    }

    /// Fail `endpoint` with a non-success status.
    pub fn fail(&self, endpoint: &str, status: StatusCode, message: &str) -> &Self {
        self.set_reply(endpoint, Reply::Status(status, message.to_string()))
    }

    /// Fail `endpoint` as if the network were down.
    pub fn fail_network(&self, endpoint: &str, message: &str) -> &Self {
        self.set_reply(endpoint, Reply::Network(message.to_string()))
    }

    /// Hold the reply for `endpoint` back by `delay`.
    pub fn delay(&self, endpoint: &str, delay: Duration) -> &Self {
        lock(&self.delays).insert(endpoint_key(endpoint), delay);
        self
    }

    /// Calls made so far, in order of arrival.
    pub fn calls(&self) -> Vec<(String, UpstreamQuery)> {
        lock(&self.calls).clone()
    }

    pub fn call_count(&self) -> usize {
        lock(&self.calls).len()
    }

    /// The query sent to `endpoint`, if it was called.
    pub fn query_for(&self, endpoint: &str) -> Option<UpstreamQuery> {
        let key = endpoint_key(endpoint);
        lock(&self.calls)
            .iter()
            .find(|(called, _)| endpoint_key(called) == key)
            .map(|(_, query)| query.clone())
    }

    fn set_reply(&self, endpoint: &str, reply: Reply) -> &Self {
        lock(&self.replies).insert(endpoint_key(endpoint), reply);
        self
    }
}

#[async_trait]
impl Catalog for MockCatalog {
    fn name(&self) -> &str {
        "Mock Catalog"
    }

    fn check_credentials(&self) -> Result<()> {
        if self.missing_credentials {
            Err(GatewayError::missing_api_key())
        } else {
            Ok(())
        }
    }

    async fn fetch(&self, endpoint: &str, query: &UpstreamQuery) -> Result<UpstreamEnvelope> {
        self.check_credentials()?;
        lock(&self.calls).push((endpoint.to_string(), query.clone()));

        let key = endpoint_key(endpoint);
        let delay = lock(&self.delays).get(&key).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let reply = lock(&self.replies).get(&key).cloned();
        match reply {
            Some(Reply::Envelope(envelope)) => Ok(envelope),
            Some(Reply::Status(status, message)) => Err(GatewayError::Upstream { status, message }),
            Some(Reply::Network(message)) => Err(GatewayError::Transport(message)),
            None => Ok(UpstreamEnvelope::default()),
        }
    }
}
