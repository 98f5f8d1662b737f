//! Error taxonomy shared by the upstream client, the orchestrator and the HTTP surface.

use http::StatusCode;

/// Message used when the upstream body cannot be decoded.
const MALFORMED_BODY_MESSAGE: &str = "Materials Project returned a malformed response.";

/// Errors that can reach a caller of the gateway.
///
/// Normalization and query compilation never fail; every variant here originates
/// from the upstream client or from the detail input check.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// The upstream credential is not configured
    #[error("{0}")]
    Configuration(String),

    /// Non-success status from the catalog, with its body text
    #[error("{message}")]
    Upstream { status: StatusCode, message: String },

    /// Network failure or timeout reaching the catalog
    #[error("Network error: {0}")]
    Transport(String),

    /// Invalid caller input (e.g. tasks requested without task ids)
    #[error("{0}")]
    ClientInput(String),

    /// Upstream body that does not match the expected shape
    #[error("{}", MALFORMED_BODY_MESSAGE)]
    Decode(String),
}

impl GatewayError {
    /// HTTP status to report to the caller
    pub fn status(&self) -> StatusCode {
        match self {
            GatewayError::Configuration(_) => StatusCode::INTERNAL_SERVER_ERROR,
            GatewayError::Upstream { status, .. } => *status,
            GatewayError::Transport(_) | GatewayError::Decode(_) => StatusCode::BAD_GATEWAY,
            GatewayError::ClientInput(_) => StatusCode::BAD_REQUEST,
        }
    }

    /// Missing-credential error
    pub fn missing_api_key() -> Self {
        GatewayError::Configuration(
            "MP_API_KEY is not configured; cannot reach the Materials Project API.".to_string(),
        )
    }
}

impl From<reqwest::Error> for GatewayError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            GatewayError::Decode(err.to_string())
        } else {
            GatewayError::Transport(err.to_string())
        }
    }
}

impl From<serde_json::Error> for GatewayError {
    fn from(err: serde_json::Error) -> Self {
        GatewayError::Decode(format!("JSON: {}", err))
    }
}

/// Result alias used across the crate
pub type Result<T> = std::result::Result<T, GatewayError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            GatewayError::missing_api_key().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            GatewayError::Transport("refused".into()).status(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            GatewayError::ClientInput("no task ids".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            GatewayError::Decode("eof".into()).status(),
            StatusCode::BAD_GATEWAY
        );

        let upstream = GatewayError::Upstream {
            status: StatusCode::NOT_FOUND,
            message: "material not found".into(),
        };
        assert_eq!(upstream.status(), StatusCode::NOT_FOUND);
        assert_eq!(upstream.to_string(), "material not found");
    }

    #[test]
    fn test_decode_message_is_generic() {
        let err = GatewayError::Decode("expected value at line 1 column 1".into());
        assert_eq!(err.to_string(), MALFORMED_BODY_MESSAGE);
    }
}
