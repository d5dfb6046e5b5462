//! Error types for the remote inference adapter

use distill_application::GatewayError;
use thiserror::Error;

/// Result type alias for remote service operations
pub type Result<T> = std::result::Result<T, RemoteError>;

/// Errors that can occur when talking to the inference service
#[derive(Error, Debug)]
pub enum RemoteError {
    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),

    #[error("Connection failed: {0}")]
    Connect(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Request error: {0}")]
    Request(String),

    #[error("HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    #[error("Invalid response body: {0}")]
    Decode(String),
}

impl RemoteError {
    /// Classify a transport error from `reqwest`.
    pub fn from_reqwest(e: &reqwest::Error) -> Self {
        if e.is_timeout() {
            RemoteError::Timeout(e.to_string())
        } else if e.is_connect() {
            RemoteError::Connect(e.to_string())
        } else if e.is_decode() {
            RemoteError::Decode(e.to_string())
        } else {
            RemoteError::Request(e.to_string())
        }
    }

    /// Build an error from a non-success response, keeping the body text.
    pub async fn from_response(response: reqwest::Response) -> Self {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        RemoteError::HttpStatus { status, body }
    }
}

impl From<RemoteError> for GatewayError {
    fn from(e: RemoteError) -> Self {
        match e {
            RemoteError::Connect(msg) => GatewayError::ConnectionError(msg),
            RemoteError::Timeout(_) => GatewayError::Timeout,
            RemoteError::HttpStatus { status, body } => GatewayError::HttpStatus { status, body },
            other => GatewayError::RequestFailed(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_maps_to_gateway_error() {
        assert_eq!(
            GatewayError::from(RemoteError::HttpStatus {
                status: 422,
                body: "bad".to_string()
            }),
            GatewayError::HttpStatus {
                status: 422,
                body: "bad".to_string()
            }
        );
        assert_eq!(
            GatewayError::from(RemoteError::Timeout("slow".to_string())),
            GatewayError::Timeout
        );
        assert_eq!(
            GatewayError::from(RemoteError::Connect("refused".to_string())),
            GatewayError::ConnectionError("refused".to_string())
        );
        assert!(matches!(
            GatewayError::from(RemoteError::Decode("eof".to_string())),
            GatewayError::RequestFailed(_)
        ));
    }
}
