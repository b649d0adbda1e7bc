//! Error types for the cluster API client.
//!
//! # Design
//! Every failure is returned to the immediate caller. Status and decode
//! errors keep the raw response body so callers can inspect what the server
//! actually sent; `ApiError::raw_body` exposes it uniformly.

use thiserror::Error;

use crate::http::HttpMethod;
use crate::transport::{BodyReadError, TransportError};

/// Errors returned by `Client` and every `ClusterApi` implementation.
#[derive(Debug, Error)]
pub enum ApiError {
    /// No HTTP response was obtained (connect, DNS or TLS failure).
    #[error("transport error: {0}")]
    Transport(#[source] TransportError),

    /// The server answered with a status outside 200..=206.
    #[error(
        "request [{method} {path}] failed ({status}) {reason}: {}",
        String::from_utf8_lossy(.body)
    )]
    Status {
        method: HttpMethod,
        path: String,
        status: u16,
        reason: String,
        body: Vec<u8>,
    },

    /// The server answered but its body broke off. `body` holds what arrived.
    #[error("failed to read response body (status {status}) after {} bytes: {source}", .body.len())]
    BodyRead {
        status: u16,
        #[source]
        source: std::io::Error,
        body: Vec<u8>,
    },

    /// The request payload could not be serialized. No request was sent.
    #[error("failed to encode request body: {0}")]
    Encode(#[source] serde_json::Error),

    /// The response body could not be deserialized into the expected type.
    #[error("failed to decode response body: {source}")]
    Decode {
        #[source]
        source: serde_json::Error,
        body: Vec<u8>,
    },
}

impl ApiError {
    /// Classify a transport failure, keeping any partial body it carries.
    pub fn from_transport(error: TransportError) -> Self {
        match error.downcast::<BodyReadError>() {
            Ok(read) => {
                let BodyReadError {
                    status,
                    partial,
                    source,
                } = *read;
                ApiError::BodyRead {
                    status,
                    source,
                    body: partial,
                }
            }
            Err(other) => ApiError::Transport(other),
        }
    }

    /// Bytes the server returned, if a response was received.
    pub fn raw_body(&self) -> Option<&[u8]> {
        match self {
            ApiError::Status { body, .. } | ApiError::Decode { body, .. } | ApiError::BodyRead { body, .. } => {
                Some(body)
            }
            ApiError::Transport(_) | ApiError::Encode(_) => None,
        }
    }

    /// HTTP status of a failed response.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_error() -> ApiError {
        ApiError::Status {
            method: HttpMethod::Get,
            path: "pods/missing".to_string(),
            status: 404,
            reason: "Not Found".to_string(),
            body: b"pod missing not found".to_vec(),
        }
    }

    #[test]
    fn status_message_carries_full_context() {
        let message = status_error().to_string();
        assert_eq!(
            message,
            "request [GET pods/missing] failed (404) Not Found: pod missing not found"
        );
    }

    #[test]
    fn status_error_exposes_body_and_code() {
        let err = status_error();
        assert_eq!(err.raw_body(), Some(&b"pod missing not found"[..]));
        assert_eq!(err.status(), Some(404));
        assert!(err.is_not_found());
    }

    #[test]
    fn transport_error_has_no_body() {
        let err = ApiError::Transport("connection refused".into());
        assert!(err.raw_body().is_none());
        assert!(err.status().is_none());
        assert_eq!(err.to_string(), "transport error: connection refused");
    }

    #[test]
    fn from_transport_keeps_partial_body() {
        let error: TransportError = Box::new(BodyReadError {
            status: 200,
            partial: b"{\"items\":[".to_vec(),
            source: std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "eof"),
        });
        let err = ApiError::from_transport(error);
        assert!(matches!(err, ApiError::BodyRead { status: 200, .. }));
        assert_eq!(err.raw_body(), Some(&b"{\"items\":["[..]));
        assert!(err.to_string().contains("after 10 bytes"));
    }

    #[test]
    fn from_transport_passes_other_errors_through() {
        let err = ApiError::from_transport("dns lookup failed".into());
        assert!(matches!(err, ApiError::Transport(_)));
    }
}
