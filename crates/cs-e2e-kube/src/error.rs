//! Error types for Kubernetes access

use cs_e2e_core::classify::{classify_status, classify_transport_message};
use cs_e2e_core::{Classify, ErrorClass};
use thiserror::Error;

/// Result type alias for Kubernetes operations
pub type Result<T> = std::result::Result<T, KubeError>;

/// Errors from the Kubernetes side of the harness
#[derive(Error, Debug)]
pub enum KubeError {
    /// The kubeconfig could not be read or turned into a client config
    #[error("Failed to load kubeconfig {path}: {message}")]
    Kubeconfig { path: String, message: String },

    /// The API server answered with an error status
    #[error("Kubernetes API error ({code} {reason}): {message}")]
    Api {
        code: u16,
        reason: String,
        message: String,
    },

    /// Any other client failure (connection, TLS, decoding)
    #[error("Kubernetes client error: {0}")]
    Client(String),

    /// The cluster reported no nodes
    #[error("No nodes found in cluster")]
    NoNodes,

    /// A node lacks a label the harness relies on
    #[error("Node {node:?} is missing label {label:?}")]
    MissingLabel { node: String, label: &'static str },
}

impl From<kube::Error> for KubeError {
    fn from(err: kube::Error) -> Self {
        match err {
            kube::Error::Api(response) => Self::Api {
                code: response.code,
                reason: response.reason,
                message: response.message,
            },
            other => {
                let mut message = other.to_string();
                let mut source = std::error::Error::source(&other);
                while let Some(cause) = source {
                    message.push_str(": ");
                    message.push_str(&cause.to_string());
                    source = cause.source();
                }
                Self::Client(message)
            }
        }
    }
}

impl Classify for KubeError {
    fn class(&self) -> ErrorClass {
        match self {
            // Timeout reasons are the API server's retry hint
            Self::Api { code, reason, .. } => {
                classify_status(*code, matches!(reason.as_str(), "ServerTimeout" | "Timeout"))
            }
            Self::Client(message) => classify_transport_message(message),
            _ => ErrorClass::Permanent,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cs_e2e_core::{is_auth_error, is_retryable};

    fn api(code: u16, reason: &str) -> KubeError {
        KubeError::Api {
            code,
            reason: reason.to_string(),
            message: "test".to_string(),
        }
    }

    #[test]
    fn test_api_classification() {
        assert!(is_retryable(&api(500, "InternalError")));
        assert!(is_retryable(&api(429, "TooManyRequests")));
        assert!(is_retryable(&api(504, "Timeout")));
        assert!(is_auth_error(&api(403, "Forbidden")));
        assert!(is_auth_error(&api(401, "Unauthorized")));
        assert_eq!(api(404, "NotFound").class(), ErrorClass::NotFound);
        assert_eq!(api(422, "Invalid").class(), ErrorClass::Permanent);
    }

    #[test]
    fn test_client_error_classification() {
        assert!(is_retryable(&KubeError::Client(
            "HyperError: connection reset by peer".to_string()
        )));
        assert!(!is_retryable(&KubeError::Client(
            "Error deserializing response".to_string()
        )));
        assert_eq!(KubeError::NoNodes.class(), ErrorClass::Permanent);
    }

    #[test]
    fn test_from_kube_api_error() {
        let err: KubeError = kube::Error::Api(kube::core::ErrorResponse {
            status: "Failure".to_string(),
            message: "pods is forbidden".to_string(),
            reason: "Forbidden".to_string(),
            code: 403,
        })
        .into();

        assert!(matches!(err, KubeError::Api { code: 403, .. }));
        assert!(is_auth_error(&err));
    }
}
