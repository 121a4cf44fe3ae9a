//! Error types for the Containership Cloud client

use cs_e2e_core::classify::{classify_status, classify_transport_message};
use cs_e2e_core::{Classify, ErrorClass};
use thiserror::Error;

/// Result type alias for cloud operations
pub type Result<T> = std::result::Result<T, CloudError>;

/// Errors returned by the cloud client
#[derive(Error, Debug)]
pub enum CloudError {
    /// The API answered with a non-success status
    #[error("{method} {url} returned {status}: {}", body_or_placeholder(.body))]
    Http {
        method: String,
        url: String,
        status: u16,
        body: String,
        /// Raw `Retry-After` header, if the server sent one
        retry_after: Option<String>,
    },

    /// The request never got a response
    #[error("{method} {url} failed: {message}")]
    Transport {
        method: String,
        url: String,
        message: String,
        transient: bool,
    },

    /// The response body did not match the expected shape
    #[error("Failed to decode response from {url}: {message}")]
    Decode { url: String, message: String },

    /// The HTTP client could not be constructed
    #[error("Failed to build HTTP client: {0}")]
    Client(String),

    /// An infrastructure template could not be turned into a request
    #[error("Invalid template: {0}")]
    InvalidTemplate(String),

    /// Cluster create options failed validation
    #[error("Invalid cluster create options: {0}")]
    InvalidOptions(String),

    /// A template names a provider this harness cannot provision on
    #[error("Unknown provider name {0:?}")]
    UnknownProvider(String),
}

fn body_or_placeholder(body: &str) -> &str {
    if body.trim().is_empty() {
        "(no response body)"
    } else {
        body
    }
}

impl CloudError {
    /// Build a transport error from a reqwest error, keeping its cause chain
    pub(crate) fn transport(method: &reqwest::Method, url: &str, err: reqwest::Error) -> Self {
        let transient = err.is_timeout() || err.is_connect();
        let mut message = err.to_string();
        let mut source = std::error::Error::source(&err);
        while let Some(cause) = source {
            message.push_str(": ");
            message.push_str(&cause.to_string());
            source = cause.source();
        }
        let transient =
            transient || classify_transport_message(&message) == ErrorClass::Transient;

        Self::Transport {
            method: method.to_string(),
            url: url.to_string(),
            message,
            transient,
        }
    }

    /// HTTP status code, if the API answered
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl Classify for CloudError {
    fn class(&self) -> ErrorClass {
        match self {
            Self::Http {
                status,
                retry_after,
                ..
            } => classify_status(*status, retry_after.is_some()),
            Self::Transport { transient: true, .. } => ErrorClass::Transient,
            _ => ErrorClass::Permanent,
        }
    }
}
