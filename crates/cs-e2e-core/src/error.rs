//! Error types for cs-e2e-core

use thiserror::Error;

/// Result type alias using cs-e2e-core's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types for the harness
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: String },

    /// Invalid configuration values
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    /// YAML parsing error
    #[error("YAML parsing error: {0}")]
    YamlParse(#[from] serde_yaml_ng::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Template rendering error
    #[error("Template error: {0}")]
    Template(String),

    /// A write-once context value was read before being set
    #[error("Context value '{name}' has not been set yet")]
    ContextNotSet { name: &'static str },

    /// A write-once context value was set twice
    #[error("Context value '{name}' is already set and must not be mutated")]
    ContextAlreadySet { name: &'static str },
}

impl Error {
    /// Create a config not found error
    pub fn config_not_found(path: impl Into<String>) -> Self {
        Self::ConfigNotFound { path: path.into() }
    }

    /// Create an invalid config error
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Create a template error from a tera error, keeping its cause chain
    pub fn template(err: &tera::Error) -> Self {
        let mut message = err.to_string();
        let mut source = std::error::Error::source(err);
        while let Some(cause) = source {
            message.push_str(": ");
            message.push_str(&cause.to_string());
            source = cause.source();
        }
        Self::Template(message)
    }
}
