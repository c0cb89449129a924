//! Error types for the secret manager library

use thiserror::Error;

/// Result type for secret manager operations
pub type Result<T> = std::result::Result<T, SecretsError>;

type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors shared by every secret backend
///
/// Both backends map their failures onto the same variants so callers can
/// branch on the kind of failure without knowing which backend is in use.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum SecretsError {
    /// An argument was rejected before any I/O took place
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The secret does not exist
    #[error("Secret not found: {0}")]
    NotFound(String),

    /// A secret with the same id already exists
    #[error("Secret already exists: {0}")]
    AlreadyExists(String),

    /// The remote secret service failed or returned an unusable response
    #[error("Secret service error: {message}")]
    Upstream {
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    /// Local filesystem error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to read or write a secret record
    #[error("Failed to serialize secret record: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl SecretsError {
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    pub fn not_found(secret_id: impl Into<String>) -> Self {
        Self::NotFound(secret_id.into())
    }

    pub fn already_exists(secret_id: impl Into<String>) -> Self {
        Self::AlreadyExists(secret_id.into())
    }

    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig(message.into())
    }

    /// Upstream failure without an underlying cause
    pub fn upstream(message: impl Into<String>) -> Self {
        Self::Upstream {
            message: message.into(),
            source: None,
        }
    }

    /// Upstream failure keeping the original error as its source
    pub fn upstream_with_source<E>(message: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Upstream {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    pub fn is_already_exists(&self) -> bool {
        matches!(self, Self::AlreadyExists(_))
    }

    /// True for failures raised by argument checks, before any I/O
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::InvalidArgument(_))
    }
}
