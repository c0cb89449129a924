//! # Secret Manager Library
//!
//! Create, read, update and delete named secrets through one interface with
//! two interchangeable backends.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     SecretsClient                           │
//! │  ┌─────────────────────────────────────────────────────┐   │
//! │  │  dyn SecretManagerService (chosen at construction)  │   │
//! │  │   ├─ AwsSecretManagerService → Secrets Manager API  │   │
//! │  │   └─ FileSecretService       → <root>/<id>.json     │   │
//! │  └─────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use secret_manager::{SecretsClient, SecretsConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), secret_manager::SecretsError> {
//!     let config = SecretsConfig::from_env()?;
//!     let client = SecretsClient::new(config)?;
//!
//!     client.create_secret("db-pass", "s3cr3t").await?;
//!     let value = client.get_secret_value("db-pass").await?;
//!
//!     // Deleting twice is fine
//!     client.delete_secret("db-pass").await?;
//!     client.delete_secret("db-pass").await?;
//!     Ok(())
//! }
//! ```

mod config;
mod error;
mod service;
pub mod validation;

pub mod providers;

pub use config::{AwsConfig, BackendKind, FileConfig, SecretsConfig, DEFAULT_FILE_ROOT};
pub use error::{Result, SecretsError};
pub use service::SecretManagerService;

use providers::{AwsSecretManagerService, FileSecretService};
use secrecy::{ExposeSecret, Secret};
use std::sync::Arc;
use tracing::{debug, info};

/// Main client for managing secrets through the configured backend
#[derive(Clone)]
pub struct SecretsClient {
    service: Arc<dyn SecretManagerService>,
}

impl SecretsClient {
    /// Create a client with the backend selected by `config`
    pub fn new(config: SecretsConfig) -> Result<Self> {
        let service: Arc<dyn SecretManagerService> = match config.backend {
            BackendKind::Aws => {
                if !config.aws.is_configured() {
                    return Err(SecretsError::invalid_config(
                        "AWS backend requires an access key, a secret key and a region",
                    ));
                }
                Arc::new(AwsSecretManagerService::new(&config.aws)?)
            }
            BackendKind::File => Arc::new(FileSecretService::new(config.file.root())?),
        };

        info!(backend = %service.name(), "Secrets client initialized");
        Ok(Self { service })
    }

    /// Create a client around an existing backend
    pub fn with_service(service: Arc<dyn SecretManagerService>) -> Self {
        Self { service }
    }

    /// Create a client using the file backend rooted at `root_dir` (for testing/development)
    pub fn file(root_dir: impl Into<String>) -> Result<Self> {
        Ok(Self {
            service: Arc::new(FileSecretService::new(root_dir)?),
        })
    }

    pub async fn create_secret(&self, secret_id: &str, content: &str) -> Result<()> {
        self.service.create_secret(secret_id, content).await
    }

    pub async fn update_secret_value(&self, secret_id: &str, content: &str) -> Result<()> {
        self.service.update_secret_value(secret_id, content).await
    }

    pub async fn update_secret_description(&self, secret_id: &str, description: &str) -> Result<()> {
        self.service
            .update_secret_description(secret_id, description)
            .await
    }

    /// Get a secret by id. Fails with [`SecretsError::NotFound`] if it does not exist.
    pub async fn get_secret(&self, secret_id: &str) -> Result<Secret<String>> {
        self.service.get_secret(secret_id).await
    }

    /// Get a secret by id, returning None if not found
    pub async fn get_secret_optional(&self, secret_id: &str) -> Result<Option<Secret<String>>> {
        match self.service.get_secret(secret_id).await {
            Ok(secret) => Ok(Some(secret)),
            Err(SecretsError::NotFound(_)) => {
                debug!(secret_id = %secret_id, backend = %self.backend_name(), "Secret not found");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Get a secret and expose its value (convenience method)
    pub async fn get_secret_value(&self, secret_id: &str) -> Result<String> {
        Ok(self.get_secret(secret_id).await?.expose_secret().clone())
    }

    /// Check if a secret exists
    pub async fn has_secret(&self, secret_id: &str) -> Result<bool> {
        Ok(self.get_secret_optional(secret_id).await?.is_some())
    }

    /// Delete a secret; absent secrets are ignored
    pub async fn delete_secret(&self, secret_id: &str) -> Result<()> {
        self.service.delete_secret(secret_id).await
    }

    /// Name of the backend in use
    pub fn backend_name(&self) -> &'static str {
        self.service.name()
    }

    /// Check if the backend is healthy/reachable
    pub async fn health_check(&self) -> Result<()> {
        self.service.health_check().await
    }

    /// The underlying backend
    pub fn service(&self) -> Arc<dyn SecretManagerService> {
        Arc::clone(&self.service)
    }
}
