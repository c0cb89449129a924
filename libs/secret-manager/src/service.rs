//! Trait definition for secret backends

use async_trait::async_trait;
use secrecy::Secret;

use crate::Result;

/// Create, read, update and delete named secrets
///
/// Implemented by the AWS Secrets Manager backend and the local file backend.
/// Every operation rejects a blank secret id with
/// [`SecretsError::InvalidArgument`](crate::SecretsError::InvalidArgument)
/// before touching the network or the filesystem.
#[async_trait]
pub trait SecretManagerService: Send + Sync {
    /// Create a new secret holding `content`
    async fn create_secret(&self, secret_id: &str, content: &str) -> Result<()>;

    /// Replace the value of an existing secret, keeping its description
    async fn update_secret_value(&self, secret_id: &str, content: &str) -> Result<()>;

    /// Replace the description of an existing secret, keeping its value.
    /// A blank description is allowed.
    async fn update_secret_description(&self, secret_id: &str, description: &str) -> Result<()>;

    /// Get the current value of a secret
    async fn get_secret(&self, secret_id: &str) -> Result<Secret<String>>;

    /// Delete a secret. Deleting a secret that does not exist is not an error.
    async fn delete_secret(&self, secret_id: &str) -> Result<()>;

    /// Get the backend name (for logging)
    fn name(&self) -> &'static str;

    /// Check if the backend is healthy/reachable
    async fn health_check(&self) -> Result<()> {
        Ok(())
    }
}
