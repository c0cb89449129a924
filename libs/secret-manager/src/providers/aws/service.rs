//! AWS Secrets Manager backend
//!
//! A pass-through adapter: every operation is one round-trip to the service,
//! nothing is cached locally. Versioning, encryption and access control stay
//! with Secrets Manager.
//!
//! Arguments are checked locally before any call, with the same rules as the
//! file backend. This is stricter than Secrets Manager itself: a blank
//! secret value on create or update is rejected with `InvalidArgument` here,
//! although the service would store it.

use async_trait::async_trait;
use secrecy::Secret;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info};

use super::api::{
    AwsApiError, CreateSecretRequest, DeleteSecretRequest, GetSecretValueRequest,
    ListSecretsRequest, SecretsManagerApi, UpdateSecretRequest,
};
use super::client::SecretsManagerHttpClient;
use crate::validation::{is_blank, validate_content, validate_secret_id};
use crate::{AwsConfig, Result, SecretManagerService, SecretsError};

/// How `delete_secret` asks Secrets Manager to delete
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeleteOptions {
    /// Delete immediately, with no recovery window
    pub force_delete_without_recovery: bool,
    /// Days before a scheduled deletion completes; service default when `None`
    pub recovery_window_in_days: Option<i64>,
}

impl From<&AwsConfig> for DeleteOptions {
    fn from(config: &AwsConfig) -> Self {
        Self {
            force_delete_without_recovery: config.force_delete_without_recovery,
            recovery_window_in_days: config.recovery_window_in_days,
        }
    }
}

/// Secret backend backed by AWS Secrets Manager
pub struct AwsSecretManagerService<C = SecretsManagerHttpClient>
where
    C: SecretsManagerApi,
{
    client: Arc<C>,
    delete_options: DeleteOptions,
}

impl AwsSecretManagerService<SecretsManagerHttpClient> {
    /// Build the backend and its HTTP client from configuration
    pub fn new(config: &AwsConfig) -> Result<Self> {
        let client = SecretsManagerHttpClient::new(config)?;

        info!(
            region = %client.region(),
            endpoint = %client.endpoint(),
            "AWS Secrets Manager backend initialized"
        );

        Ok(Self::with_client(Arc::new(client)).with_delete_options(DeleteOptions::from(config)))
    }
}

impl<C> AwsSecretManagerService<C>
where
    C: SecretsManagerApi,
{
    pub fn with_client(client: Arc<C>) -> Self {
        Self {
            client,
            delete_options: DeleteOptions::default(),
        }
    }

    pub fn with_delete_options(mut self, delete_options: DeleteOptions) -> Self {
        self.delete_options = delete_options;
        self
    }

    pub fn delete_options(&self) -> DeleteOptions {
        self.delete_options
    }

    fn delete_request(&self, secret_id: &str) -> DeleteSecretRequest {
        let options = self.delete_options;
        DeleteSecretRequest {
            secret_id: secret_id.to_string(),
            force_delete_without_recovery: options.force_delete_without_recovery.then_some(true),
            // The service rejects a recovery window combined with a forced delete
            recovery_window_in_days: if options.force_delete_without_recovery {
                None
            } else {
                options.recovery_window_in_days
            },
        }
    }
}

/// Map a failed call onto the shared error kinds, logging it first
fn call_failed(operation: &str, secret_id: &str, err: AwsApiError) -> SecretsError {
    error!(
        operation = %operation,
        secret_id = %secret_id,
        error = %err,
        "Secrets Manager call failed"
    );

    if err.is_resource_not_found() {
        return SecretsError::not_found(secret_id);
    }
    if err.is_resource_exists() {
        return SecretsError::already_exists(secret_id);
    }
    let message = err.to_string();
    SecretsError::upstream_with_source(message, err)
}

#[async_trait]
impl<C> SecretManagerService for AwsSecretManagerService<C>
where
    C: SecretsManagerApi,
{
    async fn create_secret(&self, secret_id: &str, content: &str) -> Result<()> {
        validate_secret_id(secret_id)?;
        validate_content(content)?;

        let started = Instant::now();
        let request = CreateSecretRequest {
            name: secret_id.to_string(),
            secret_string: Some(content.to_string()),
            description: None,
        };
        self.client
            .create_secret(request)
            .await
            .map_err(|e| call_failed("CreateSecret", secret_id, e))?;

        debug!(
            secret_id = %secret_id,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Secret created"
        );
        Ok(())
    }

    async fn update_secret_value(&self, secret_id: &str, content: &str) -> Result<()> {
        validate_secret_id(secret_id)?;
        validate_content(content)?;

        let started = Instant::now();
        let request = UpdateSecretRequest {
            secret_id: secret_id.to_string(),
            secret_string: Some(content.to_string()),
            description: None,
        };
        self.client
            .update_secret(request)
            .await
            .map_err(|e| call_failed("UpdateSecret", secret_id, e))?;

        debug!(
            secret_id = %secret_id,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Secret value updated"
        );
        Ok(())
    }

    async fn update_secret_description(&self, secret_id: &str, description: &str) -> Result<()> {
        validate_secret_id(secret_id)?;

        let started = Instant::now();
        let request = UpdateSecretRequest {
            secret_id: secret_id.to_string(),
            secret_string: None,
            description: Some(description.to_string()),
        };
        self.client
            .update_secret(request)
            .await
            .map_err(|e| call_failed("UpdateSecret", secret_id, e))?;

        debug!(
            secret_id = %secret_id,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Secret description updated"
        );
        Ok(())
    }

    async fn get_secret(&self, secret_id: &str) -> Result<Secret<String>> {
        validate_secret_id(secret_id)?;

        let request = GetSecretValueRequest {
            secret_id: secret_id.to_string(),
            ..Default::default()
        };
        let response = self
            .client
            .get_secret_value(request)
            .await
            .map_err(|e| call_failed("GetSecretValue", secret_id, e))?;

        match response.secret_string {
            Some(value) if !is_blank(&value) => Ok(Secret::new(value)),
            _ => {
                error!(secret_id = %secret_id, "Secrets Manager returned a blank value");
                Err(SecretsError::upstream(format!(
                    "Value came back blank for secret named: {secret_id}"
                )))
            }
        }
    }

    async fn delete_secret(&self, secret_id: &str) -> Result<()> {
        validate_secret_id(secret_id)?;

        match self.client.delete_secret(self.delete_request(secret_id)).await {
            Ok(_) => {
                debug!(secret_id = %secret_id, "Secret deleted");
                Ok(())
            }
            Err(e) if e.is_resource_not_found() => {
                debug!(
                    secret_id = %secret_id,
                    "Secret not found, nothing to delete so quietly ignoring"
                );
                Ok(())
            }
            Err(e) => Err(call_failed("DeleteSecret", secret_id, e)),
        }
    }

    fn name(&self) -> &'static str {
        "aws"
    }

    async fn health_check(&self) -> Result<()> {
        let request = ListSecretsRequest {
            max_results: Some(1),
            next_token: None,
        };
        self.client.list_secrets(request).await.map_err(|e| {
            let message = format!("Secrets Manager is not reachable: {e}");
            SecretsError::upstream_with_source(message, e)
        })?;
        Ok(())
    }
}
