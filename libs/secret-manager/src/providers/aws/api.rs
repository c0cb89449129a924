//! Secrets Manager API surface used by the AWS backend
//!
//! Request and response shapes follow the Secrets Manager JSON protocol
//! (PascalCase member names). Only the members this crate uses are modeled;
//! unknown response members are ignored.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Error code returned when the target secret does not exist
pub const RESOURCE_NOT_FOUND: &str = "ResourceNotFoundException";

/// Error code returned when creating a secret whose name is taken
pub const RESOURCE_EXISTS: &str = "ResourceExistsException";

/// Errors returned by a [`SecretsManagerApi`] implementation
#[derive(Error, Debug)]
pub enum AwsApiError {
    /// The service rejected the request
    #[error("{code}: {message}")]
    Service {
        code: String,
        message: String,
        status: u16,
    },

    /// The request never got a response
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Request or response body could not be (de)serialized
    #[error("Failed to parse response: {0}")]
    Parse(#[from] serde_json::Error),

    /// The request could not be signed
    #[error("Failed to sign request: {0}")]
    Signing(String),
}

impl AwsApiError {
    pub fn service(code: impl Into<String>, message: impl Into<String>, status: u16) -> Self {
        Self::Service {
            code: code.into(),
            message: message.into(),
            status,
        }
    }

    /// Service error code, if the service answered
    pub fn code(&self) -> Option<&str> {
        match self {
            Self::Service { code, .. } => Some(code),
            _ => None,
        }
    }

    pub fn is_resource_not_found(&self) -> bool {
        self.code() == Some(RESOURCE_NOT_FOUND)
    }

    pub fn is_resource_exists(&self) -> bool {
        self.code() == Some(RESOURCE_EXISTS)
    }
}

/// Remote calls made by [`AwsSecretManagerService`](super::AwsSecretManagerService)
///
/// Implemented over HTTP by [`SecretsManagerHttpClient`](super::SecretsManagerHttpClient);
/// tests substitute a mock.
#[async_trait]
pub trait SecretsManagerApi: Send + Sync {
    async fn create_secret(
        &self,
        request: CreateSecretRequest,
    ) -> Result<CreateSecretResponse, AwsApiError>;

    async fn update_secret(
        &self,
        request: UpdateSecretRequest,
    ) -> Result<UpdateSecretResponse, AwsApiError>;

    async fn get_secret_value(
        &self,
        request: GetSecretValueRequest,
    ) -> Result<GetSecretValueResponse, AwsApiError>;

    async fn delete_secret(
        &self,
        request: DeleteSecretRequest,
    ) -> Result<DeleteSecretResponse, AwsApiError>;

    async fn list_secrets(
        &self,
        request: ListSecretsRequest,
    ) -> Result<ListSecretsResponse, AwsApiError>;
}

// Requests

#[derive(Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CreateSecretRequest {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secret_string: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl fmt::Debug for CreateSecretRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CreateSecretRequest")
            .field("name", &self.name)
            .field("secret_string", &redacted(&self.secret_string))
            .field("description", &self.description)
            .finish()
    }
}

/// Updates the value, the description, or both. Members left `None` keep
/// their stored value.
#[derive(Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct UpdateSecretRequest {
    pub secret_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secret_string: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl fmt::Debug for UpdateSecretRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UpdateSecretRequest")
            .field("secret_id", &self.secret_id)
            .field("secret_string", &redacted(&self.secret_string))
            .field("description", &self.description)
            .finish()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct GetSecretValueRequest {
    pub secret_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version_stage: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct DeleteSecretRequest {
    pub secret_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub force_delete_without_recovery: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recovery_window_in_days: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ListSecretsRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_results: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_token: Option<String>,
}

// Responses

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CreateSecretResponse {
    #[serde(rename = "ARN")]
    pub arn: Option<String>,
    pub name: Option<String>,
    pub version_id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct UpdateSecretResponse {
    #[serde(rename = "ARN")]
    pub arn: Option<String>,
    pub name: Option<String>,
    pub version_id: Option<String>,
}

#[derive(Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct GetSecretValueResponse {
    #[serde(rename = "ARN")]
    pub arn: Option<String>,
    pub name: Option<String>,
    pub version_id: Option<String>,
    pub secret_string: Option<String>,
    /// Seconds since the epoch
    pub created_date: Option<f64>,
}

impl fmt::Debug for GetSecretValueResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GetSecretValueResponse")
            .field("arn", &self.arn)
            .field("name", &self.name)
            .field("version_id", &self.version_id)
            .field("secret_string", &redacted(&self.secret_string))
            .field("created_date", &self.created_date)
            .finish()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DeleteSecretResponse {
    #[serde(rename = "ARN")]
    pub arn: Option<String>,
    pub name: Option<String>,
    /// Seconds since the epoch
    pub deletion_date: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ListSecretsResponse {
    #[serde(default)]
    pub secret_list: Vec<SecretListEntry>,
    pub next_token: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SecretListEntry {
    #[serde(rename = "ARN")]
    pub arn: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
}

fn redacted(value: &Option<String>) -> Option<&'static str> {
    value.as_ref().map(|_| "[REDACTED]")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_member_names() {
        let request = UpdateSecretRequest {
            secret_id: "db-pass".to_string(),
            description: Some("database".to_string()),
            ..Default::default()
        };
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({"SecretId": "db-pass", "Description": "database"})
        );

        let request = DeleteSecretRequest {
            secret_id: "db-pass".to_string(),
            force_delete_without_recovery: Some(true),
            recovery_window_in_days: None,
        };
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({"SecretId": "db-pass", "ForceDeleteWithoutRecovery": true})
        );
    }

    #[test]
    fn test_get_secret_value_response() {
        let response: GetSecretValueResponse = serde_json::from_value(json!({
            "ARN": "arn:aws:secretsmanager:us-east-1:123456789012:secret:db-pass-a1b2c3",
            "Name": "db-pass",
            "VersionId": "v1",
            "SecretString": "s3cr3t",
            "VersionStages": ["AWSCURRENT"],
            "CreatedDate": 1.523477145713E9
        }))
        .unwrap();

        assert_eq!(response.name.as_deref(), Some("db-pass"));
        assert_eq!(response.secret_string.as_deref(), Some("s3cr3t"));
        assert!(response.arn.unwrap().ends_with("db-pass-a1b2c3"));
    }

    #[test]
    fn test_debug_redacts_secret_string() {
        let request = CreateSecretRequest {
            name: "db-pass".to_string(),
            secret_string: Some("s3cr3t".to_string()),
            description: None,
        };
        let debug = format!("{request:?}");
        assert!(debug.contains("db-pass"));
        assert!(!debug.contains("s3cr3t"));
    }

    #[test]
    fn test_error_codes() {
        let err = AwsApiError::service(RESOURCE_NOT_FOUND, "Secrets Manager can't find it", 400);
        assert!(err.is_resource_not_found());
        assert!(!err.is_resource_exists());
        assert_eq!(
            err.to_string(),
            "ResourceNotFoundException: Secrets Manager can't find it"
        );
        assert_eq!(AwsApiError::Signing("bad key".to_string()).code(), None);
    }
}
