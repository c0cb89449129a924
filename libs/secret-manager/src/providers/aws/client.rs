//! HTTP client for the Secrets Manager JSON protocol
//!
//! Every call is a signed `POST /` with the operation named in the
//! `X-Amz-Target` header. Works against AWS or any compatible endpoint
//! (e.g. LocalStack) set through the endpoint configuration.

use async_trait::async_trait;
use reqwest::{Client, Url};
use secrecy::{ExposeSecret, Secret};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::SystemTime;
use tracing::debug;

use super::api::{
    AwsApiError, CreateSecretRequest, CreateSecretResponse, DeleteSecretRequest,
    DeleteSecretResponse, GetSecretValueRequest, GetSecretValueResponse, ListSecretsRequest,
    ListSecretsResponse, SecretsManagerApi, UpdateSecretRequest, UpdateSecretResponse,
};
use super::sigv4::{RequestSigner, SigningRequest};
use crate::{AwsConfig, SecretsError};

const SERVICE_NAME: &str = "secretsmanager";
const TARGET_PREFIX: &str = "secretsmanager";
const CONTENT_TYPE: &str = "application/x-amz-json-1.1";

/// Error body returned by the JSON protocol
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(rename = "__type")]
    error_type: Option<String>,
    #[serde(alias = "Message")]
    message: Option<String>,
}

/// Secrets Manager client holding one reusable HTTP connection pool
pub struct SecretsManagerHttpClient {
    http: Client,
    endpoint: Url,
    signer: RequestSigner,
}

impl SecretsManagerHttpClient {
    /// Build a client from the AWS configuration
    ///
    /// Fails if the access key, secret key or region is missing, or if the
    /// endpoint is not a valid URL.
    pub fn new(config: &AwsConfig) -> Result<Self, SecretsError> {
        let access_key = config
            .access_key
            .clone()
            .ok_or_else(|| SecretsError::invalid_config("Missing AWS access key"))?;
        let secret_key = config
            .secret_key
            .as_ref()
            .map(|key| Secret::new(key.expose_secret().clone()))
            .ok_or_else(|| SecretsError::invalid_config("Missing AWS secret key"))?;
        let region = config
            .region
            .clone()
            .ok_or_else(|| SecretsError::invalid_config("Missing AWS region"))?;
        let endpoint = config
            .endpoint_url()
            .ok_or_else(|| SecretsError::invalid_config("Missing AWS endpoint"))?;

        let endpoint = Url::parse(&endpoint).map_err(|e| {
            SecretsError::invalid_config(format!("Invalid endpoint '{endpoint}': {e}"))
        })?;
        if endpoint.host_str().is_none() {
            return Err(SecretsError::invalid_config(format!(
                "Endpoint '{endpoint}' has no host"
            )));
        }

        let http = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| SecretsError::upstream_with_source("Failed to build HTTP client", e))?;

        Ok(Self {
            http,
            endpoint,
            signer: RequestSigner::new(access_key, secret_key, region, SERVICE_NAME),
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    pub fn region(&self) -> &str {
        self.signer.region()
    }

    /// Send one signed operation and decode its response
    async fn call<Req, Resp>(&self, operation: &str, request: &Req) -> Result<Resp, AwsApiError>
    where
        Req: Serialize + Sync,
        Resp: DeserializeOwned,
    {
        let body = serde_json::to_vec(request)?;
        let target = format!("{TARGET_PREFIX}.{operation}");

        let signed = self.signer.sign(
            &SigningRequest {
                method: "POST",
                url: self.endpoint.as_str(),
                headers: &[("content-type", CONTENT_TYPE), ("x-amz-target", target.as_str())],
                payload: &body,
            },
            SystemTime::now(),
        )?;

        debug!(operation = %operation, endpoint = %self.endpoint, "Calling Secrets Manager");

        let response = self
            .http
            .post(self.endpoint.clone())
            .header(reqwest::header::CONTENT_TYPE, CONTENT_TYPE)
            .header("X-Amz-Target", &target)
            .header("X-Amz-Date", &signed.amz_date)
            .header(reqwest::header::AUTHORIZATION, &signed.authorization)
            .body(body)
            .send()
            .await?;

        let status = response.status();
        let bytes = response.bytes().await?;

        if status.is_success() {
            if bytes.is_empty() {
                return Ok(serde_json::from_slice(b"{}")?);
            }
            return Ok(serde_json::from_slice(&bytes)?);
        }

        Err(parse_error(status.as_u16(), &bytes))
    }
}

/// Decode a JSON protocol error body
///
/// `__type` may carry a namespace (`com.amazonaws.secretsmanager#Code`) or a
/// trailing `:` suffix; both are stripped.
fn parse_error(status: u16, body: &[u8]) -> AwsApiError {
    let parsed: Option<ErrorBody> = serde_json::from_slice(body).ok();

    let code = parsed
        .as_ref()
        .and_then(|b| b.error_type.as_deref())
        .map(|t| {
            let t = t.rsplit('#').next().unwrap_or(t);
            t.split(':').next().unwrap_or(t).to_string()
        })
        .unwrap_or_else(|| format!("HTTP {status}"));

    let message = parsed
        .and_then(|b| b.message)
        .unwrap_or_else(|| String::from_utf8_lossy(body).into_owned());

    AwsApiError::service(code, message, status)
}

#[async_trait]
impl SecretsManagerApi for SecretsManagerHttpClient {
    async fn create_secret(
        &self,
        request: CreateSecretRequest,
    ) -> Result<CreateSecretResponse, AwsApiError> {
        self.call("CreateSecret", &request).await
    }

    async fn update_secret(
        &self,
        request: UpdateSecretRequest,
    ) -> Result<UpdateSecretResponse, AwsApiError> {
        self.call("UpdateSecret", &request).await
    }

    async fn get_secret_value(
        &self,
        request: GetSecretValueRequest,
    ) -> Result<GetSecretValueResponse, AwsApiError> {
        self.call("GetSecretValue", &request).await
    }

    async fn delete_secret(
        &self,
        request: DeleteSecretRequest,
    ) -> Result<DeleteSecretResponse, AwsApiError> {
        self.call("DeleteSecret", &request).await
    }

    async fn list_secrets(
        &self,
        request: ListSecretsRequest,
    ) -> Result<ListSecretsResponse, AwsApiError> {
        self.call("ListSecrets", &request).await
    }
}
