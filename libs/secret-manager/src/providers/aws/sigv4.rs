//! AWS Signature Version 4 request signing, delegated to `aws-sigv4`

use std::time::SystemTime;

use aws_credential_types::Credentials;
use aws_sigv4::http_request::{sign, SignableBody, SignableRequest, SigningParams, SigningSettings};
use aws_sigv4::sign::v4;
use aws_smithy_runtime_api::client::identity::Identity;
use secrecy::{ExposeSecret, Secret};

use super::api::AwsApiError;

const CREDENTIALS_PROVIDER: &str = "secret-manager-static";

/// Request parts covered by the signature
#[derive(Debug, Clone)]
pub struct SigningRequest<'a> {
    pub method: &'a str,
    /// Full request URL; its host (and non-default port) is signed
    pub url: &'a str,
    /// Headers to sign besides `host` and `x-amz-date`
    pub headers: &'a [(&'a str, &'a str)],
    pub payload: &'a [u8],
}

/// Headers to attach to a signed request
#[derive(Debug, Clone)]
pub struct SignedHeaders {
    pub amz_date: String,
    pub authorization: String,
}

/// Signs requests for one service in one region with static credentials
pub struct RequestSigner {
    access_key: String,
    secret_key: Secret<String>,
    region: String,
    service: String,
}

impl std::fmt::Debug for RequestSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestSigner")
            .field("access_key", &self.access_key)
            .field("secret_key", &"[REDACTED]")
            .field("region", &self.region)
            .field("service", &self.service)
            .finish()
    }
}

impl RequestSigner {
    pub fn new(
        access_key: impl Into<String>,
        secret_key: Secret<String>,
        region: impl Into<String>,
        service: impl Into<String>,
    ) -> Self {
        Self {
            access_key: access_key.into(),
            secret_key,
            region: region.into(),
            service: service.into(),
        }
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    /// Sign `request` as of `now`
    pub fn sign(
        &self,
        request: &SigningRequest<'_>,
        now: SystemTime,
    ) -> Result<SignedHeaders, AwsApiError> {
        let identity: Identity = Credentials::new(
            self.access_key.clone(),
            self.secret_key.expose_secret().clone(),
            None,
            None,
            CREDENTIALS_PROVIDER,
        )
        .into();

        let params: SigningParams<'_> = v4::SigningParams::builder()
            .identity(&identity)
            .region(&self.region)
            .name(&self.service)
            .time(now)
            .settings(SigningSettings::default())
            .build()
            .map_err(signing_error)?
            .into();

        let signable = SignableRequest::new(
            request.method,
            request.url,
            request.headers.iter().copied(),
            SignableBody::Bytes(request.payload),
        )
        .map_err(signing_error)?;

        let (instructions, _signature) = sign(signable, &params)
            .map_err(signing_error)?
            .into_parts();

        let mut amz_date = None;
        let mut authorization = None;
        for (name, value) in instructions.headers() {
            if name.eq_ignore_ascii_case("x-amz-date") {
                amz_date = Some(value.to_string());
            } else if name.eq_ignore_ascii_case("authorization") {
                authorization = Some(value.to_string());
            }
        }

        Ok(SignedHeaders {
            amz_date: amz_date
                .ok_or_else(|| AwsApiError::Signing("no x-amz-date header produced".to_string()))?,
            authorization: authorization
                .ok_or_else(|| AwsApiError::Signing("no authorization header produced".to_string()))?,
        })
    }
}

fn signing_error(err: impl std::fmt::Display) -> AwsApiError {
    AwsApiError::Signing(err.to_string())
}
