//! AWS backend tests against a mock Secrets Manager endpoint

use secrecy::{ExposeSecret, Secret};
use serde_json::json;
use wiremock::matchers::{body_json, header, header_exists, method, path};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

use secret_manager::providers::aws::api::{GetSecretValueRequest, SecretsManagerApi};
use secret_manager::providers::aws::{AwsSecretManagerService, SecretsManagerHttpClient};
use secret_manager::{
    AwsConfig, BackendKind, SecretManagerService, SecretsClient, SecretsConfig, SecretsError,
};

const AMZ_JSON: &str = "application/x-amz-json-1.1";

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new("debug"))
        .with_test_writer()
        .try_init();
}

fn aws_config(server: &MockServer) -> AwsConfig {
    AwsConfig {
        access_key: Some("AKIDEXAMPLE".to_string()),
        secret_key: Some(Secret::new("wJalrXUtnFEMI/K7MDENG+bPxRfiCYEXAMPLEKEY".to_string())),
        region: Some("eu-west-1".to_string()),
        endpoint: Some(server.uri()),
        ..Default::default()
    }
}

/// Matches requests whose Authorization header is a SigV4 signature by `access_key`
fn signed_by(access_key: &'static str) -> impl Fn(&Request) -> bool + Send + Sync {
    move |request: &Request| {
        let Some(authorization) = request
            .headers
            .get("authorization")
            .and_then(|value| value.to_str().ok())
        else {
            return false;
        };
        let signature = authorization.rsplit("Signature=").next().unwrap_or_default();

        authorization.starts_with(&format!("AWS4-HMAC-SHA256 Credential={access_key}/"))
            && authorization.contains("/eu-west-1/secretsmanager/aws4_request, ")
            && authorization.contains("SignedHeaders=content-type;host;x-amz-date;x-amz-target, ")
            && signature.len() == 64
            && signature.chars().all(|c| c.is_ascii_hexdigit())
    }
}

fn target(operation: &str) -> String {
    format!("secretsmanager.{operation}")
}

fn service_error(code: &str, message: &str) -> ResponseTemplate {
    ResponseTemplate::new(400).set_body_json(json!({
        "__type": code,
        "message": message,
    }))
}

#[tokio::test]
async fn test_requests_are_signed() {
    init_tracing();
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/"))
        .and(header("content-type", AMZ_JSON))
        .and(header("x-amz-target", target("GetSecretValue").as_str()))
        .and(header_exists("x-amz-date"))
        .and(signed_by("AKIDEXAMPLE"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "Name": "db-pass",
            "SecretString": "s3cr3t"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = SecretsManagerHttpClient::new(&aws_config(&server)).unwrap();
    let response = client
        .get_secret_value(GetSecretValueRequest {
            secret_id: "db-pass".to_string(),
            ..Default::default()
        })
        .await
        .unwrap();

    assert_eq!(response.secret_string.as_deref(), Some("s3cr3t"));
}

#[tokio::test]
async fn test_create_secret_body() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(header("x-amz-target", target("CreateSecret").as_str()))
        .and(body_json(json!({"Name": "db-pass", "SecretString": "s3cr3t"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ARN": "arn:aws:secretsmanager:eu-west-1:123456789012:secret:db-pass-a1b2c3",
            "Name": "db-pass",
            "VersionId": "v1"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let service = AwsSecretManagerService::new(&aws_config(&server)).unwrap();
    service.create_secret("db-pass", "s3cr3t").await.unwrap();
}

#[tokio::test]
async fn test_create_existing_secret() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(header("x-amz-target", target("CreateSecret").as_str()))
        .respond_with(service_error(
            "ResourceExistsException",
            "The operation failed because the secret db-pass already exists.",
        ))
        .mount(&server)
        .await;

    let service = AwsSecretManagerService::new(&aws_config(&server)).unwrap();
    let err = service.create_secret("db-pass", "s3cr3t").await.unwrap_err();

    assert!(err.is_already_exists());
}

#[tokio::test]
async fn test_update_secret_bodies() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(header("x-amz-target", target("UpdateSecret").as_str()))
        .and(body_json(json!({"SecretId": "db-pass", "SecretString": "n3wp4ss"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"Name": "db-pass"})))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(header("x-amz-target", target("UpdateSecret").as_str()))
        .and(body_json(json!({"SecretId": "db-pass", "Description": "primary database"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"Name": "db-pass"})))
        .expect(1)
        .mount(&server)
        .await;

    let service = AwsSecretManagerService::new(&aws_config(&server)).unwrap();
    service.update_secret_value("db-pass", "n3wp4ss").await.unwrap();
    service
        .update_secret_description("db-pass", "primary database")
        .await
        .unwrap();
}

#[tokio::test]
async fn test_get_missing_secret() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(header("x-amz-target", target("GetSecretValue").as_str()))
        .respond_with(service_error(
            "com.amazonaws.secretsmanager#ResourceNotFoundException",
            "Secrets Manager can't find the specified secret.",
        ))
        .mount(&server)
        .await;

    let service = AwsSecretManagerService::new(&aws_config(&server)).unwrap();
    let err = service.get_secret("db-pass").await.unwrap_err();

    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_delete_secret_options_and_missing_secret() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(header("x-amz-target", target("DeleteSecret").as_str()))
        .and(body_json(json!({"SecretId": "db-pass", "ForceDeleteWithoutRecovery": true})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "Name": "db-pass",
            "DeletionDate": 1.7e9
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(header("x-amz-target", target("DeleteSecret").as_str()))
        .and(body_json(json!({"SecretId": "never-created", "ForceDeleteWithoutRecovery": true})))
        .respond_with(service_error(
            "ResourceNotFoundException",
            "Secrets Manager can't find the specified secret.",
        ))
        .expect(1)
        .mount(&server)
        .await;

    let mut config = aws_config(&server);
    config.force_delete_without_recovery = true;
    let service = AwsSecretManagerService::new(&config).unwrap();

    service.delete_secret("db-pass").await.unwrap();
    service.delete_secret("never-created").await.unwrap();
}

#[tokio::test]
async fn test_server_error_is_upstream() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503).set_body_string("Service Unavailable"))
        .mount(&server)
        .await;

    let service = AwsSecretManagerService::new(&aws_config(&server)).unwrap();
    let err = service.get_secret("db-pass").await.unwrap_err();

    match err {
        SecretsError::Upstream { message, .. } => assert!(message.contains("HTTP 503")),
        other => panic!("expected upstream error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_client_round_trip_through_config() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(header("x-amz-target", target("ListSecrets").as_str()))
        .and(body_json(json!({"MaxResults": 1})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"SecretList": []})))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(header("x-amz-target", target("GetSecretValue").as_str()))
        .and(body_json(json!({"SecretId": "db-pass"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "Name": "db-pass",
            "SecretString": "s3cr3t"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let config = SecretsConfig {
        backend: BackendKind::Aws,
        aws: aws_config(&server),
        ..Default::default()
    };
    let client = SecretsClient::new(config).unwrap();

    client.health_check().await.unwrap();
    let secret = client.get_secret("db-pass").await.unwrap();
    assert_eq!(secret.expose_secret(), "s3cr3t");
}
