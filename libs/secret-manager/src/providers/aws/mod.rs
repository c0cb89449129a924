//! AWS Secrets Manager backend

pub mod api;
mod client;
mod service;
pub mod sigv4;

pub use api::{AwsApiError, SecretsManagerApi};
pub use client::SecretsManagerHttpClient;
pub use service::{AwsSecretManagerService, DeleteOptions};
