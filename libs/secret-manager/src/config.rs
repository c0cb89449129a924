//! Configuration for secret backends

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use secrecy::Secret;
use serde::{Deserialize, Serialize};

use crate::SecretsError;

/// Default root directory of the file backend
pub const DEFAULT_FILE_ROOT: &str = "./target/";

const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Which backend a [`SecretsClient`](crate::SecretsClient) is built with
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    /// AWS Secrets Manager (or a compatible endpoint such as LocalStack)
    Aws,
    /// One JSON file per secret under a local directory
    #[default]
    File,
}

impl BackendKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Aws => "aws",
            Self::File => "file",
        }
    }
}

impl FromStr for BackendKind {
    type Err = SecretsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "aws" => Ok(Self::Aws),
            "file" | "mock" => Ok(Self::File),
            other => Err(SecretsError::invalid_config(format!(
                "Unknown secrets backend '{other}', expected 'aws' or 'file'"
            ))),
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Configuration for the secrets client
#[derive(Debug, Clone, Default)]
pub struct SecretsConfig {
    /// Selected backend
    pub backend: BackendKind,
    /// AWS Secrets Manager configuration
    pub aws: AwsConfig,
    /// File backend configuration
    pub file: FileConfig,
}

impl SecretsConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, SecretsError> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Load configuration through a variable lookup function
    pub fn from_vars<F>(lookup: F) -> Result<Self, SecretsError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let backend = match lookup("SECRETS_BACKEND") {
            Some(value) => value.parse()?,
            None => BackendKind::default(),
        };

        Ok(Self {
            backend,
            aws: AwsConfig::from_vars(&lookup)?,
            file: FileConfig::from_vars(&lookup),
        })
    }

    /// Config for the file backend rooted at `root_dir`
    pub fn file(root_dir: impl Into<String>) -> Self {
        Self {
            backend: BackendKind::File,
            aws: AwsConfig::default(),
            file: FileConfig {
                root_dir: Some(root_dir.into()),
            },
        }
    }
}

/// Configuration for the AWS Secrets Manager backend
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AwsConfig {
    /// Access key id
    pub access_key: Option<String>,
    /// Secret access key
    pub secret_key: Option<Secret<String>>,
    /// Region (e.g., us-east-1)
    pub region: Option<String>,
    /// Service endpoint, defaults to the regional AWS endpoint
    pub endpoint: Option<String>,
    /// Delete secrets immediately instead of scheduling deletion
    #[serde(default)]
    pub force_delete_without_recovery: bool,
    /// Recovery window for scheduled deletion (7-30 days)
    pub recovery_window_in_days: Option<i64>,
    /// HTTP request timeout in seconds
    pub timeout_secs: Option<u64>,
}

impl AwsConfig {
    /// Load AWS configuration from environment variables
    pub fn from_env() -> Result<Self, SecretsError> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    fn from_vars<F>(lookup: F) -> Result<Self, SecretsError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let first = |keys: &[&str]| keys.iter().find_map(|&key| lookup(key));

        let recovery_window_in_days = lookup("AWS_SM_RECOVERY_WINDOW_DAYS")
            .map(|v| {
                v.trim().parse::<i64>().map_err(|_| {
                    SecretsError::invalid_config(format!(
                        "AWS_SM_RECOVERY_WINDOW_DAYS must be a number of days, got '{v}'"
                    ))
                })
            })
            .transpose()?;

        let timeout_secs = lookup("AWS_SM_TIMEOUT_SECS")
            .map(|v| {
                v.trim().parse::<u64>().map_err(|_| {
                    SecretsError::invalid_config(format!(
                        "AWS_SM_TIMEOUT_SECS must be a number of seconds, got '{v}'"
                    ))
                })
            })
            .transpose()?;

        Ok(Self {
            access_key: first(&["AWS_SM_ACCESS_KEY", "AWS_ACCESS_KEY_ID"]),
            secret_key: first(&["AWS_SM_SECRET_KEY", "AWS_SECRET_ACCESS_KEY"]).map(Secret::new),
            region: first(&["AWS_SM_REGION", "AWS_REGION"]),
            endpoint: lookup("AWS_SM_ENDPOINT"),
            force_delete_without_recovery: lookup("AWS_SM_FORCE_DELETE")
                .map(|v| v.to_lowercase() == "true")
                .unwrap_or(false),
            recovery_window_in_days,
            timeout_secs,
        })
    }

    /// Check if credentials and region are present
    pub fn is_configured(&self) -> bool {
        self.access_key.is_some() && self.secret_key.is_some() && self.region.is_some()
    }

    /// Get the endpoint, defaulting to the regional AWS endpoint
    pub fn endpoint_url(&self) -> Option<String> {
        self.endpoint.clone().or_else(|| {
            self.region
                .as_ref()
                .map(|region| format!("https://secretsmanager.{region}.amazonaws.com"))
        })
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS))
    }
}

/// Configuration for the file backend
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FileConfig {
    /// Directory holding one `<secret id>.json` file per secret
    pub root_dir: Option<String>,
}

impl FileConfig {
    fn from_vars<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            root_dir: lookup("SECRETS_FILE_ROOT"),
        }
    }

    /// Get the root directory, defaulting to `./target/`
    pub fn root(&self) -> String {
        self.root_dir
            .clone()
            .unwrap_or_else(|| DEFAULT_FILE_ROOT.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use std::collections::HashMap;

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_to_file_backend() {
        let config = SecretsConfig::from_vars(vars(&[])).unwrap();

        assert_eq!(config.backend, BackendKind::File);
        assert_eq!(config.file.root(), DEFAULT_FILE_ROOT);
        assert!(!config.aws.is_configured());
        assert_eq!(config.aws.timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_aws_from_vars() {
        let config = SecretsConfig::from_vars(vars(&[
            ("SECRETS_BACKEND", "aws"),
            ("AWS_SM_ACCESS_KEY", "AKIDEXAMPLE"),
            ("AWS_SM_SECRET_KEY", "wJalrXUtnFEMI"),
            ("AWS_SM_REGION", "eu-west-1"),
            ("AWS_SM_ENDPOINT", "http://localhost:4566"),
            ("AWS_SM_FORCE_DELETE", "TRUE"),
            ("AWS_SM_RECOVERY_WINDOW_DAYS", "7"),
        ]))
        .unwrap();

        assert_eq!(config.backend, BackendKind::Aws);
        assert!(config.aws.is_configured());
        assert_eq!(config.aws.access_key.as_deref(), Some("AKIDEXAMPLE"));
        assert_eq!(
            config.aws.secret_key.as_ref().unwrap().expose_secret(),
            "wJalrXUtnFEMI"
        );
        assert_eq!(
            config.aws.endpoint_url().as_deref(),
            Some("http://localhost:4566")
        );
        assert!(config.aws.force_delete_without_recovery);
        assert_eq!(config.aws.recovery_window_in_days, Some(7));
    }

    #[test]
    fn test_aws_standard_variable_fallback() {
        let config = AwsConfig::from_vars(vars(&[
            ("AWS_ACCESS_KEY_ID", "AKID"),
            ("AWS_SECRET_ACCESS_KEY", "secret"),
            ("AWS_REGION", "us-east-1"),
        ]))
        .unwrap();

        assert!(config.is_configured());
        assert_eq!(
            config.endpoint_url().as_deref(),
            Some("https://secretsmanager.us-east-1.amazonaws.com")
        );
    }

    #[test]
    fn test_invalid_numbers_are_config_errors() {
        let err = AwsConfig::from_vars(vars(&[("AWS_SM_TIMEOUT_SECS", "soon")])).unwrap_err();
        assert!(matches!(err, SecretsError::InvalidConfig(_)));

        let err =
            AwsConfig::from_vars(vars(&[("AWS_SM_RECOVERY_WINDOW_DAYS", "a week")])).unwrap_err();
        assert!(matches!(err, SecretsError::InvalidConfig(_)));
    }

    #[test]
    fn test_backend_kind_parsing() {
        assert_eq!("AWS".parse::<BackendKind>().unwrap(), BackendKind::Aws);
        assert_eq!("mock".parse::<BackendKind>().unwrap(), BackendKind::File);
        assert!("vault".parse::<BackendKind>().is_err());
        assert_eq!(BackendKind::Aws.to_string(), "aws");
    }

    #[test]
    fn test_file_config_helper() {
        let config = SecretsConfig::file("/tmp/secrets");
        assert_eq!(config.backend, BackendKind::File);
        assert_eq!(config.file.root(), "/tmp/secrets");
    }
}
