//! Secret backend implementations

pub mod aws;
mod file;

pub use aws::AwsSecretManagerService;
pub use file::{FileSecretService, SecretFile};
