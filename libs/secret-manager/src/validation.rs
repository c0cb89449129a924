//! Argument checks shared by every backend. They run before any I/O.

use crate::{Result, SecretsError};

/// A value is blank when it is empty or whitespace only
pub fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

pub fn validate_secret_id(secret_id: &str) -> Result<()> {
    if is_blank(secret_id) {
        return Err(SecretsError::invalid_argument("Secret id cannot be blank"));
    }
    Ok(())
}

pub fn validate_content(content: &str) -> Result<()> {
    if is_blank(content) {
        return Err(SecretsError::invalid_argument("Secret value cannot be blank"));
    }
    Ok(())
}
