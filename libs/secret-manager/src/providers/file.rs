//! Local file secrets backend
//!
//! Stores each secret as `<root>/<secret id>.json` holding
//! `{"secretContent": ..., "secretDescription": ...}`. The file existing is
//! the secret existing; there is no index. Every write goes to its own temp
//! file that is then moved into place, so a record on disk is always whole.
//! Concurrent updates of one id are not coordinated: the last rename wins.

use async_trait::async_trait;
use secrecy::Secret;
use serde::{Deserialize, Serialize};
use std::io::{self, ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tempfile::NamedTempFile;
use tokio::{fs, task};
use tracing::{debug, warn};

use crate::config::DEFAULT_FILE_ROOT;
use crate::validation::{is_blank, validate_content, validate_secret_id};
use crate::{Result, SecretManagerService, SecretsError};

const FILE_EXTENSION: &str = "json";

/// On-disk record of one secret
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecretFile {
    pub secret_content: Option<String>,
    pub secret_description: Option<String>,
}

/// Backend keeping one JSON file per secret under a root directory
#[derive(Debug, Clone)]
pub struct FileSecretService {
    root_dir: String,
}

impl FileSecretService {
    /// Create a backend rooted at `root_dir`. The directory is created on
    /// first write.
    pub fn new(root_dir: impl Into<String>) -> Result<Self> {
        let mut root_dir = root_dir.into();
        if is_blank(&root_dir) {
            return Err(SecretsError::invalid_argument(
                "Root directory cannot be blank",
            ));
        }
        if !root_dir.ends_with('/') {
            root_dir.push('/');
        }

        debug!(location = %root_dir, "File secrets backend initialized");
        Ok(Self { root_dir })
    }

    /// Root directory, always ending with `/`
    pub fn root_dir(&self) -> &str {
        &self.root_dir
    }

    /// Path of the file holding `secret_id`
    ///
    /// Ids may contain `/` to nest records in subdirectories, but no
    /// component may be empty, `.` or `..`, so records stay under the root.
    pub fn record_path(&self, secret_id: &str) -> Result<PathBuf> {
        validate_secret_id(secret_id)?;

        let escapes_root = secret_id.contains('\\')
            || secret_id
                .split('/')
                .any(|part| part.is_empty() || part == "." || part == "..");
        if escapes_root {
            return Err(SecretsError::invalid_argument(format!(
                "Secret id '{secret_id}' is not a valid file name"
            )));
        }

        Ok(Path::new(&self.root_dir).join(format!("{secret_id}.{FILE_EXTENSION}")))
    }

    async fn read_record(&self, secret_id: &str, path: &Path) -> Result<SecretFile> {
        match fs::read_to_string(path).await {
            Ok(contents) => Ok(serde_json::from_str(&contents)?),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(SecretsError::not_found(secret_id)),
            Err(e) => Err(e.into()),
        }
    }

    /// Write a record that must not exist yet
    async fn write_new_record(&self, secret_id: &str, path: &Path, record: &SecretFile) -> Result<()> {
        let contents = serde_json::to_vec(record)?;
        match publish(path.to_path_buf(), contents, Publish::NoClobber).await {
            Err(e) if e.kind() == ErrorKind::AlreadyExists => Err(SecretsError::already_exists(secret_id)),
            other => Ok(other?),
        }
    }

    /// Replace a record, whole or not at all
    async fn replace_record(&self, path: &Path, record: &SecretFile) -> Result<()> {
        let contents = serde_json::to_vec(record)?;
        Ok(publish(path.to_path_buf(), contents, Publish::Replace).await?)
    }

    /// Remove directories left empty by a delete, stopping at the root
    async fn prune_empty_dirs(&self, path: &Path) {
        let root = Path::new(&self.root_dir);
        let mut dir = path.parent();
        while let Some(current) = dir {
            if current == root || !current.starts_with(root) {
                break;
            }
            if fs::remove_dir(current).await.is_err() {
                break;
            }
            dir = current.parent();
        }
    }

    /// Read, modify and rewrite an existing record
    async fn update_record<F>(&self, secret_id: &str, apply: F) -> Result<()>
    where
        F: FnOnce(&mut SecretFile) + Send,
    {
        let started = Instant::now();
        let path = self.record_path(secret_id)?;

        if !fs::try_exists(&path).await? {
            return Err(SecretsError::not_found(secret_id));
        }

        let mut record = self.read_record(secret_id, &path).await?;
        apply(&mut record);
        self.replace_record(&path, &record).await?;

        debug!(
            secret_id = %secret_id,
            location = %self.root_dir,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Secret file updated"
        );
        Ok(())
    }
}

impl Default for FileSecretService {
    fn default() -> Self {
        Self {
            root_dir: DEFAULT_FILE_ROOT.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Publish {
    /// Fail with `AlreadyExists` if the record is present
    NoClobber,
    /// Atomically replace whatever is present
    Replace,
}

/// Write `contents` to a fresh temp file beside `path`, then move it into
/// place. The record at `path` is either untouched or complete; the temp
/// file is removed on every failure.
async fn publish(path: PathBuf, contents: Vec<u8>, mode: Publish) -> io::Result<()> {
    task::spawn_blocking(move || -> io::Result<()> {
        let parent = path
            .parent()
            .ok_or_else(|| io::Error::new(ErrorKind::InvalidInput, "record path has no parent"))?;
        std::fs::create_dir_all(parent)?;

        let mut temp = NamedTempFile::new_in(parent)?;
        temp.write_all(&contents)?;
        temp.as_file().sync_all()?;

        match mode {
            Publish::NoClobber => temp.persist_noclobber(&path).map_err(|e| e.error)?,
            Publish::Replace => temp.persist(&path).map_err(|e| e.error)?,
        };
        Ok(())
    })
    .await
    .map_err(io::Error::other)?
}

#[async_trait]
impl SecretManagerService for FileSecretService {
    async fn create_secret(&self, secret_id: &str, content: &str) -> Result<()> {
        validate_secret_id(secret_id)?;
        validate_content(content)?;

        let started = Instant::now();
        let path = self.record_path(secret_id)?;

        if fs::try_exists(&path).await? {
            return Err(SecretsError::already_exists(secret_id));
        }

        let record = SecretFile {
            secret_content: Some(content.to_string()),
            secret_description: None,
        };
        self.write_new_record(secret_id, &path, &record).await?;

        debug!(
            secret_id = %secret_id,
            location = %self.root_dir,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Secret file created"
        );
        Ok(())
    }

    async fn update_secret_value(&self, secret_id: &str, content: &str) -> Result<()> {
        validate_secret_id(secret_id)?;
        validate_content(content)?;

        let content = content.to_string();
        self.update_record(secret_id, move |record| {
            record.secret_content = Some(content);
        })
        .await
    }

    async fn update_secret_description(&self, secret_id: &str, description: &str) -> Result<()> {
        validate_secret_id(secret_id)?;

        let description = description.to_string();
        self.update_record(secret_id, move |record| {
            record.secret_description = Some(description);
        })
        .await
    }

    async fn get_secret(&self, secret_id: &str) -> Result<Secret<String>> {
        validate_secret_id(secret_id)?;

        let path = self.record_path(secret_id)?;
        let record = self.read_record(secret_id, &path).await?;

        match record.secret_content {
            Some(content) if !content.is_empty() => Ok(Secret::new(content)),
            _ => {
                warn!(secret_id = %secret_id, "Secret file has no content");
                Err(SecretsError::not_found(secret_id))
            }
        }
    }

    async fn delete_secret(&self, secret_id: &str) -> Result<()> {
        validate_secret_id(secret_id)?;

        let path = self.record_path(secret_id)?;
        match fs::remove_file(&path).await {
            Ok(()) => {
                self.prune_empty_dirs(&path).await;
                debug!(secret_id = %secret_id, location = %self.root_dir, "Secret file deleted");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(secret_id = %secret_id, "No secret file to delete, ignoring");
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    fn name(&self) -> &'static str {
        "file"
    }

    async fn health_check(&self) -> Result<()> {
        fs::create_dir_all(&self.root_dir).await?;
        let metadata = fs::metadata(&self.root_dir).await?;
        if !metadata.is_dir() {
            return Err(SecretsError::invalid_config(format!(
                "{} is not a directory",
                self.root_dir
            )));
        }
        Ok(())
    }
}
