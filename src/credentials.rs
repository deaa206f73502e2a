//! Durable credential storage
//!
//! The host keeps exactly one record: the phone number used to log in and
//! the current refresh token. Access tokens never reach this layer.

use crate::error::{ElectroCarsError, Result};
use crate::logging::get_logger;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// What the host persists between restarts
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredCredential {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
}

impl StoredCredential {
    pub fn new(phone: Option<String>, refresh_token: Option<String>) -> Self {
        Self {
            phone,
            refresh_token,
        }
    }

    pub fn has_refresh_token(&self) -> bool {
        self.refresh_token
            .as_deref()
            .is_some_and(|t| !t.trim().is_empty())
    }
}

/// Receives the credential whenever the refresh token changes.
///
/// Called from a blocking worker thread, never from the task that is
/// waiting for the new access token.
pub trait CredentialSink: Send + Sync {
    fn store(&self, credential: &StoredCredential) -> Result<()>;
}

/// JSON file backed credential store
pub struct FileCredentialStore {
    file_path: PathBuf,
    /// Writers share one temporary file
    write_lock: Mutex<()>,
    logger: crate::logging::StructuredLogger,
}

impl FileCredentialStore {
    pub fn new<P: AsRef<Path>>(file_path: P) -> Self {
        Self {
            file_path: file_path.as_ref().to_path_buf(),
            write_lock: Mutex::new(()),
            logger: get_logger("credentials"),
        }
    }

    pub fn path(&self) -> &Path {
        &self.file_path
    }

    /// Load the stored credential; a missing file yields an empty one
    pub fn load(&self) -> Result<StoredCredential> {
        if !self.file_path.exists() {
            self.logger
                .info("No credential file found, starting unauthenticated");
            return Ok(StoredCredential::default());
        }

        let contents = std::fs::read_to_string(&self.file_path)?;
        let credential: StoredCredential = serde_json::from_str(&contents)?;
        self.logger.info(&format!(
            "Loaded credentials (phone: {}, refresh token: {})",
            credential.phone.as_deref().unwrap_or("-"),
            if credential.has_refresh_token() {
                "present"
            } else {
                "absent"
            }
        ));
        Ok(credential)
    }

    /// Write via a temporary file so a crash never leaves a truncated record
    pub fn save(&self, credential: &StoredCredential) -> Result<()> {
        if let Some(parent) = self.file_path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(credential)?;
        let _guard = self
            .write_lock
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let tmp = self.file_path.with_extension("json.tmp");
        std::fs::write(&tmp, contents)?;
        std::fs::rename(&tmp, &self.file_path)?;
        self.logger.debug("Saved credentials to disk");
        Ok(())
    }
}

impl CredentialSink for FileCredentialStore {
    fn store(&self, credential: &StoredCredential) -> Result<()> {
        if !credential.has_refresh_token() {
            return Err(ElectroCarsError::credential_incomplete(
                "refusing to overwrite stored credentials without a refresh token",
            ));
        }
        self.save(credential)
    }
}
