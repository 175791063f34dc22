use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::ebay::auth::TokenRecord;
use crate::ebay::env::EbayEnv;

/// File-based persistence for the user token, one file per environment so a
/// sandbox run never clobbers production credentials.
#[derive(Debug, Clone)]
pub struct TokenStore {
    path: PathBuf,
}

#[derive(Debug, Error)]
pub enum TokenStoreError {
    #[error("token file write failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("token serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl TokenStore {
    pub fn for_env(env: EbayEnv) -> Self {
        Self {
            path: PathBuf::from(format!("ebay_token.{}.json", env.name())),
        }
    }

    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// A missing or unreadable file is not an error at load time; the caller
    /// falls back to interactive authorization.
    pub fn load(&self) -> Option<TokenRecord> {
        let path = self.path.display().to_string();
        let data = match std::fs::read_to_string(&self.path) {
            Ok(data) => data,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                debug!(target = "lister.store", path = %path, "token file not found");
                return None;
            }
            Err(err) => {
                warn!(target = "lister.store", path = %path, error = %err, "token file read failed");
                return None;
            }
        };

        match serde_json::from_str(&data) {
            Ok(record) => {
                debug!(target = "lister.store", path = %path, "token record loaded");
                Some(record)
            }
            Err(err) => {
                warn!(target = "lister.store", path = %path, error = %err, "token file parse failed");
                None
            }
        }
    }

    pub fn save(&self, record: &TokenRecord) -> Result<(), TokenStoreError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_string_pretty(record)?;
        std::fs::write(&self.path, data)?;
        info!(target = "lister.store", path = %self.path.display(), "token record saved");
        Ok(())
    }
}
