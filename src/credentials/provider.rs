//! Key list providers

use std::path::PathBuf;
use tracing::debug;

use crate::{InsightsError, Result};

/// Source of the API key list. Called once, synchronously, when the pool is built.
pub trait KeyProvider: Send + Sync {
    fn fetch_keys(&self) -> Result<Vec<String>>;
}

/// Keys supplied directly, e.g. from the config file or environment.
#[derive(Debug, Clone, Default)]
pub struct StaticKeys(pub Vec<String>);

impl KeyProvider for StaticKeys {
    fn fetch_keys(&self) -> Result<Vec<String>> {
        Ok(self.0.clone())
    }
}

/// Keys read from a file holding either a JSON array of strings or one key per line.
#[derive(Debug, Clone)]
pub struct KeysFile {
    path: PathBuf,
}

impl KeysFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl KeyProvider for KeysFile {
    fn fetch_keys(&self) -> Result<Vec<String>> {
        debug!(path = %self.path.display(), "Reading key list");

        let content = std::fs::read_to_string(&self.path).map_err(|e| {
            InsightsError::Credentials(format!(
                "failed to read keys file {}: {}",
                self.path.display(),
                e
            ))
        })?;

        let trimmed = content.trim();
        if trimmed.starts_with('[') {
            return serde_json::from_str(trimmed).map_err(|e| {
                InsightsError::Credentials(format!(
                    "keys file {} is not a JSON list of strings: {}",
                    self.path.display(),
                    e
                ))
            });
        }

        Ok(trimmed
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .map(str::to_string)
            .collect())
    }
}
