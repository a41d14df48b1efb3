use async_trait::async_trait;
use std::path::{Path, PathBuf};

use crate::errors::CoreError;

use super::document::{self, AlertDocument};
use super::traits::AlertStore;

/// Default file name for the alert document.
pub const DEFAULT_FILE_NAME: &str = "coinwatch-alerts.json";

/// Stores the alert document as a JSON file on disk (native only).
///
/// Writes go to a sibling temp file first and are then renamed over the
/// target, so a crash mid-write leaves the previous document intact.
#[derive(Debug, Clone)]
pub struct JsonFileAlertStore {
    path: PathBuf,
}

impl JsonFileAlertStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store `DEFAULT_FILE_NAME` inside `dir`.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self::new(dir.as_ref().join(DEFAULT_FILE_NAME))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_os_string();
        name.push(".tmp");
        PathBuf::from(name)
    }
}

#[async_trait]
impl AlertStore for JsonFileAlertStore {
    fn name(&self) -> &str {
        "file"
    }

    async fn load(&self) -> Result<AlertDocument, CoreError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(json) => document::parse_document(&json),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(AlertDocument::empty()),
            Err(e) => Err(e.into()),
        }
    }

    async fn save(&self, document: &AlertDocument) -> Result<(), CoreError> {
        let json = document::to_json(document)?;
        let tmp = self.temp_path();
        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        tracing::debug!("Saved {} alerts to {}", document.alerts.len(), self.path.display());
        Ok(())
    }
}
