use async_trait::async_trait;
use std::sync::Mutex;

use crate::errors::CoreError;

use super::document::{self, AlertDocument};
use super::traits::AlertStore;

/// Keeps the alert document as a JSON string in memory, the way a browser
/// keeps it in local storage. Useful for tests and single-session use.
#[derive(Debug, Default)]
pub struct MemoryAlertStore {
    blob: Mutex<Option<String>>,
}

impl MemoryAlertStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing JSON blob (e.g., a legacy document).
    pub fn with_json(json: impl Into<String>) -> Self {
        Self {
            blob: Mutex::new(Some(json.into())),
        }
    }

    /// The raw stored JSON, if anything has been saved.
    pub fn raw(&self) -> Option<String> {
        self.blob.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
impl AlertStore for MemoryAlertStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn load(&self) -> Result<AlertDocument, CoreError> {
        match self.raw() {
            Some(json) => document::parse_document(&json),
            None => Ok(AlertDocument::empty()),
        }
    }

    async fn save(&self, document: &AlertDocument) -> Result<(), CoreError> {
        let json = document::to_json(document)?;
        *self.blob.lock().unwrap_or_else(|e| e.into_inner()) = Some(json);
        Ok(())
    }
}
