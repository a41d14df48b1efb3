use async_trait::async_trait;

use crate::errors::CoreError;

use super::document::AlertDocument;

/// Where the alert set lives between sessions.
///
/// The engine never knows which backend is active; it is handed one
/// implementation and only ever calls `load` and `save`.
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
pub trait AlertStore: Send + Sync {
    /// Human-readable name of this backend (for logs).
    fn name(&self) -> &str;

    /// Read the stored alert set. A store with nothing saved yet returns
    /// an empty document.
    async fn load(&self) -> Result<AlertDocument, CoreError>;

    /// Replace the stored alert set.
    async fn save(&self, document: &AlertDocument) -> Result<(), CoreError>;
}
