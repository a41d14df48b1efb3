use async_trait::async_trait;

use crate::errors::CoreError;
use crate::models::market::MarketSnapshot;

/// Source of market snapshots (prices, 24h change, 24h volume).
///
/// Each API integration implements this trait; the rest of the crate only
/// ever sees a [`MarketSnapshot`].
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
pub trait MarketDataProvider: Send + Sync {
    /// Human-readable name of this provider (for logs/errors).
    fn name(&self) -> &str;

    /// Fetch current market data for `symbols`, quoted in `currency`.
    ///
    /// Symbols the provider does not know are left out of the snapshot
    /// rather than failing the whole request.
    async fn fetch_snapshot(
        &self,
        symbols: &[String],
        currency: &str,
    ) -> Result<MarketSnapshot, CoreError>;
}
