use crate::errors::CoreError;
use crate::models::market::MarketSnapshot;
use crate::providers::coingecko::CoinGeckoProvider;
use crate::providers::traits::MarketDataProvider;

/// Fetches market snapshots from the registered providers.
///
/// Providers are tried in registration order; the first successful
/// snapshot is used. Each provider is asked once per call.
pub struct MarketService {
    providers: Vec<Box<dyn MarketDataProvider>>,
}

impl MarketService {
    /// Create a service with no providers.
    pub fn new() -> Self {
        Self {
            providers: Vec::new(),
        }
    }

    /// Create a service with the default provider (CoinGecko).
    pub fn new_with_defaults() -> Self {
        let mut service = Self::new();
        service.register(Box::new(CoinGeckoProvider::new()));
        service
    }

    /// Register a provider; earlier registrations take priority.
    pub fn register(&mut self, provider: Box<dyn MarketDataProvider>) {
        self.providers.push(provider);
    }

    pub fn provider_names(&self) -> Vec<String> {
        self.providers.iter().map(|p| p.name().to_string()).collect()
    }

    /// Fetch a snapshot for `symbols` in `currency`, falling back across providers.
    ///
    /// Entries whose price is negative or not finite are stripped of their
    /// ticker so downstream code treats them as "no price data".
    pub async fn fetch_snapshot(
        &self,
        symbols: &[String],
        currency: &str,
    ) -> Result<MarketSnapshot, CoreError> {
        if self.providers.is_empty() {
            return Err(CoreError::NoProvider);
        }

        let mut last_error = None;
        for provider in &self.providers {
            match provider.fetch_snapshot(symbols, currency).await {
                Ok(snapshot) => return Ok(Self::sanitize(snapshot, provider.name())),
                Err(e) => {
                    tracing::warn!("Market data provider {} failed: {e}", provider.name());
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or(CoreError::NoProvider))
    }

    fn sanitize(snapshot: MarketSnapshot, provider: &str) -> MarketSnapshot {
        let mut clean = MarketSnapshot::new();
        for (symbol, entry) in snapshot.iter() {
            let mut entry = entry.clone();
            let bad_price = entry
                .ticker
                .as_ref()
                .and_then(|t| t.price)
                .is_some_and(|p| !p.is_finite() || p < 0.0);
            if bad_price {
                tracing::warn!("{provider} returned an invalid price for {symbol}, ignoring it");
                entry.ticker = None;
            }
            clean.insert(symbol, entry);
        }
        clean
    }
}

impl Default for MarketService {
    fn default() -> Self {
        Self::new()
    }
}
