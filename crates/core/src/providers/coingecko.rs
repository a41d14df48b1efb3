use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Mutex;
#[cfg(not(target_arch = "wasm32"))]
use std::time::Duration;

use super::traits::MarketDataProvider;
use crate::errors::CoreError;
use crate::models::holding::normalize_symbol;
use crate::models::market::{MarketEntry, MarketSnapshot, Ticker};

const BASE_URL: &str = "https://api.coingecko.com/api/v3";

const PROVIDER_NAME: &str = "CoinGecko";

/// CoinGecko API provider for cryptocurrency market data.
///
/// - **Free**: No API key required for the public endpoints.
/// - **Endpoints**: `/simple/price` (price, 24h volume, 24h change), `/coins/list`.
///
/// CoinGecko addresses coins by id ("bitcoin"), not ticker ("btc").
/// Common tickers are mapped up front; anything else is looked up in the
/// coin list once and cached.
pub struct CoinGeckoProvider {
    client: Client,
    /// Lowercase symbol (btc) → CoinGecko id (bitcoin).
    symbol_map: Mutex<HashMap<String, String>>,
    /// Set once the full coin list has been merged into `symbol_map`.
    list_loaded: Mutex<bool>,
}

impl CoinGeckoProvider {
    pub fn new() -> Self {
        let common = [
            ("btc", "bitcoin"),
            ("eth", "ethereum"),
            ("usdt", "tether"),
            ("usdc", "usd-coin"),
            ("bnb", "binancecoin"),
            ("xrp", "ripple"),
            ("ada", "cardano"),
            ("sol", "solana"),
            ("doge", "dogecoin"),
            ("dot", "polkadot"),
            ("ltc", "litecoin"),
            ("avax", "avalanche-2"),
            ("link", "chainlink"),
            ("uni", "uniswap"),
            ("atom", "cosmos"),
            ("xlm", "stellar"),
            ("algo", "algorand"),
            ("trx", "tron"),
            ("dai", "dai"),
            ("xmr", "monero"),
            ("etc", "ethereum-classic"),
            ("zec", "zcash"),
        ];
        let symbol_map = common
            .into_iter()
            .map(|(sym, id)| (sym.to_string(), id.to_string()))
            .collect();

        let builder = Client::builder();
        #[cfg(not(target_arch = "wasm32"))]
        let builder = builder.timeout(Duration::from_secs(30));
        Self {
            client: builder.build().unwrap_or_else(|_| Client::new()),
            symbol_map: Mutex::new(symbol_map),
            list_loaded: Mutex::new(false),
        }
    }

    /// Resolve a ticker like "BTC" to a CoinGecko id using the cached map only.
    pub fn resolve_id(&self, symbol: &str) -> Option<String> {
        let map = self.symbol_map.lock().unwrap_or_else(|e| e.into_inner());
        map.get(&normalize_symbol(symbol)).cloned()
    }

    /// Merge CoinGecko's full coin list into the symbol map (first id wins
    /// for duplicate tickers, and seeded mappings are never overwritten).
    async fn load_coin_list(&self) -> Result<(), CoreError> {
        if *self.list_loaded.lock().unwrap_or_else(|e| e.into_inner()) {
            return Ok(());
        }

        let url = format!("{BASE_URL}/coins/list");
        let coins: Vec<CoinListEntry> = self
            .client
            .get(&url)
            .send()
            .await?
            .json()
            .await
            .map_err(|e| CoreError::Api {
                provider: PROVIDER_NAME.into(),
                message: format!("Failed to parse coin list: {e}"),
            })?;

        {
            let mut map = self.symbol_map.lock().unwrap_or_else(|e| e.into_inner());
            for coin in coins {
                map.entry(normalize_symbol(&coin.symbol)).or_insert(coin.id);
            }
        }
        *self.list_loaded.lock().unwrap_or_else(|e| e.into_inner()) = true;
        Ok(())
    }

    /// Resolve every symbol, fetching the coin list only when needed.
    /// Returns `(symbol, id)` pairs; unknown symbols are skipped.
    async fn resolve_ids(&self, symbols: &[String]) -> Result<Vec<(String, String)>, CoreError> {
        let unresolved = symbols.iter().any(|s| self.resolve_id(s).is_none());
        if unresolved {
            self.load_coin_list().await?;
        }

        Ok(symbols
            .iter()
            .filter_map(|s| match self.resolve_id(s) {
                Some(id) => Some((normalize_symbol(s), id)),
                None => {
                    tracing::warn!("{PROVIDER_NAME}: no coin found for symbol {s}");
                    None
                }
            })
            .collect())
    }
}

impl Default for CoinGeckoProvider {
    fn default() -> Self {
        Self::new()
    }
}

// ── CoinGecko API response types ────────────────────────────────────

#[derive(Deserialize)]
struct CoinListEntry {
    id: String,
    symbol: String,
}

/// `/simple/price` response: coin id → field name → value.
pub type SimplePriceResponse = HashMap<String, HashMap<String, Value>>;

/// Map a `/simple/price` response back onto ticker symbols.
///
/// `ids` pairs each requested symbol with its CoinGecko id. Coins missing
/// from the response are left out of the snapshot; coins present without a
/// price get an entry with an empty ticker.
pub fn snapshot_from_simple_price(
    response: &SimplePriceResponse,
    ids: &[(String, String)],
    currency: &str,
    timestamp: i64,
) -> MarketSnapshot {
    let cur = currency.to_lowercase();
    let mut snapshot = MarketSnapshot::new();

    for (symbol, id) in ids {
        let Some(fields) = response.get(id) else {
            continue;
        };
        let read = |key: &str| fields.get(key).and_then(Value::as_f64);

        let ticker = Ticker {
            price: read(&cur),
            change: read(&format!("{cur}_24h_change")),
            volume: read(&format!("{cur}_24h_vol")),
        };
        snapshot.insert(
            symbol,
            MarketEntry {
                ticker: Some(ticker),
                timestamp: Some(timestamp),
            },
        );
    }

    snapshot
}

#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
impl MarketDataProvider for CoinGeckoProvider {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    async fn fetch_snapshot(
        &self,
        symbols: &[String],
        currency: &str,
    ) -> Result<MarketSnapshot, CoreError> {
        if symbols.is_empty() {
            return Ok(MarketSnapshot::new());
        }

        let ids = self.resolve_ids(symbols).await?;
        if ids.is_empty() {
            return Ok(MarketSnapshot::new());
        }

        let id_list: Vec<&str> = ids.iter().map(|(_, id)| id.as_str()).collect();
        let url = format!(
            "{BASE_URL}/simple/price?ids={}&vs_currencies={}&include_24hr_vol=true&include_24hr_change=true",
            id_list.join("%2C"),
            currency.to_lowercase()
        );

        let resp: SimplePriceResponse = self
            .client
            .get(&url)
            .send()
            .await?
            .json()
            .await
            .map_err(|e| CoreError::Api {
                provider: PROVIDER_NAME.into(),
                message: format!("Failed to parse prices: {e}"),
            })?;

        let timestamp = chrono::Utc::now().timestamp_millis();
        Ok(snapshot_from_simple_price(&resp, &ids, currency, timestamp))
    }
}
