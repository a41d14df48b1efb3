use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use super::holding::normalize_symbol;

/// Latest market figures for one symbol.
///
/// Every field is optional: providers omit what they don't have, and a
/// ticker without a usable price is treated as "no price data".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Ticker {
    /// Unit price in the snapshot's currency
    #[serde(default, deserialize_with = "lenient_f64", skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,

    /// Signed percentage change over the last 24 hours
    #[serde(default, deserialize_with = "lenient_f64", skip_serializing_if = "Option::is_none")]
    pub change: Option<f64>,

    /// Traded volume over the last 24 hours
    #[serde(default, deserialize_with = "lenient_f64", skip_serializing_if = "Option::is_none")]
    pub volume: Option<f64>,
}

impl Ticker {
    pub fn new(price: f64) -> Self {
        Self {
            price: Some(price),
            change: None,
            volume: None,
        }
    }

    pub fn with_change(mut self, change: f64) -> Self {
        self.change = Some(change);
        self
    }

    pub fn with_volume(mut self, volume: f64) -> Self {
        self.volume = Some(volume);
        self
    }
}

/// One symbol's entry in a snapshot. `ticker` is absent when the provider
/// knew the symbol but returned nothing for it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarketEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ticker: Option<Ticker>,

    /// Snapshot creation time, milliseconds since the Unix epoch
    #[serde(default, deserialize_with = "lenient_i64", skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
}

impl MarketEntry {
    pub fn from_ticker(ticker: Ticker) -> Self {
        Self {
            ticker: Some(ticker),
            timestamp: None,
        }
    }
}

/// Point-in-time market data keyed by lowercase symbol.
///
/// Deserialises from `{ "<symbol>": { "ticker": { "price", "change", "volume" } } }`.
/// Entries that cannot be read are dropped instead of failing the snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "BTreeMap<String, Value>", into = "BTreeMap<String, MarketEntry>")]
pub struct MarketSnapshot {
    entries: BTreeMap<String, MarketEntry>,
}

impl MarketSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the entry for `symbol` (case-insensitive).
    pub fn insert(&mut self, symbol: &str, entry: MarketEntry) {
        self.entries.insert(normalize_symbol(symbol), entry);
    }

    /// Builder-style insert of a ticker.
    pub fn with_ticker(mut self, symbol: &str, ticker: Ticker) -> Self {
        self.insert(symbol, MarketEntry::from_ticker(ticker));
        self
    }

    pub fn entry(&self, symbol: &str) -> Option<&MarketEntry> {
        self.entries.get(&normalize_symbol(symbol))
    }

    /// Usable price for `symbol`: present, finite and non-negative.
    pub fn price(&self, symbol: &str) -> Option<f64> {
        self.entry(symbol)?
            .ticker
            .as_ref()?
            .price
            .filter(|p| p.is_finite() && *p >= 0.0)
    }

    /// 24h percentage change for `symbol`, if reported.
    pub fn change(&self, symbol: &str) -> Option<f64> {
        self.entry(symbol)?
            .ticker
            .as_ref()?
            .change
            .filter(|c| c.is_finite())
    }

    /// Mean of `|change|` across every symbol that reports a 24h change.
    /// `None` when no symbol does.
    pub fn average_abs_change(&self) -> Option<f64> {
        let changes: Vec<f64> = self
            .entries
            .values()
            .filter_map(|e| e.ticker.as_ref()?.change)
            .filter(|c| c.is_finite())
            .map(f64::abs)
            .collect();

        if changes.is_empty() {
            return None;
        }
        Some(changes.iter().sum::<f64>() / changes.len() as f64)
    }

    pub fn symbols(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &MarketEntry)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl From<BTreeMap<String, Value>> for MarketSnapshot {
    fn from(raw: BTreeMap<String, Value>) -> Self {
        let mut snapshot = MarketSnapshot::new();
        for (symbol, value) in raw {
            match serde_json::from_value::<MarketEntry>(value) {
                Ok(entry) => snapshot.insert(&symbol, entry),
                Err(e) => tracing::debug!("Ignoring unreadable market entry for {symbol}: {e}"),
            }
        }
        snapshot
    }
}

impl From<MarketSnapshot> for BTreeMap<String, MarketEntry> {
    fn from(snapshot: MarketSnapshot) -> Self {
        snapshot.entries
    }
}

/// Accepts a JSON number, a numeric string, or null.
fn lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}

/// Whole numbers only; fractional or out-of-range timestamps read as `None`.
fn lenient_i64<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(lenient_f64(deserializer)?
        .filter(|v| v.fract() == 0.0 && v.abs() < i64::MAX as f64)
        .map(|v| v as i64))
}
