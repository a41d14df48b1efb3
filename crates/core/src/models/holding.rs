use serde::{Deserialize, Serialize};

/// One owned asset: how much of it the user holds and what they paid on average.
///
/// Symbols are case-insensitive and normalised to lowercase, matching the
/// keys used by market snapshots and persisted alerts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Holding {
    /// Ticker symbol, lowercased (e.g., "btc", "eth")
    pub symbol: String,

    /// Units held ("hodl"), never negative
    #[serde(alias = "hodl")]
    pub quantity: f64,

    /// Average acquisition price per unit, in the base currency
    #[serde(alias = "cost_basis", rename = "costBasis")]
    pub cost_basis: f64,
}

impl Holding {
    pub fn new(symbol: impl Into<String>, quantity: f64, cost_basis: f64) -> Self {
        Self {
            symbol: normalize_symbol(symbol.into()),
            quantity,
            cost_basis,
        }
    }

    /// An empty position for `symbol` (zero units, zero basis).
    pub fn zero(symbol: impl Into<String>) -> Self {
        Self::new(symbol, 0.0, 0.0)
    }

    /// Total amount paid for this position (`quantity × cost_basis`).
    pub fn total_cost(&self) -> f64 {
        self.quantity * self.cost_basis
    }

    /// True when both numbers are finite and non-negative.
    pub fn is_well_formed(&self) -> bool {
        self.quantity.is_finite()
            && self.quantity >= 0.0
            && self.cost_basis.is_finite()
            && self.cost_basis >= 0.0
    }
}

/// Lowercase and trim a ticker symbol so lookups are case-insensitive.
pub fn normalize_symbol(symbol: impl AsRef<str>) -> String {
    symbol.as_ref().trim().to_lowercase()
}
