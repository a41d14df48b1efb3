use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Base currency every market price is quoted in.
pub const BASE_CURRENCY: &str = "USD";

/// User-configurable display settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    /// The currency portfolio values are displayed in (e.g., "USD", "EUR").
    pub currency: String,

    /// Units of each currency per one unit of the base currency.
    /// The base currency always maps to 1.
    #[serde(default)]
    pub exchange_rates: HashMap<String, f64>,
}

impl Default for Settings {
    fn default() -> Self {
        let mut exchange_rates = HashMap::new();
        exchange_rates.insert(BASE_CURRENCY.to_string(), 1.0);
        Self {
            currency: BASE_CURRENCY.to_string(),
            exchange_rates,
        }
    }
}

impl Settings {
    /// Rate for the display currency; 1.0 when unknown or not a positive number.
    pub fn exchange_rate(&self) -> f64 {
        self.exchange_rates
            .get(&self.currency.to_uppercase())
            .copied()
            .filter(|r| r.is_finite() && *r > 0.0)
            .unwrap_or(1.0)
    }
}
