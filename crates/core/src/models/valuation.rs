use serde::{Deserialize, Serialize};

/// Derived monetary summary of the whole portfolio. Computed fresh from
/// holdings and a market snapshot; never persisted.
///
/// `total_value` only counts holdings with a known price while
/// `total_basis` counts every holding. Downstream displays and alert
/// thresholds rely on that asymmetry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioValuation {
    /// Exchange rate applied to every amount below
    pub exchange_rate: f64,

    /// Σ quantity × price × rate over holdings with price data
    pub total_value: f64,

    /// Σ quantity × cost basis × rate over all holdings
    pub total_basis: f64,

    /// total_value - total_basis
    pub total_return: f64,

    /// total_return / total_basis × 100, or 0 when there is no basis
    pub total_return_percent: f64,

    /// Per-asset breakdown, ordered by symbol
    pub assets: Vec<AssetValuation>,
}

impl PortfolioValuation {
    /// Assets that had price data in the snapshot.
    pub fn priced_assets(&self) -> impl Iterator<Item = &AssetValuation> {
        self.assets.iter().filter(|a| a.price.is_some())
    }

    /// Largest single-asset allocation percentage (0 for an empty portfolio).
    pub fn max_allocation(&self) -> f64 {
        self.assets
            .iter()
            .map(|a| a.allocation)
            .fold(0.0, f64::max)
    }

    /// Diversification heuristic over the priced assets.
    pub fn diversification_score(&self) -> f64 {
        crate::services::valuation_service::diversification_score(
            self.priced_assets().count(),
            self.max_allocation(),
        )
    }

    pub fn asset(&self, symbol: &str) -> Option<&AssetValuation> {
        let symbol = super::holding::normalize_symbol(symbol);
        self.assets.iter().find(|a| a.symbol == symbol)
    }
}

/// Valuation of a single holding.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetValuation {
    pub symbol: String,

    pub quantity: f64,

    /// Snapshot price (before exchange rate), `None` when the snapshot had no data
    pub price: Option<f64>,

    /// quantity × price × rate, 0 without price data
    pub current_value: f64,

    /// quantity × cost basis × rate
    pub initial_value: f64,

    /// current_value - initial_value
    #[serde(rename = "return")]
    pub gain_loss: f64,

    /// gain_loss / initial_value × 100, 0 when nothing was paid
    pub return_percent: f64,

    /// current_value / total_value × 100, 0 when the portfolio is worth nothing
    pub allocation: f64,

    /// 24h percentage change reported by the snapshot
    pub change_24h: Option<f64>,
}
