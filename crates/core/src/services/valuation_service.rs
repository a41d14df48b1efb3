use std::collections::BTreeMap;

use crate::models::holding::Holding;
use crate::models::market::MarketSnapshot;
use crate::models::valuation::{AssetValuation, PortfolioValuation};

/// Turns holdings and a market snapshot into a [`PortfolioValuation`].
///
/// Pure business logic: no I/O, never fails. Missing or malformed data
/// degrades to a zero contribution for the affected asset.
pub struct ValuationService;

impl ValuationService {
    pub fn new() -> Self {
        Self
    }

    /// Value every holding against `snapshot`, converting with `exchange_rate`.
    ///
    /// A non-positive or non-finite rate falls back to 1.0.
    pub fn compute_valuation(
        &self,
        holdings: &BTreeMap<String, Holding>,
        snapshot: &MarketSnapshot,
        exchange_rate: f64,
    ) -> PortfolioValuation {
        let rate = if exchange_rate.is_finite() && exchange_rate > 0.0 {
            exchange_rate
        } else {
            tracing::warn!("Invalid exchange rate {exchange_rate}, valuing in base currency");
            1.0
        };

        let mut assets = Vec::with_capacity(holdings.len());
        let mut total_value = 0.0;
        let mut total_basis = 0.0;

        for holding in holdings.values() {
            if !holding.is_well_formed() {
                tracing::debug!(
                    "Holding {} has unusable numbers (quantity {}, cost basis {}), counting as zero",
                    holding.symbol,
                    holding.quantity,
                    holding.cost_basis
                );
            }
            let quantity = sanitize(holding.quantity);
            let cost_basis = sanitize(holding.cost_basis);

            let price = snapshot.price(&holding.symbol);
            let current_value = price.map_or(0.0, |p| quantity * p * rate);
            let initial_value = quantity * cost_basis * rate;

            total_value += current_value;
            total_basis += initial_value;

            let gain_loss = current_value - initial_value;
            assets.push(AssetValuation {
                symbol: holding.symbol.clone(),
                quantity,
                price,
                current_value,
                initial_value,
                gain_loss,
                return_percent: percent_of(gain_loss, initial_value),
                allocation: 0.0, // filled below
                change_24h: snapshot.change(&holding.symbol),
            });
        }

        for asset in &mut assets {
            asset.allocation = percent_of(asset.current_value, total_value);
        }

        let total_return = total_value - total_basis;
        PortfolioValuation {
            exchange_rate: rate,
            total_value,
            total_basis,
            total_return,
            total_return_percent: percent_of(total_return, total_basis),
            assets,
        }
    }

    /// Combine an existing position with a newly acquired lot.
    ///
    /// The resulting cost basis is the quantity-weighted average of both.
    /// When one side holds nothing the other side is returned unchanged;
    /// when both hold nothing the result is a zero holding.
    pub fn merge_holding(&self, existing: &Holding, incoming: &Holding) -> Holding {
        let existing_qty = sanitize(existing.quantity);
        let incoming_qty = sanitize(incoming.quantity);

        match (existing_qty > 0.0, incoming_qty > 0.0) {
            (false, false) => Holding::zero(&existing.symbol),
            (true, false) => existing.clone(),
            (false, true) => Holding {
                symbol: existing.symbol.clone(),
                ..incoming.clone()
            },
            (true, true) => {
                let new_qty = existing_qty + incoming_qty;
                let total_cost = sanitize(existing.cost_basis) * existing_qty
                    + sanitize(incoming.cost_basis) * incoming_qty;
                Holding {
                    symbol: existing.symbol.clone(),
                    quantity: new_qty,
                    cost_basis: total_cost / new_qty,
                }
            }
        }
    }
}

impl Default for ValuationService {
    fn default() -> Self {
        Self::new()
    }
}

/// Diversification heuristic in 0–100.
///
/// Non-decreasing in `holding_count`, non-increasing in `max_allocation`.
pub fn diversification_score(holding_count: usize, max_allocation: f64) -> f64 {
    let max_allocation = if max_allocation.is_finite() {
        max_allocation
    } else {
        0.0
    };
    let raw = holding_count as f64 * 15.0 - max_allocation * 0.5;
    raw.clamp(0.0, 100.0).round()
}

/// `part / whole × 100`, or 0 when `whole` is zero.
pub(crate) fn percent_of(part: f64, whole: f64) -> f64 {
    if whole == 0.0 || !whole.is_finite() {
        0.0
    } else {
        part / whole * 100.0
    }
}

/// Non-finite or negative amounts count as zero.
fn sanitize(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}
