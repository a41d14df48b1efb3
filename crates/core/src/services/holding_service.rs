use crate::errors::CoreError;
use crate::models::holding::{normalize_symbol, Holding};
use crate::models::portfolio::Portfolio;
use crate::services::valuation_service::ValuationService;

/// Manages the holdings in a portfolio: add (or top up), remove, list.
///
/// Pure business logic: no I/O.
pub struct HoldingService {
    valuation_service: ValuationService,
}

impl HoldingService {
    pub fn new() -> Self {
        Self {
            valuation_service: ValuationService::new(),
        }
    }

    /// Add a holding to the portfolio.
    ///
    /// If the symbol is already held, the new lot is merged into the
    /// existing position at a weighted-average cost basis.
    pub fn add_holding(&self, portfolio: &mut Portfolio, holding: Holding) -> Result<(), CoreError> {
        self.validate_holding(&holding)?;

        let merged = match portfolio.holdings.get(&holding.symbol) {
            Some(existing) => self.valuation_service.merge_holding(existing, &holding),
            None => holding,
        };
        portfolio.holdings.insert(merged.symbol.clone(), merged);
        Ok(())
    }

    /// Remove a holding by symbol (case-insensitive).
    pub fn remove_holding(&self, portfolio: &mut Portfolio, symbol: &str) -> Result<Holding, CoreError> {
        let key = normalize_symbol(symbol);
        portfolio
            .holdings
            .remove(&key)
            .ok_or(CoreError::HoldingNotFound(key))
    }

    pub fn get_holding<'a>(&self, portfolio: &'a Portfolio, symbol: &str) -> Option<&'a Holding> {
        portfolio.holdings.get(&normalize_symbol(symbol))
    }

    /// All holdings, ordered by symbol.
    pub fn get_holdings<'a>(&self, portfolio: &'a Portfolio) -> Vec<&'a Holding> {
        portfolio.holdings.values().collect()
    }

    /// Rules:
    /// - Symbol must not be empty
    /// - Quantity and cost basis must be finite and non-negative
    fn validate_holding(&self, holding: &Holding) -> Result<(), CoreError> {
        if holding.symbol.is_empty() {
            return Err(CoreError::ValidationError(
                "Holding symbol is required".into(),
            ));
        }
        if !holding.quantity.is_finite() || holding.quantity < 0.0 {
            return Err(CoreError::ValidationError(format!(
                "Quantity for {} must be a non-negative number, got {}",
                holding.symbol, holding.quantity
            )));
        }
        if !holding.cost_basis.is_finite() || holding.cost_basis < 0.0 {
            return Err(CoreError::ValidationError(format!(
                "Cost basis for {} must be a non-negative number, got {}",
                holding.symbol, holding.cost_basis
            )));
        }
        Ok(())
    }
}

impl Default for HoldingService {
    fn default() -> Self {
        Self::new()
    }
}
