use crate::models::analytics::{PortfolioAnalytics, RiskLevel};
use crate::models::valuation::{AssetValuation, PortfolioValuation};
use crate::services::valuation_service::percent_of;

/// Average volatility above which a portfolio counts as high risk.
const HIGH_RISK_VOLATILITY: f64 = 10.0;

/// Average volatility above which a portfolio counts as medium risk.
const MEDIUM_RISK_VOLATILITY: f64 = 5.0;

/// Computes performance and risk indicators from a valuation:
/// best/worst performers, volatility, risk level, 24h change, diversification.
pub struct AnalyticsService;

impl AnalyticsService {
    pub fn new() -> Self {
        Self
    }

    pub fn compute_analytics(&self, valuation: &PortfolioValuation) -> PortfolioAnalytics {
        let mut performances: Vec<AssetValuation> =
            valuation.priced_assets().cloned().collect();

        // Best return first
        performances.sort_by(|a, b| {
            b.return_percent
                .partial_cmp(&a.return_percent)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        // Assets without a reported change count as flat
        let volatility = if performances.is_empty() {
            0.0
        } else {
            performances
                .iter()
                .map(|a| a.change_24h.unwrap_or(0.0).abs())
                .sum::<f64>()
                / performances.len() as f64
        };

        let change_24h: f64 = performances
            .iter()
            .map(|a| a.current_value * a.change_24h.unwrap_or(0.0) / 100.0)
            .sum();

        PortfolioAnalytics {
            total_return: valuation.total_return,
            total_return_percent: valuation.total_return_percent,
            best_performer: performances.first().cloned(),
            worst_performer: performances.last().cloned(),
            diversification_score: valuation.diversification_score(),
            largest_position: valuation.max_allocation(),
            volatility,
            risk_level: risk_level(volatility),
            risk_adjusted_return: valuation.total_return_percent / volatility.max(1.0),
            change_24h,
            change_24h_percent: percent_of(change_24h, valuation.total_value),
            performances,
        }
    }
}

impl Default for AnalyticsService {
    fn default() -> Self {
        Self::new()
    }
}

/// Bucket an average 24h volatility into a risk level.
pub fn risk_level(volatility: f64) -> RiskLevel {
    if volatility > HIGH_RISK_VOLATILITY {
        RiskLevel::High
    } else if volatility > MEDIUM_RISK_VOLATILITY {
        RiskLevel::Medium
    } else {
        RiskLevel::Low
    }
}
