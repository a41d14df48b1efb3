use serde::{Deserialize, Serialize};

use super::valuation::AssetValuation;

/// Coarse risk bucket derived from average 24h volatility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RiskLevel::Low => write!(f, "Low"),
            RiskLevel::Medium => write!(f, "Medium"),
            RiskLevel::High => write!(f, "High"),
        }
    }
}

/// Performance and risk indicators layered on top of a valuation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioAnalytics {
    pub total_return: f64,

    pub total_return_percent: f64,

    /// Priced assets sorted by return percentage, best first
    pub performances: Vec<AssetValuation>,

    pub best_performer: Option<AssetValuation>,

    pub worst_performer: Option<AssetValuation>,

    /// 0–100, higher means more spread out
    pub diversification_score: f64,

    /// Largest single allocation percentage
    pub largest_position: f64,

    /// Mean |24h change| across priced assets
    pub volatility: f64,

    pub risk_level: RiskLevel,

    /// total_return_percent / max(volatility, 1)
    pub risk_adjusted_return: f64,

    /// Value gained or lost over the last 24h
    pub change_24h: f64,

    /// change_24h as a percentage of total value
    pub change_24h_percent: f64,
}
