use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Discriminant of an alert rule, as written in the `type` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertType {
    PriceAbove,
    PriceBelow,
    PortfolioMilestone,
    PortfolioDrop,
    MarketVolatility,
}

impl AlertType {
    pub const ALL: [AlertType; 5] = [
        AlertType::PriceAbove,
        AlertType::PriceBelow,
        AlertType::PortfolioMilestone,
        AlertType::PortfolioDrop,
        AlertType::MarketVolatility,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AlertType::PriceAbove => "price_above",
            AlertType::PriceBelow => "price_below",
            AlertType::PortfolioMilestone => "portfolio_milestone",
            AlertType::PortfolioDrop => "portfolio_drop",
            AlertType::MarketVolatility => "market_volatility",
        }
    }

    pub fn is_price(&self) -> bool {
        matches!(self, AlertType::PriceAbove | AlertType::PriceBelow)
    }

    pub fn is_portfolio(&self) -> bool {
        matches!(self, AlertType::PortfolioMilestone | AlertType::PortfolioDrop)
    }
}

impl std::fmt::Display for AlertType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AlertType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AlertType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| format!("Unknown alert type: {s}"))
    }
}

/// Lifecycle status of an alert.
///
/// `Expired` is reserved: nothing in the engine produces it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertStatus {
    #[default]
    Active,
    Triggered,
    Disabled,
    Expired,
}

impl std::fmt::Display for AlertStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AlertStatus::Active => write!(f, "active"),
            AlertStatus::Triggered => write!(f, "triggered"),
            AlertStatus::Disabled => write!(f, "disabled"),
            AlertStatus::Expired => write!(f, "expired"),
        }
    }
}

/// Type-specific payload of an alert, including the value captured when it fired.
///
/// Flattened into [`Alert`], so the persisted JSON keeps the `type` tag and
/// camelCase fields side by side with the common ones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AlertKind {
    #[serde(rename_all = "camelCase")]
    PriceAbove {
        coin: String,
        target_price: f64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        triggered_price: Option<f64>,
    },
    #[serde(rename_all = "camelCase")]
    PriceBelow {
        coin: String,
        target_price: f64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        triggered_price: Option<f64>,
    },
    #[serde(rename_all = "camelCase")]
    PortfolioMilestone {
        target_value: f64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        triggered_value: Option<f64>,
    },
    #[serde(rename_all = "camelCase")]
    PortfolioDrop {
        target_value: f64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        triggered_value: Option<f64>,
    },
    #[serde(rename_all = "camelCase")]
    MarketVolatility {
        volatility_threshold: f64,
        #[serde(default = "default_timeframe")]
        timeframe: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        triggered_volatility: Option<f64>,
    },
}

impl AlertKind {
    pub fn alert_type(&self) -> AlertType {
        match self {
            AlertKind::PriceAbove { .. } => AlertType::PriceAbove,
            AlertKind::PriceBelow { .. } => AlertType::PriceBelow,
            AlertKind::PortfolioMilestone { .. } => AlertType::PortfolioMilestone,
            AlertKind::PortfolioDrop { .. } => AlertType::PortfolioDrop,
            AlertKind::MarketVolatility { .. } => AlertType::MarketVolatility,
        }
    }

    /// Coin symbol for price alerts.
    pub fn coin(&self) -> Option<&str> {
        match self {
            AlertKind::PriceAbove { coin, .. } | AlertKind::PriceBelow { coin, .. } => Some(coin),
            _ => None,
        }
    }

    /// The price, portfolio value or volatility recorded when the alert fired.
    pub fn triggered_reading(&self) -> Option<f64> {
        match self {
            AlertKind::PriceAbove { triggered_price, .. }
            | AlertKind::PriceBelow { triggered_price, .. } => *triggered_price,
            AlertKind::PortfolioMilestone { triggered_value, .. }
            | AlertKind::PortfolioDrop { triggered_value, .. } => *triggered_value,
            AlertKind::MarketVolatility {
                triggered_volatility,
                ..
            } => *triggered_volatility,
        }
    }

    /// Store (or clear, with `None`) the reading in the type-appropriate field.
    pub fn set_triggered_reading(&mut self, reading: Option<f64>) {
        match self {
            AlertKind::PriceAbove { triggered_price, .. }
            | AlertKind::PriceBelow { triggered_price, .. } => *triggered_price = reading,
            AlertKind::PortfolioMilestone { triggered_value, .. }
            | AlertKind::PortfolioDrop { triggered_value, .. } => *triggered_value = reading,
            AlertKind::MarketVolatility {
                triggered_volatility,
                ..
            } => *triggered_volatility = reading,
        }
    }
}

/// Human-facing label attached at creation time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AlertMetadata {
    #[serde(default)]
    pub title: String,

    #[serde(default)]
    pub description: String,
}

/// A persisted user-defined alert rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    /// Stable unique identifier, e.g. `alert_3f2a…`
    pub id: String,

    #[serde(flatten)]
    pub kind: AlertKind,

    /// Users can switch an alert off without deleting it
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    #[serde(default)]
    pub status: AlertStatus,

    pub created_at: DateTime<Utc>,

    #[serde(default)]
    pub triggered_at: Option<DateTime<Utc>>,

    #[serde(default)]
    pub metadata: AlertMetadata,
}

impl Alert {
    /// A fresh, enabled, active alert with a generated id.
    pub fn new(kind: AlertKind, metadata: AlertMetadata) -> Self {
        Self {
            id: generate_alert_id(),
            kind,
            enabled: true,
            status: AlertStatus::Active,
            created_at: Utc::now(),
            triggered_at: None,
            metadata,
        }
    }

    pub fn alert_type(&self) -> AlertType {
        self.kind.alert_type()
    }

    /// Only enabled, active alerts take part in evaluation.
    pub fn is_armed(&self) -> bool {
        self.enabled && self.status == AlertStatus::Active
    }

    pub fn is_triggered(&self) -> bool {
        self.status == AlertStatus::Triggered
    }
}

/// Loosely-shaped alert request, as submitted by a form.
///
/// Checked by `AlertService::validate_alert` before it becomes an [`Alert`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertDraft {
    #[serde(rename = "type", default)]
    pub alert_type: String,

    #[serde(default)]
    pub coin: Option<String>,

    #[serde(default)]
    pub target_price: Option<f64>,

    #[serde(default)]
    pub target_value: Option<f64>,

    #[serde(default)]
    pub volatility_threshold: Option<f64>,

    #[serde(default)]
    pub timeframe: Option<String>,
}

impl AlertDraft {
    pub fn price(alert_type: AlertType, coin: impl Into<String>, target_price: f64) -> Self {
        Self {
            alert_type: alert_type.as_str().to_string(),
            coin: Some(coin.into()),
            target_price: Some(target_price),
            ..Self::default()
        }
    }

    pub fn portfolio(alert_type: AlertType, target_value: f64) -> Self {
        Self {
            alert_type: alert_type.as_str().to_string(),
            target_value: Some(target_value),
            ..Self::default()
        }
    }

    pub fn volatility(threshold: f64, timeframe: impl Into<String>) -> Self {
        Self {
            alert_type: AlertType::MarketVolatility.as_str().to_string(),
            volatility_threshold: Some(threshold),
            timeframe: Some(timeframe.into()),
            ..Self::default()
        }
    }
}

/// Outcome of validating an [`AlertDraft`]. Never an `Err`: the reason is
/// carried as data so the caller can show it inline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertValidation {
    pub valid: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AlertValidation {
    pub fn ok() -> Self {
        Self {
            valid: true,
            error: None,
        }
    }

    pub fn invalid(reason: impl Into<String>) -> Self {
        Self {
            valid: false,
            error: Some(reason.into()),
        }
    }
}

pub const DEFAULT_TIMEFRAME: &str = "24h";

fn default_timeframe() -> String {
    DEFAULT_TIMEFRAME.to_string()
}

fn default_enabled() -> bool {
    true
}

fn generate_alert_id() -> String {
    format!("alert_{}", uuid::Uuid::new_v4().simple())
}
