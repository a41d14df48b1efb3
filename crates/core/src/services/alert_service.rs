use chrono::{DateTime, Utc};

use crate::errors::CoreError;
use crate::models::alert::{
    Alert, AlertDraft, AlertKind, AlertMetadata, AlertStatus, AlertType, AlertValidation,
    DEFAULT_TIMEFRAME,
};
use crate::models::holding::normalize_symbol;
use crate::models::market::MarketSnapshot;
use crate::services::notification_service::format_amount;

/// Result of one evaluation pass.
#[derive(Debug, Clone, PartialEq)]
pub struct EvaluationOutcome {
    /// The full alert set, with any transitions applied, in input order
    pub alerts: Vec<Alert>,

    /// Alerts that fired during this pass, post-transition, in input order
    pub triggered: Vec<Alert>,
}

impl EvaluationOutcome {
    /// True when at least one alert changed and the set should be persisted.
    pub fn has_changes(&self) -> bool {
        !self.triggered.is_empty()
    }
}

/// Evaluates alert rules and applies the explicit user transitions
/// (toggle, reset, delete).
///
/// Every operation is pure: it reads a slice and returns a new collection.
/// Alerts that are not touched come back equal by value, so callers can
/// diff cheaply and skip persistence.
pub struct AlertService;

impl AlertService {
    pub fn new() -> Self {
        Self
    }

    /// Evaluate every alert against the snapshot and the current portfolio value.
    pub fn evaluate(
        &self,
        alerts: &[Alert],
        snapshot: &MarketSnapshot,
        portfolio_value: f64,
    ) -> EvaluationOutcome {
        self.evaluate_at(alerts, snapshot, portfolio_value, Utc::now())
    }

    /// Same as [`evaluate`](Self::evaluate) with an explicit trigger timestamp.
    pub fn evaluate_at(
        &self,
        alerts: &[Alert],
        snapshot: &MarketSnapshot,
        portfolio_value: f64,
        now: DateTime<Utc>,
    ) -> EvaluationOutcome {
        let market_volatility = snapshot.average_abs_change();
        let mut triggered = Vec::new();

        let updated: Vec<Alert> = alerts
            .iter()
            .map(|alert| {
                if !alert.is_armed() {
                    return alert.clone();
                }

                let Some(reading) =
                    Self::trigger_reading(&alert.kind, snapshot, portfolio_value, market_volatility)
                else {
                    return alert.clone();
                };

                let mut fired = alert.clone();
                fired.status = AlertStatus::Triggered;
                fired.triggered_at = Some(now);
                fired.kind.set_triggered_reading(Some(reading));

                tracing::info!(
                    "Alert {} ({}) triggered at {reading}",
                    fired.id,
                    fired.alert_type()
                );
                triggered.push(fired.clone());
                fired
            })
            .collect();

        tracing::debug!(
            "Evaluated {} alerts, {} triggered",
            alerts.len(),
            triggered.len()
        );

        EvaluationOutcome {
            alerts: updated,
            triggered,
        }
    }

    /// The reading that satisfies the alert's condition, if it is met.
    fn trigger_reading(
        kind: &AlertKind,
        snapshot: &MarketSnapshot,
        portfolio_value: f64,
        market_volatility: Option<f64>,
    ) -> Option<f64> {
        match kind {
            AlertKind::PriceAbove {
                coin, target_price, ..
            } => snapshot.price(coin).filter(|price| *price >= *target_price),
            AlertKind::PriceBelow {
                coin, target_price, ..
            } => snapshot.price(coin).filter(|price| *price <= *target_price),
            AlertKind::PortfolioMilestone { target_value, .. } => {
                Some(portfolio_value).filter(|value| *value >= *target_value)
            }
            AlertKind::PortfolioDrop { target_value, .. } => {
                Some(portfolio_value).filter(|value| *value <= *target_value)
            }
            AlertKind::MarketVolatility {
                volatility_threshold,
                ..
            } => market_volatility.filter(|avg| *avg >= *volatility_threshold),
        }
    }

    // ── User transitions ────────────────────────────────────────────

    /// Flip `enabled` on one alert. Re-enabling makes it active again (with
    /// any previous trigger cleared); disabling marks it disabled.
    pub fn toggle(&self, alerts: &[Alert], alert_id: &str) -> Vec<Alert> {
        alerts
            .iter()
            .map(|alert| {
                if alert.id != alert_id {
                    return alert.clone();
                }
                let mut toggled = alert.clone();
                toggled.enabled = !alert.enabled;
                if toggled.enabled {
                    toggled.status = AlertStatus::Active;
                    toggled.triggered_at = None;
                    toggled.kind.set_triggered_reading(None);
                } else {
                    toggled.status = AlertStatus::Disabled;
                }
                toggled
            })
            .collect()
    }

    /// Re-arm a triggered alert. Alerts in any other status are left as they are.
    pub fn reset(&self, alerts: &[Alert], alert_id: &str) -> Vec<Alert> {
        alerts
            .iter()
            .map(|alert| {
                if alert.id != alert_id || !alert.is_triggered() {
                    return alert.clone();
                }
                let mut reset = alert.clone();
                reset.status = AlertStatus::Active;
                reset.triggered_at = None;
                reset.kind.set_triggered_reading(None);
                reset
            })
            .collect()
    }

    /// Remove one alert; the rest keep their order.
    pub fn delete(&self, alerts: &[Alert], alert_id: &str) -> Vec<Alert> {
        alerts
            .iter()
            .filter(|alert| alert.id != alert_id)
            .cloned()
            .collect()
    }

    // ── Creation & validation ───────────────────────────────────────

    /// Check a draft before it is turned into an alert. Never mutates anything.
    pub fn validate_alert(&self, draft: &AlertDraft) -> AlertValidation {
        let Ok(alert_type) = draft.alert_type.parse::<AlertType>() else {
            return AlertValidation::invalid("Invalid alert type");
        };

        if alert_type.is_price() {
            let has_coin = draft
                .coin
                .as_deref()
                .is_some_and(|c| !c.trim().is_empty());
            if !has_coin {
                return AlertValidation::invalid("Coin symbol is required for price alerts");
            }
            if !is_positive(draft.target_price) {
                return AlertValidation::invalid("Valid target price is required");
            }
        }

        if alert_type.is_portfolio() && !is_positive(draft.target_value) {
            return AlertValidation::invalid("Valid target value is required");
        }

        if alert_type == AlertType::MarketVolatility && !is_positive(draft.volatility_threshold) {
            return AlertValidation::invalid("Valid volatility threshold is required");
        }

        AlertValidation::ok()
    }

    /// Validate a draft and build a fresh active alert from it.
    pub fn create_alert(&self, draft: &AlertDraft) -> Result<Alert, CoreError> {
        let validation = self.validate_alert(draft);
        if !validation.valid {
            return Err(CoreError::ValidationError(
                validation.error.unwrap_or_else(|| "Invalid alert".into()),
            ));
        }

        let alert_type: AlertType = draft
            .alert_type
            .parse()
            .map_err(CoreError::ValidationError)?;

        // Validation guarantees the fields read below are present.
        let coin = normalize_symbol(draft.coin.as_deref().unwrap_or_default());
        let target_price = draft.target_price.unwrap_or_default();
        let target_value = draft.target_value.unwrap_or_default();

        let (kind, metadata) = match alert_type {
            AlertType::PriceAbove | AlertType::PriceBelow => {
                let direction = if alert_type == AlertType::PriceAbove {
                    "rises above"
                } else {
                    "falls below"
                };
                let metadata = AlertMetadata {
                    title: format!("{} Price Alert", coin.to_uppercase()),
                    description: format!(
                        "Alert when {} {direction} ${}",
                        coin.to_uppercase(),
                        format_amount(target_price)
                    ),
                };
                let kind = if alert_type == AlertType::PriceAbove {
                    AlertKind::PriceAbove {
                        coin,
                        target_price,
                        triggered_price: None,
                    }
                } else {
                    AlertKind::PriceBelow {
                        coin,
                        target_price,
                        triggered_price: None,
                    }
                };
                (kind, metadata)
            }
            AlertType::PortfolioMilestone => (
                AlertKind::PortfolioMilestone {
                    target_value,
                    triggered_value: None,
                },
                AlertMetadata {
                    title: "Portfolio Milestone".into(),
                    description: format!(
                        "Alert when portfolio reaches ${}",
                        format_amount(target_value)
                    ),
                },
            ),
            AlertType::PortfolioDrop => (
                AlertKind::PortfolioDrop {
                    target_value,
                    triggered_value: None,
                },
                AlertMetadata {
                    title: "Portfolio Milestone".into(),
                    description: format!(
                        "Alert when portfolio drops below ${}",
                        format_amount(target_value)
                    ),
                },
            ),
            AlertType::MarketVolatility => {
                let volatility_threshold = draft.volatility_threshold.unwrap_or_default();
                let timeframe = draft
                    .timeframe
                    .clone()
                    .filter(|t| !t.trim().is_empty())
                    .unwrap_or_else(|| DEFAULT_TIMEFRAME.to_string());
                let metadata = AlertMetadata {
                    title: "Market Volatility Alert".into(),
                    description: format!(
                        "Alert when market volatility exceeds {volatility_threshold}% in {timeframe}"
                    ),
                };
                (
                    AlertKind::MarketVolatility {
                        volatility_threshold,
                        timeframe,
                        triggered_volatility: None,
                    },
                    metadata,
                )
            }
        };

        Ok(Alert::new(kind, metadata))
    }

    // ── Queries ─────────────────────────────────────────────────────

    pub fn alerts_by_status<'a>(&self, alerts: &'a [Alert], status: AlertStatus) -> Vec<&'a Alert> {
        alerts.iter().filter(|a| a.status == status).collect()
    }

    pub fn alerts_by_type<'a>(&self, alerts: &'a [Alert], alert_type: AlertType) -> Vec<&'a Alert> {
        alerts.iter().filter(|a| a.alert_type() == alert_type).collect()
    }

    /// Number of alerts that will take part in the next evaluation.
    pub fn active_count(&self, alerts: &[Alert]) -> usize {
        alerts.iter().filter(|a| a.is_armed()).count()
    }
}

impl Default for AlertService {
    fn default() -> Self {
        Self::new()
    }
}

fn is_positive(value: Option<f64>) -> bool {
    value.is_some_and(|v| v.is_finite() && v > 0.0)
}
