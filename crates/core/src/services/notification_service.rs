use crate::models::alert::{Alert, AlertKind};
use crate::models::notification::{Notification, NotificationKind, PriceCondition};

/// Placeholder used when a triggered alert has no captured reading.
const MISSING_READING: &str = "n/a";

/// Maps triggered alerts to notification payloads.
pub struct NotificationService;

impl NotificationService {
    pub fn new() -> Self {
        Self
    }

    /// Build the `{title, message}` payload for a triggered alert, with
    /// amounts prefixed by the display currency's symbol.
    pub fn format_alert_notification(&self, alert: &Alert, currency: &str) -> Notification {
        let cur = currency_symbol(currency);
        let reading = alert.kind.triggered_reading();

        match &alert.kind {
            AlertKind::PriceAbove {
                coin, target_price, ..
            } => Notification {
                kind: NotificationKind::PriceAlert,
                title: format!("{} Price Alert", coin.to_uppercase()),
                message: format!(
                    "{} has risen above your target price of {cur}{}!",
                    coin.to_uppercase(),
                    format_amount(*target_price)
                ),
                coin: Some(coin.clone()),
                condition: Some(PriceCondition::Above),
                target_price: Some(*target_price),
                current_price: reading,
            },
            AlertKind::PriceBelow {
                coin, target_price, ..
            } => Notification {
                kind: NotificationKind::PriceAlert,
                title: format!("{} Price Alert", coin.to_uppercase()),
                message: format!(
                    "{} has fallen below your target price of {cur}{}!",
                    coin.to_uppercase(),
                    format_amount(*target_price)
                ),
                coin: Some(coin.clone()),
                condition: Some(PriceCondition::Below),
                target_price: Some(*target_price),
                current_price: reading,
            },
            AlertKind::PortfolioMilestone { target_value, .. } => Notification {
                kind: NotificationKind::PortfolioMilestone,
                title: "Portfolio Milestone Reached!".into(),
                message: format!(
                    "Your portfolio has reached {cur}{}! Current value: {cur}{}",
                    format_amount(*target_value),
                    reading.map_or_else(|| MISSING_READING.to_string(), format_amount)
                ),
                coin: None,
                condition: None,
                target_price: None,
                current_price: None,
            },
            AlertKind::PortfolioDrop { target_value, .. } => Notification {
                kind: NotificationKind::PortfolioMilestone,
                title: "Portfolio Alert".into(),
                message: format!(
                    "Your portfolio has dropped below {cur}{}. Current value: {cur}{}",
                    format_amount(*target_value),
                    reading.map_or_else(|| MISSING_READING.to_string(), format_amount)
                ),
                coin: None,
                condition: None,
                target_price: None,
                current_price: None,
            },
            AlertKind::MarketVolatility {
                volatility_threshold,
                ..
            } => Notification {
                kind: NotificationKind::MarketAlert,
                title: "High Market Volatility".into(),
                message: format!(
                    "Market volatility has exceeded {volatility_threshold}%. Current average: {}%",
                    reading.map_or_else(|| MISSING_READING.to_string(), |v| format!("{v:.2}"))
                ),
                coin: None,
                condition: None,
                target_price: None,
                current_price: None,
            },
        }
    }

    /// Notifications for a batch of triggered alerts, in order.
    pub fn notifications_for(&self, triggered: &[Alert], currency: &str) -> Vec<Notification> {
        triggered
            .iter()
            .map(|alert| self.format_alert_notification(alert, currency))
            .collect()
    }
}

impl Default for NotificationService {
    fn default() -> Self {
        Self::new()
    }
}

/// `$` for US dollars, otherwise the currency code itself.
pub fn currency_symbol(currency: &str) -> String {
    if currency.eq_ignore_ascii_case("USD") {
        "$".to_string()
    } else {
        currency.to_string()
    }
}

/// Render an amount with comma thousands separators and at most three
/// fraction digits, trailing zeros dropped: `50000.0` → `"50,000"`,
/// `1234.5678` → `"1,234.568"`.
pub fn format_amount(value: f64) -> String {
    if !value.is_finite() {
        return value.to_string();
    }

    let fixed = format!("{:.3}", value.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), ""));
    let frac_part = frac_part.trim_end_matches('0');

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let is_zero = int_part.chars().all(|c| c == '0') && frac_part.is_empty();
    let sign = if value < 0.0 && !is_zero { "-" } else { "" };

    if frac_part.is_empty() {
        format!("{sign}{grouped}")
    } else {
        format!("{sign}{grouped}.{frac_part}")
    }
}
