use serde::{Deserialize, Serialize};

/// Category used by the notification display to pick an icon and colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NotificationKind {
    #[serde(rename = "price-alert")]
    PriceAlert,
    #[serde(rename = "portfolio-milestone")]
    PortfolioMilestone,
    #[serde(rename = "market-alert")]
    MarketAlert,
}

/// Direction of a price alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriceCondition {
    Above,
    Below,
}

/// Payload handed to the notification collaborator for a newly triggered alert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    #[serde(rename = "type")]
    pub kind: NotificationKind,

    pub title: String,

    pub message: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coin: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<PriceCondition>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_price: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_price: Option<f64>,
}
