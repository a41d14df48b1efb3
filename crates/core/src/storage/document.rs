use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::CoreError;
use crate::models::alert::Alert;

/// Version written into every saved alert document.
pub const CURRENT_VERSION: &str = "1.0";

/// Major version this crate can read.
const SUPPORTED_MAJOR: &str = "1";

/// The persisted alert set.
///
/// ```text
/// { "alerts": [Alert, ...], "lastUpdated": "<ISO-8601>", "version": "1.0" }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertDocument {
    pub alerts: Vec<Alert>,
    pub last_updated: DateTime<Utc>,
    pub version: String,
}

impl AlertDocument {
    /// Wrap an alert set for saving, stamped with the current time.
    pub fn new(alerts: Vec<Alert>) -> Self {
        Self {
            alerts,
            last_updated: Utc::now(),
            version: CURRENT_VERSION.to_string(),
        }
    }

    /// A document with no alerts (what a first-time user loads).
    pub fn empty() -> Self {
        Self {
            alerts: Vec::new(),
            last_updated: DateTime::<Utc>::default(),
            version: CURRENT_VERSION.to_string(),
        }
    }
}

/// Serialize a document to JSON.
pub fn to_json(document: &AlertDocument) -> Result<String, CoreError> {
    serde_json::to_string(document)
        .map_err(|e| CoreError::Serialization(format!("Failed to serialize alerts: {e}")))
}

/// Parse a stored alert document.
///
/// Accepts the current shape and the legacy one where alerts live under
/// `priceAlerts` (either an array or an object of alerts). A missing or
/// null `alerts` falls back to `priceAlerts`; neither present means no
/// alerts. Individual entries that cannot be read are skipped.
pub fn parse_document(json: &str) -> Result<AlertDocument, CoreError> {
    let root: Value = serde_json::from_str(json)?;
    let Value::Object(obj) = root else {
        return Err(CoreError::InvalidDocument(
            "Alert document must be a JSON object".into(),
        ));
    };

    let version = match obj.get("version") {
        Some(Value::String(v)) => v.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => CURRENT_VERSION.to_string(),
    };
    let major = version.split('.').next().unwrap_or_default().trim();
    if major != SUPPORTED_MAJOR {
        return Err(CoreError::UnsupportedVersion(version));
    }

    let last_updated = obj
        .get("lastUpdated")
        .and_then(Value::as_str)
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_default();

    let raw_alerts = [obj.get("alerts"), obj.get("priceAlerts")]
        .into_iter()
        .flatten()
        .find(|v| !v.is_null());

    let entries: Vec<Value> = match raw_alerts {
        None => Vec::new(),
        Some(Value::Array(items)) => items.clone(),
        Some(Value::Object(items)) => items.values().cloned().collect(),
        Some(other) => {
            return Err(CoreError::InvalidDocument(format!(
                "Expected a list of alerts, found {other}"
            )))
        }
    };

    let total = entries.len();
    let alerts: Vec<Alert> = entries
        .into_iter()
        .filter_map(|entry| match serde_json::from_value::<Alert>(entry) {
            Ok(alert) => Some(alert),
            Err(e) => {
                tracing::warn!("Skipping unreadable alert entry: {e}");
                None
            }
        })
        .collect();

    if alerts.len() < total {
        tracing::debug!("Loaded {} of {total} stored alerts", alerts.len());
    }

    Ok(AlertDocument {
        alerts,
        last_updated,
        version,
    })
}
