// ═══════════════════════════════════════════════════════════════════
// Storage Tests: alert document parsing, memory store, JSON file store
// ═══════════════════════════════════════════════════════════════════

use chrono::{TimeZone, Utc};
use serde_json::json;
use tempfile::TempDir;

use coinwatch_core::errors::CoreError;
use coinwatch_core::models::alert::{Alert, AlertKind, AlertMetadata, AlertStatus, AlertType};
use coinwatch_core::storage::document::{parse_document, to_json, AlertDocument, CURRENT_VERSION};
use coinwatch_core::storage::file::{JsonFileAlertStore, DEFAULT_FILE_NAME};
use coinwatch_core::storage::memory::MemoryAlertStore;
use coinwatch_core::storage::traits::AlertStore;

fn sample_alerts() -> Vec<Alert> {
    vec![
        Alert::new(
            AlertKind::PriceAbove {
                coin: "btc".into(),
                target_price: 50000.0,
                triggered_price: None,
            },
            AlertMetadata {
                title: "BTC Price Alert".into(),
                description: "Alert when BTC rises above $50,000".into(),
            },
        ),
        Alert::new(
            AlertKind::MarketVolatility {
                volatility_threshold: 15.0,
                timeframe: "24h".into(),
                triggered_volatility: None,
            },
            AlertMetadata::default(),
        ),
    ]
}

fn stored_alert(id: &str, alert_type: &str) -> serde_json::Value {
    json!({
        "id": id,
        "type": alert_type,
        "coin": "eth",
        "targetPrice": 2000,
        "enabled": true,
        "status": "active",
        "createdAt": "2024-01-01T00:00:00.000Z",
        "triggeredAt": null,
        "metadata": { "title": "ETH Price Alert", "description": "" }
    })
}

// ═══════════════════════════════════════════════════════════════════
//  Document parsing
// ═══════════════════════════════════════════════════════════════════

mod document {
    use super::*;

    #[test]
    fn current_document_round_trips() {
        let mut doc = AlertDocument::new(sample_alerts());
        doc.last_updated = Utc.with_ymd_and_hms(2025, 2, 3, 4, 5, 6).unwrap();

        let json = to_json(&doc).unwrap();
        let parsed = parse_document(&json).unwrap();
        assert_eq!(parsed, doc);
        assert_eq!(parsed.version, CURRENT_VERSION);
    }

    #[test]
    fn written_shape_uses_camel_case_keys() {
        let doc = AlertDocument::new(sample_alerts());
        let value: serde_json::Value = serde_json::from_str(&to_json(&doc).unwrap()).unwrap();
        assert!(value["alerts"].is_array());
        assert!(value["lastUpdated"].is_string());
        assert_eq!(value["version"], "1.0");
        assert_eq!(value["alerts"][0]["type"], "price_above");
    }

    #[test]
    fn legacy_price_alerts_array() {
        let raw = json!({ "priceAlerts": [stored_alert("a1", "price_below")] }).to_string();
        let doc = parse_document(&raw).unwrap();
        assert_eq!(doc.alerts.len(), 1);
        assert_eq!(doc.alerts[0].id, "a1");
        assert_eq!(doc.alerts[0].alert_type(), AlertType::PriceBelow);
        assert_eq!(doc.version, CURRENT_VERSION);
    }

    #[test]
    fn legacy_price_alerts_object() {
        let raw = json!({
            "priceAlerts": {
                "a1": stored_alert("a1", "price_above"),
                "a2": stored_alert("a2", "price_below")
            }
        })
        .to_string();
        let doc = parse_document(&raw).unwrap();
        assert_eq!(doc.alerts.len(), 2);
    }

    #[test]
    fn null_alerts_fall_back_to_legacy_key() {
        let raw = json!({
            "alerts": null,
            "priceAlerts": [stored_alert("a1", "price_above")],
            "version": "1.0"
        })
        .to_string();
        assert_eq!(parse_document(&raw).unwrap().alerts.len(), 1);
    }

    #[test]
    fn no_alerts_at_all_is_empty() {
        let doc = parse_document("{}").unwrap();
        assert!(doc.alerts.is_empty());
    }

    #[test]
    fn unreadable_entries_are_skipped() {
        let raw = json!({
            "alerts": [
                stored_alert("good", "price_above"),
                stored_alert("unknown", "coin_volume"),
                { "id": "broken" },
                42
            ],
            "version": "1.0"
        })
        .to_string();
        let doc = parse_document(&raw).unwrap();
        assert_eq!(doc.alerts.len(), 1);
        assert_eq!(doc.alerts[0].id, "good");
    }

    #[test]
    fn minor_version_bump_is_accepted() {
        let raw = json!({ "alerts": [], "version": "1.7" }).to_string();
        assert_eq!(parse_document(&raw).unwrap().version, "1.7");
    }

    #[test]
    fn unknown_major_version_is_rejected() {
        let raw = json!({ "alerts": [], "version": "2.0" }).to_string();
        match parse_document(&raw) {
            Err(CoreError::UnsupportedVersion(v)) => assert_eq!(v, "2.0"),
            other => panic!("expected UnsupportedVersion, got {other:?}"),
        }
    }

    #[test]
    fn malformed_json_is_an_error() {
        assert!(matches!(
            parse_document("{not json"),
            Err(CoreError::Deserialization(_))
        ));
        assert!(matches!(
            parse_document("[]"),
            Err(CoreError::InvalidDocument(_))
        ));
        assert!(matches!(
            parse_document(r#"{"alerts": "nope"}"#),
            Err(CoreError::InvalidDocument(_))
        ));
    }

    #[test]
    fn triggered_fields_survive_parsing() {
        let raw = json!({
            "alerts": [{
                "id": "t1",
                "type": "portfolio_milestone",
                "targetValue": 10000,
                "enabled": true,
                "status": "triggered",
                "createdAt": "2024-01-01T00:00:00Z",
                "triggeredAt": "2024-01-05T12:00:00Z",
                "triggeredValue": 10250.75
            }],
            "lastUpdated": "2024-01-05T12:00:01Z",
            "version": "1.0"
        })
        .to_string();
        let doc = parse_document(&raw).unwrap();
        let alert = &doc.alerts[0];
        assert_eq!(alert.status, AlertStatus::Triggered);
        assert_eq!(alert.kind.triggered_reading(), Some(10250.75));
        assert_eq!(
            doc.last_updated,
            Utc.with_ymd_and_hms(2024, 1, 5, 12, 0, 1).unwrap()
        );
    }
}

// ═══════════════════════════════════════════════════════════════════
//  Memory store
// ═══════════════════════════════════════════════════════════════════

mod memory_store {
    use super::*;

    #[tokio::test]
    async fn empty_store_loads_empty_document() {
        let store = MemoryAlertStore::new();
        let doc = store.load().await.unwrap();
        assert!(doc.alerts.is_empty());
        assert!(store.raw().is_none());
    }

    #[tokio::test]
    async fn save_then_load() {
        let store = MemoryAlertStore::new();
        let alerts = sample_alerts();
        store.save(&AlertDocument::new(alerts.clone())).await.unwrap();

        assert!(store.raw().unwrap().contains("\"version\":\"1.0\""));
        assert_eq!(store.load().await.unwrap().alerts, alerts);
    }

    #[tokio::test]
    async fn loads_legacy_blob() {
        let store = MemoryAlertStore::with_json(
            json!({ "priceAlerts": [stored_alert("legacy", "price_above")] }).to_string(),
        );
        let doc = store.load().await.unwrap();
        assert_eq!(doc.alerts[0].id, "legacy");
    }
}

// ═══════════════════════════════════════════════════════════════════
//  JSON file store
// ═══════════════════════════════════════════════════════════════════

mod file_store {
    use super::*;

    #[tokio::test]
    async fn missing_file_loads_empty_document() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileAlertStore::in_dir(dir.path());
        assert!(store.path().ends_with(DEFAULT_FILE_NAME));
        assert!(store.load().await.unwrap().alerts.is_empty());
    }

    #[tokio::test]
    async fn save_then_load() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileAlertStore::in_dir(dir.path());
        let alerts = sample_alerts();

        store.save(&AlertDocument::new(alerts.clone())).await.unwrap();
        assert!(store.path().exists());

        let reloaded = JsonFileAlertStore::new(store.path()).load().await.unwrap();
        assert_eq!(reloaded.alerts, alerts);
    }

    #[tokio::test]
    async fn save_replaces_previous_document() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileAlertStore::in_dir(dir.path());
        let alerts = sample_alerts();

        store.save(&AlertDocument::new(alerts.clone())).await.unwrap();
        store
            .save(&AlertDocument::new(alerts[..1].to_vec()))
            .await
            .unwrap();

        assert_eq!(store.load().await.unwrap().alerts.len(), 1);
        let leftovers: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(leftovers.len(), 1);
    }

    #[tokio::test]
    async fn corrupt_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileAlertStore::in_dir(dir.path());
        std::fs::write(store.path(), "{{{").unwrap();
        assert!(store.load().await.is_err());
    }

    #[tokio::test]
    async fn unwritable_location_is_an_error() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileAlertStore::new(dir.path().join("missing").join("alerts.json"));
        let result = store.save(&AlertDocument::new(sample_alerts())).await;
        assert!(matches!(result, Err(CoreError::FileIO(_))));
    }
}
