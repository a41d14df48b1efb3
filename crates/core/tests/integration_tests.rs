// ═══════════════════════════════════════════════════════════════════
// Integration Tests: CoinTracker end to end with in-memory stores
// ═══════════════════════════════════════════════════════════════════

use async_trait::async_trait;
use serde_json::json;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use coinwatch_core::errors::CoreError;
use coinwatch_core::models::alert::{AlertDraft, AlertStatus, AlertType};
use coinwatch_core::models::market::{MarketSnapshot, Ticker};
use coinwatch_core::models::notification::NotificationKind;
use coinwatch_core::models::portfolio::Portfolio;
use coinwatch_core::providers::traits::MarketDataProvider;
use coinwatch_core::services::market_service::MarketService;
use coinwatch_core::storage::document::AlertDocument;
use coinwatch_core::storage::memory::MemoryAlertStore;
use coinwatch_core::storage::traits::AlertStore;
use coinwatch_core::CoinTracker;

// ═══════════════════════════════════════════════════════════════════
//  Test doubles
// ═══════════════════════════════════════════════════════════════════

/// Memory store shared with the test, with switchable failures.
#[derive(Clone, Default)]
struct SharedStore {
    inner: Arc<MemoryAlertStore>,
    fail_saves: Arc<AtomicBool>,
    fail_loads: Arc<AtomicBool>,
    saves: Arc<AtomicUsize>,
}

impl SharedStore {
    fn with_json(json: String) -> Self {
        Self {
            inner: Arc::new(MemoryAlertStore::with_json(json)),
            ..Self::default()
        }
    }

    fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    async fn stored(&self) -> AlertDocument {
        self.inner.load().await.unwrap()
    }
}

#[async_trait]
impl AlertStore for SharedStore {
    fn name(&self) -> &str {
        "shared"
    }

    async fn load(&self) -> Result<AlertDocument, CoreError> {
        if self.fail_loads.load(Ordering::SeqCst) {
            return Err(CoreError::Storage("load refused".into()));
        }
        self.inner.load().await
    }

    async fn save(&self, document: &AlertDocument) -> Result<(), CoreError> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(CoreError::Storage("save refused".into()));
        }
        self.saves.fetch_add(1, Ordering::SeqCst);
        self.inner.save(document).await
    }
}

/// Records the symbols it was asked for and answers with a fixed snapshot.
struct RecordingProvider {
    requested: Arc<Mutex<Vec<String>>>,
    snapshot: MarketSnapshot,
}

#[async_trait]
impl MarketDataProvider for RecordingProvider {
    fn name(&self) -> &str {
        "recording"
    }

    async fn fetch_snapshot(
        &self,
        symbols: &[String],
        _currency: &str,
    ) -> Result<MarketSnapshot, CoreError> {
        self.requested.lock().unwrap().extend(symbols.iter().cloned());
        Ok(self.snapshot.clone())
    }
}

/// Quotes BTC at 100 in `usd` and 50 in any other currency.
struct QuotingProvider {
    currencies: Arc<Mutex<Vec<String>>>,
}

#[async_trait]
impl MarketDataProvider for QuotingProvider {
    fn name(&self) -> &str {
        "quoting"
    }

    async fn fetch_snapshot(
        &self,
        _symbols: &[String],
        currency: &str,
    ) -> Result<MarketSnapshot, CoreError> {
        self.currencies.lock().unwrap().push(currency.to_string());
        let price = if currency == "usd" { 100.0 } else { 50.0 };
        Ok(MarketSnapshot::new().with_ticker("btc", Ticker::new(price)))
    }
}

async fn tracker_with(store: &SharedStore) -> CoinTracker {
    CoinTracker::open(Portfolio::default(), Box::new(store.clone())).await
}

fn btc_at(price: f64) -> MarketSnapshot {
    MarketSnapshot::new().with_ticker("btc", Ticker::new(price))
}

// ═══════════════════════════════════════════════════════════════════
//  Loading
// ═══════════════════════════════════════════════════════════════════

mod loading {
    use super::*;

    #[tokio::test]
    async fn opens_legacy_document() {
        let store = SharedStore::with_json(
            json!({
                "priceAlerts": [{
                    "id": "legacy_1",
                    "type": "price_above",
                    "coin": "btc",
                    "targetPrice": 50000,
                    "status": "active",
                    "createdAt": "2024-01-01T00:00:00Z"
                }]
            })
            .to_string(),
        );
        let tracker = tracker_with(&store).await;

        assert_eq!(tracker.alerts().len(), 1);
        assert!(tracker.get_alert("legacy_1").unwrap().enabled);
        assert!(!tracker.has_unsaved_changes());
    }

    #[tokio::test]
    async fn unreadable_store_opens_empty() {
        let store = SharedStore::default();
        store.fail_loads.store(true, Ordering::SeqCst);
        let tracker = tracker_with(&store).await;
        assert!(tracker.alerts().is_empty());
    }

    #[tokio::test]
    async fn reload_failure_keeps_current_alerts() {
        let store = SharedStore::default();
        let mut tracker = tracker_with(&store).await;
        tracker
            .create_alert(&AlertDraft::portfolio(AlertType::PortfolioMilestone, 10.0))
            .await
            .unwrap();

        store.fail_loads.store(true, Ordering::SeqCst);
        assert!(tracker.reload_alerts().await.is_err());
        assert_eq!(tracker.alerts().len(), 1);
    }
}

// ═══════════════════════════════════════════════════════════════════
//  Alert management
// ═══════════════════════════════════════════════════════════════════

mod management {
    use super::*;

    #[tokio::test]
    async fn create_persists_immediately() {
        let store = SharedStore::default();
        let mut tracker = tracker_with(&store).await;

        let id = tracker
            .create_alert(&AlertDraft::price(AlertType::PriceAbove, "BTC", 50000.0))
            .await
            .unwrap();

        assert_eq!(store.save_count(), 1);
        let stored = store.stored().await;
        assert_eq!(stored.alerts.len(), 1);
        assert_eq!(stored.alerts[0].id, id);
        assert_eq!(stored.alerts[0].kind.coin(), Some("btc"));

        let reopened = tracker_with(&store).await;
        assert_eq!(reopened.alerts(), tracker.alerts());
    }

    #[tokio::test]
    async fn create_rejects_invalid_draft() {
        let store = SharedStore::default();
        let mut tracker = tracker_with(&store).await;

        let draft = AlertDraft::price(AlertType::PriceAbove, "", 100.0);
        assert!(!tracker.validate_alert(&draft).valid);
        let result = tracker.create_alert(&draft).await;
        assert!(matches!(result, Err(CoreError::ValidationError(_))));
        assert!(tracker.alerts().is_empty());
        assert_eq!(store.save_count(), 0);
    }

    #[tokio::test]
    async fn toggle_reset_delete() {
        let store = SharedStore::default();
        let mut tracker = tracker_with(&store).await;
        let id = tracker
            .create_alert(&AlertDraft::price(AlertType::PriceAbove, "btc", 100.0))
            .await
            .unwrap();

        // Not triggered yet: reset does nothing
        assert!(!tracker.reset_alert(&id).await.unwrap());
        assert_eq!(store.save_count(), 1);

        tracker.toggle_alert(&id).await.unwrap();
        assert_eq!(tracker.get_alert(&id).unwrap().status, AlertStatus::Disabled);
        assert_eq!(tracker.active_alert_count(), 0);

        tracker.toggle_alert(&id).await.unwrap();
        assert_eq!(tracker.active_alert_count(), 1);

        tracker.check_alerts(&btc_at(150.0)).await;
        assert!(tracker.reset_alert(&id).await.unwrap());
        assert_eq!(tracker.get_alert(&id).unwrap().status, AlertStatus::Active);

        tracker.delete_alert(&id).await.unwrap();
        assert!(tracker.alerts().is_empty());
        assert!(store.stored().await.alerts.is_empty());
    }

    #[tokio::test]
    async fn unknown_alert_id_is_an_error() {
        let store = SharedStore::default();
        let mut tracker = tracker_with(&store).await;

        for result in [
            tracker.toggle_alert("nope").await,
            tracker.delete_alert("nope").await,
        ] {
            match result {
                Err(CoreError::AlertNotFound(id)) => assert_eq!(id, "nope"),
                other => panic!("expected AlertNotFound, got {other:?}"),
            }
        }
        assert!(matches!(
            tracker.reset_alert("nope").await,
            Err(CoreError::AlertNotFound(_))
        ));
    }
}

// ═══════════════════════════════════════════════════════════════════
//  Evaluation cycle
// ═══════════════════════════════════════════════════════════════════

mod cycle {
    use super::*;

    #[tokio::test]
    async fn triggers_notifies_and_saves() {
        let store = SharedStore::default();
        let mut tracker = tracker_with(&store).await;
        tracker.add_holding("btc", 1.0, 40000.0).unwrap();
        tracker
            .create_alert(&AlertDraft::price(AlertType::PriceAbove, "btc", 50000.0))
            .await
            .unwrap();
        tracker
            .create_alert(&AlertDraft::portfolio(AlertType::PortfolioMilestone, 45000.0))
            .await
            .unwrap();
        let saves_before = store.save_count();

        let outcome = tracker.check_alerts(&btc_at(51000.0)).await;

        assert_eq!(outcome.valuation.total_value, 51000.0);
        assert_eq!(outcome.triggered.len(), 2);
        assert_eq!(outcome.notifications.len(), 2);
        assert_eq!(outcome.notifications[0].kind, NotificationKind::PriceAlert);
        assert_eq!(
            outcome.notifications[0].message,
            "BTC has risen above your target price of $50,000!"
        );
        assert_eq!(
            outcome.notifications[1].message,
            "Your portfolio has reached $45,000! Current value: $51,000"
        );
        assert!(outcome.persisted);
        assert_eq!(store.save_count(), saves_before + 1);

        let stored = store.stored().await;
        assert!(stored.alerts.iter().all(|a| a.status == AlertStatus::Triggered));
    }

    #[tokio::test]
    async fn quiet_cycle_does_not_save() {
        let store = SharedStore::default();
        let mut tracker = tracker_with(&store).await;
        tracker
            .create_alert(&AlertDraft::price(AlertType::PriceAbove, "btc", 50000.0))
            .await
            .unwrap();
        let saves_before = store.save_count();

        let outcome = tracker.check_alerts(&btc_at(49000.0)).await;
        assert!(outcome.triggered.is_empty());
        assert!(outcome.notifications.is_empty());
        assert!(outcome.persisted);
        assert_eq!(store.save_count(), saves_before);
    }

    #[tokio::test]
    async fn triggered_alert_fires_once() {
        let store = SharedStore::default();
        let mut tracker = tracker_with(&store).await;
        tracker
            .create_alert(&AlertDraft::price(AlertType::PriceBelow, "btc", 30000.0))
            .await
            .unwrap();

        assert_eq!(tracker.check_alerts(&btc_at(29000.0)).await.triggered.len(), 1);
        assert!(tracker.check_alerts(&btc_at(28000.0)).await.triggered.is_empty());
        assert_eq!(tracker.get_alerts_by_status(AlertStatus::Triggered).len(), 1);
    }

    #[tokio::test]
    async fn failed_save_is_retried_next_cycle() {
        let store = SharedStore::default();
        let mut tracker = tracker_with(&store).await;
        let id = tracker
            .create_alert(&AlertDraft::price(AlertType::PriceAbove, "btc", 50000.0))
            .await
            .unwrap();

        store.fail_saves.store(true, Ordering::SeqCst);
        let outcome = tracker.check_alerts(&btc_at(51000.0)).await;
        assert_eq!(outcome.triggered.len(), 1);
        assert!(!outcome.persisted);
        assert!(tracker.has_unsaved_changes());
        assert_eq!(tracker.get_alert(&id).unwrap().status, AlertStatus::Triggered);
        assert_eq!(store.stored().await.alerts[0].status, AlertStatus::Active);

        store.fail_saves.store(false, Ordering::SeqCst);
        let outcome = tracker.check_alerts(&btc_at(52000.0)).await;
        assert!(outcome.triggered.is_empty());
        assert!(outcome.persisted);
        assert!(!tracker.has_unsaved_changes());
        assert_eq!(store.stored().await.alerts[0].status, AlertStatus::Triggered);
    }

    #[tokio::test]
    async fn failed_save_on_create_keeps_alert() {
        let store = SharedStore::default();
        store.fail_saves.store(true, Ordering::SeqCst);
        let mut tracker = tracker_with(&store).await;

        tracker
            .create_alert(&AlertDraft::portfolio(AlertType::PortfolioDrop, 100.0))
            .await
            .unwrap();
        assert_eq!(tracker.alerts().len(), 1);
        assert!(tracker.has_unsaved_changes());
        assert!(tracker.save_alerts().await.is_err());

        store.fail_saves.store(false, Ordering::SeqCst);
        tracker.save_alerts().await.unwrap();
        assert!(!tracker.has_unsaved_changes());
        assert_eq!(store.stored().await.alerts.len(), 1);
    }

    #[tokio::test]
    async fn display_currency_flows_through() {
        let store = SharedStore::default();
        let mut tracker = tracker_with(&store).await;
        tracker.add_holding("btc", 2.0, 10000.0).unwrap();
        tracker.set_exchange_rate("eur", 0.5).unwrap();
        tracker.set_currency("eur").unwrap();
        tracker
            .create_alert(&AlertDraft::portfolio(AlertType::PortfolioMilestone, 40000.0))
            .await
            .unwrap();

        let outcome = tracker.check_alerts(&btc_at(50000.0)).await;
        assert_eq!(tracker.get_settings().currency, "EUR");
        assert_eq!(outcome.valuation.total_value, 50000.0);
        assert_eq!(outcome.valuation.total_basis, 10000.0);
        assert_eq!(
            outcome.notifications[0].message,
            "Your portfolio has reached EUR40,000! Current value: EUR50,000"
        );
    }

    #[tokio::test]
    async fn bad_settings_are_rejected() {
        let store = SharedStore::default();
        let mut tracker = tracker_with(&store).await;
        assert!(matches!(
            tracker.set_exchange_rate("EUR", -1.0),
            Err(CoreError::ValidationError(_))
        ));
        assert!(matches!(
            tracker.set_currency(" "),
            Err(CoreError::ValidationError(_))
        ));
        assert_eq!(tracker.get_settings().currency, "USD");
    }
}

// ═══════════════════════════════════════════════════════════════════
//  Holdings, analytics and market refresh
// ═══════════════════════════════════════════════════════════════════

mod portfolio {
    use super::*;

    #[tokio::test]
    async fn holdings_and_analytics() {
        let store = SharedStore::default();
        let mut tracker = tracker_with(&store).await;
        tracker.add_holding("ETH", 10.0, 100.0).unwrap();
        tracker.add_holding("eth", 10.0, 300.0).unwrap();
        tracker.add_holding("btc", 1.0, 20000.0).unwrap();

        let eth = tracker.get_holding("eth").unwrap();
        assert_eq!(eth.quantity, 20.0);
        assert_eq!(eth.cost_basis, 200.0);
        assert_eq!(tracker.get_holdings().len(), 2);

        let market = MarketSnapshot::new()
            .with_ticker("btc", Ticker::new(30000.0).with_change(12.0))
            .with_ticker("eth", Ticker::new(250.0).with_change(-12.0));
        let analytics = tracker.analytics(&market);
        assert_eq!(analytics.best_performer.unwrap().symbol, "btc");
        assert_eq!(analytics.volatility, 12.0);

        tracker.remove_holding("BTC").unwrap();
        assert!(matches!(
            tracker.remove_holding("btc"),
            Err(CoreError::HoldingNotFound(_))
        ));
        assert_eq!(tracker.portfolio().holdings.len(), 1);
    }

    #[tokio::test]
    async fn refresh_asks_for_holdings_and_alert_coins() {
        let requested = Arc::new(Mutex::new(Vec::new()));
        let mut market_service = MarketService::new();
        market_service.register(Box::new(RecordingProvider {
            requested: requested.clone(),
            snapshot: btc_at(10.0),
        }));

        let store = SharedStore::default();
        let mut tracker = tracker_with(&store).await.with_market_service(market_service);
        tracker.add_holding("btc", 1.0, 1.0).unwrap();
        tracker
            .create_alert(&AlertDraft::price(AlertType::PriceBelow, "SOL", 5.0))
            .await
            .unwrap();
        tracker
            .create_alert(&AlertDraft::price(AlertType::PriceAbove, "btc", 5.0))
            .await
            .unwrap();

        let snapshot = tracker.refresh_market_data().await.unwrap();
        assert_eq!(snapshot.price("btc"), Some(10.0));

        let mut asked = requested.lock().unwrap().clone();
        asked.sort();
        assert_eq!(asked, vec!["btc".to_string(), "sol".to_string()]);
    }

    #[tokio::test]
    async fn refresh_quotes_in_base_currency_for_other_display_currency() {
        let currencies = Arc::new(Mutex::new(Vec::new()));
        let mut market_service = MarketService::new();
        market_service.register(Box::new(QuotingProvider {
            currencies: currencies.clone(),
        }));

        let store = SharedStore::default();
        let mut tracker = tracker_with(&store).await.with_market_service(market_service);
        tracker.add_holding("btc", 1.0, 100.0).unwrap();
        tracker.set_exchange_rate("EUR", 0.5).unwrap();
        tracker.set_currency("EUR").unwrap();
        tracker
            .create_alert(&AlertDraft::portfolio(AlertType::PortfolioMilestone, 50.0))
            .await
            .unwrap();

        let snapshot = tracker.refresh_market_data().await.unwrap();
        assert_eq!(*currencies.lock().unwrap(), vec!["usd".to_string()]);

        let valuation = tracker.valuation(&snapshot);
        assert_eq!(valuation.total_value, 50.0);
        assert_eq!(valuation.total_basis, 50.0);

        let outcome = tracker.check_alerts(&snapshot).await;
        assert_eq!(outcome.triggered.len(), 1);
        assert_eq!(
            outcome.notifications[0].message,
            "Your portfolio has reached EUR50! Current value: EUR50"
        );
    }
}
