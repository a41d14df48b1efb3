pub mod errors;
pub mod models;
pub mod providers;
pub mod services;
pub mod storage;

use models::{
    alert::{Alert, AlertDraft, AlertStatus, AlertValidation},
    analytics::PortfolioAnalytics,
    holding::Holding,
    market::MarketSnapshot,
    notification::Notification,
    portfolio::Portfolio,
    settings::{Settings, BASE_CURRENCY},
    valuation::PortfolioValuation,
};
use services::{
    alert_service::AlertService, analytics_service::AnalyticsService,
    holding_service::HoldingService, market_service::MarketService,
    notification_service::NotificationService, valuation_service::ValuationService,
};
use storage::{document::AlertDocument, traits::AlertStore};

use errors::CoreError;

/// Result of one alert-checking cycle.
#[derive(Debug, Clone)]
pub struct CheckOutcome {
    /// Valuation the portfolio alerts were checked against
    pub valuation: PortfolioValuation,

    /// Alerts that fired in this cycle
    pub triggered: Vec<Alert>,

    /// One notification per triggered alert, same order
    pub notifications: Vec<Notification>,

    /// Whether the alert set is durably saved after this cycle
    pub persisted: bool,
}

/// Main entry point for the coinwatch core library.
/// Holds the holdings, the alert set, and the services that operate on them.
///
/// Every method that persists takes `&mut self`, so saves issued by
/// successive cycles can never overlap.
#[must_use]
pub struct CoinTracker {
    portfolio: Portfolio,
    alerts: Vec<Alert>,
    store: Box<dyn AlertStore>,
    holding_service: HoldingService,
    valuation_service: ValuationService,
    analytics_service: AnalyticsService,
    alert_service: AlertService,
    notification_service: NotificationService,
    market_service: MarketService,
    /// Alert set changed since the last successful save.
    dirty: bool,
}

impl std::fmt::Debug for CoinTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoinTracker")
            .field("holdings", &self.portfolio.holdings.len())
            .field("settings", &self.portfolio.settings)
            .field("alerts", &self.alerts.len())
            .field("store", &self.store.name())
            .field("dirty", &self.dirty)
            .finish()
    }
}

impl CoinTracker {
    /// An empty tracker (no holdings, no alerts) backed by `store`.
    pub fn new(store: Box<dyn AlertStore>) -> Self {
        Self::with_portfolio(Portfolio::default(), store)
    }

    /// A tracker over existing holdings/settings, with no alerts loaded yet.
    pub fn with_portfolio(portfolio: Portfolio, store: Box<dyn AlertStore>) -> Self {
        Self {
            portfolio,
            alerts: Vec::new(),
            store,
            holding_service: HoldingService::new(),
            valuation_service: ValuationService::new(),
            analytics_service: AnalyticsService::new(),
            alert_service: AlertService::new(),
            notification_service: NotificationService::new(),
            market_service: MarketService::new_with_defaults(),
            dirty: false,
        }
    }

    /// Create a tracker and load the stored alert set.
    ///
    /// A store that cannot be read is logged and treated as empty.
    pub async fn open(portfolio: Portfolio, store: Box<dyn AlertStore>) -> Self {
        let mut tracker = Self::with_portfolio(portfolio, store);
        if let Err(e) = tracker.reload_alerts().await {
            tracing::warn!("Could not load alerts from {} store: {e}", tracker.store.name());
        }
        tracker
    }

    /// Replace the market data providers.
    pub fn with_market_service(mut self, market_service: MarketService) -> Self {
        self.market_service = market_service;
        self
    }

    /// Re-read the alert set from the store. On failure the in-memory set is kept.
    pub async fn reload_alerts(&mut self) -> Result<(), CoreError> {
        let document = self.store.load().await?;
        tracing::debug!(
            "Loaded {} alerts from {} store",
            document.alerts.len(),
            self.store.name()
        );
        self.alerts = document.alerts;
        self.dirty = false;
        Ok(())
    }

    /// Save the alert set now, reporting failure to the caller.
    /// Clears the unsaved-changes flag on success.
    pub async fn save_alerts(&mut self) -> Result<(), CoreError> {
        let document = AlertDocument::new(self.alerts.clone());
        self.store.save(&document).await?;
        self.dirty = false;
        Ok(())
    }

    /// Best-effort save: failures are logged and retried on the next cycle.
    async fn persist(&mut self) -> bool {
        match self.save_alerts().await {
            Ok(()) => {
                tracing::info!("Saved {} alerts to {} store", self.alerts.len(), self.store.name());
                true
            }
            Err(e) => {
                tracing::warn!(
                    "Failed to save alerts to {} store, will retry next cycle: {e}",
                    self.store.name()
                );
                false
            }
        }
    }

    /// True when the alert set has changes that are not yet saved.
    #[must_use]
    pub fn has_unsaved_changes(&self) -> bool {
        self.dirty
    }

    // ── Holdings ────────────────────────────────────────────────────

    /// Add units of a coin; tops up an existing position at weighted-average cost.
    pub fn add_holding(
        &mut self,
        symbol: &str,
        quantity: f64,
        cost_basis: f64,
    ) -> Result<(), CoreError> {
        self.holding_service
            .add_holding(&mut self.portfolio, Holding::new(symbol, quantity, cost_basis))
    }

    /// Remove a holding entirely.
    pub fn remove_holding(&mut self, symbol: &str) -> Result<Holding, CoreError> {
        self.holding_service
            .remove_holding(&mut self.portfolio, symbol)
    }

    #[must_use]
    pub fn get_holding(&self, symbol: &str) -> Option<&Holding> {
        self.holding_service.get_holding(&self.portfolio, symbol)
    }

    /// All holdings, ordered by symbol.
    #[must_use]
    pub fn get_holdings(&self) -> Vec<&Holding> {
        self.holding_service.get_holdings(&self.portfolio)
    }

    #[must_use]
    pub fn portfolio(&self) -> &Portfolio {
        &self.portfolio
    }

    // ── Settings ────────────────────────────────────────────────────

    /// Change the display currency (e.g., "EUR").
    pub fn set_currency(&mut self, currency: &str) -> Result<(), CoreError> {
        let upper = currency.trim().to_uppercase();
        if upper.is_empty() {
            return Err(CoreError::ValidationError("Currency code is required".into()));
        }
        self.portfolio.settings.currency = upper;
        Ok(())
    }

    /// Set how many units of `currency` one base-currency unit buys.
    pub fn set_exchange_rate(&mut self, currency: &str, rate: f64) -> Result<(), CoreError> {
        if !rate.is_finite() || rate <= 0.0 {
            return Err(CoreError::ValidationError(format!(
                "Exchange rate for {currency} must be a positive number, got {rate}"
            )));
        }
        self.portfolio
            .settings
            .exchange_rates
            .insert(currency.trim().to_uppercase(), rate);
        Ok(())
    }

    #[must_use]
    pub fn get_settings(&self) -> &Settings {
        &self.portfolio.settings
    }

    // ── Valuation & Analytics ───────────────────────────────────────

    /// Value the holdings against `snapshot` in the display currency.
    #[must_use]
    pub fn valuation(&self, snapshot: &MarketSnapshot) -> PortfolioValuation {
        self.valuation_service.compute_valuation(
            &self.portfolio.holdings,
            snapshot,
            self.portfolio.settings.exchange_rate(),
        )
    }

    #[must_use]
    pub fn analytics(&self, snapshot: &MarketSnapshot) -> PortfolioAnalytics {
        self.analytics_service
            .compute_analytics(&self.valuation(snapshot))
    }

    /// Fetch a fresh snapshot for every held coin and every coin with a price alert.
    ///
    /// Prices are always quoted in the base currency; the display currency's
    /// exchange rate is applied later by [`valuation`](Self::valuation).
    pub async fn refresh_market_data(&self) -> Result<MarketSnapshot, CoreError> {
        let mut symbols: Vec<String> = self.portfolio.holdings.keys().cloned().collect();
        for coin in self.alerts.iter().filter_map(|a| a.kind.coin()) {
            if !symbols.iter().any(|s| s == coin) {
                symbols.push(coin.to_string());
            }
        }
        let currency = BASE_CURRENCY.to_lowercase();
        self.market_service.fetch_snapshot(&symbols, &currency).await
    }

    // ── Alerts ──────────────────────────────────────────────────────

    #[must_use]
    pub fn alerts(&self) -> &[Alert] {
        &self.alerts
    }

    #[must_use]
    pub fn get_alert(&self, alert_id: &str) -> Option<&Alert> {
        self.alerts.iter().find(|a| a.id == alert_id)
    }

    #[must_use]
    pub fn get_alerts_by_status(&self, status: AlertStatus) -> Vec<&Alert> {
        self.alert_service.alerts_by_status(&self.alerts, status)
    }

    #[must_use]
    pub fn active_alert_count(&self) -> usize {
        self.alert_service.active_count(&self.alerts)
    }

    /// Check a draft without creating anything.
    #[must_use]
    pub fn validate_alert(&self, draft: &AlertDraft) -> AlertValidation {
        self.alert_service.validate_alert(draft)
    }

    /// Validate and add a new alert, then save. Returns the new alert's id.
    pub async fn create_alert(&mut self, draft: &AlertDraft) -> Result<String, CoreError> {
        let alert = self.alert_service.create_alert(draft)?;
        let id = alert.id.clone();
        self.alerts.push(alert);
        self.dirty = true;
        self.persist().await;
        Ok(id)
    }

    /// Enable a disabled alert or disable an enabled one, then save.
    pub async fn toggle_alert(&mut self, alert_id: &str) -> Result<(), CoreError> {
        self.ensure_alert(alert_id)?;
        self.alerts = self.alert_service.toggle(&self.alerts, alert_id);
        self.dirty = true;
        self.persist().await;
        Ok(())
    }

    /// Re-arm a triggered alert. Returns `false` (and saves nothing) when the
    /// alert was not triggered.
    pub async fn reset_alert(&mut self, alert_id: &str) -> Result<bool, CoreError> {
        self.ensure_alert(alert_id)?;
        let updated = self.alert_service.reset(&self.alerts, alert_id);
        if updated == self.alerts {
            return Ok(false);
        }
        self.alerts = updated;
        self.dirty = true;
        self.persist().await;
        Ok(true)
    }

    /// Delete an alert, then save.
    pub async fn delete_alert(&mut self, alert_id: &str) -> Result<(), CoreError> {
        self.ensure_alert(alert_id)?;
        self.alerts = self.alert_service.delete(&self.alerts, alert_id);
        self.dirty = true;
        self.persist().await;
        Ok(())
    }

    fn ensure_alert(&self, alert_id: &str) -> Result<(), CoreError> {
        if self.get_alert(alert_id).is_some() {
            Ok(())
        } else {
            Err(CoreError::AlertNotFound(alert_id.to_string()))
        }
    }

    /// Run one evaluation cycle against a fresh snapshot.
    ///
    /// Values the portfolio, evaluates every alert, and saves the set if
    /// anything fired or an earlier save is still outstanding. A failed save
    /// keeps the transitions in memory; they are saved on a later cycle.
    pub async fn check_alerts(&mut self, snapshot: &MarketSnapshot) -> CheckOutcome {
        let valuation = self.valuation(snapshot);
        let outcome = self
            .alert_service
            .evaluate(&self.alerts, snapshot, valuation.total_value);

        if outcome.has_changes() {
            self.alerts = outcome.alerts;
            self.dirty = true;
        }

        let persisted = if self.dirty { self.persist().await } else { true };

        let notifications = self
            .notification_service
            .notifications_for(&outcome.triggered, &self.portfolio.settings.currency);

        CheckOutcome {
            valuation,
            triggered: outcome.triggered,
            notifications,
            persisted,
        }
    }
}
