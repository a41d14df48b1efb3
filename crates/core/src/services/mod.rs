pub mod alert_service;
pub mod analytics_service;
pub mod holding_service;
pub mod market_service;
pub mod notification_service;
pub mod valuation_service;
