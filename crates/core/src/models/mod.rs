pub mod alert;
pub mod analytics;
pub mod holding;
pub mod market;
pub mod notification;
pub mod portfolio;
pub mod settings;
pub mod valuation;
