use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::holding::Holding;
use super::settings::Settings;

/// The user's holdings plus display settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Portfolio {
    /// Holdings keyed by lowercase symbol
    #[serde(default)]
    pub holdings: BTreeMap<String, Holding>,

    #[serde(default)]
    pub settings: Settings,
}
