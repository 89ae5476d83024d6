use serde::Deserialize;

use crate::calc::weights::WeightTable;
use crate::config::EngineConfig;

#[derive(Debug, Deserialize, Clone)]
pub struct Request {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

/// Process-wide state: the active config and the default weight table.
/// Nothing computed from a snapshot is kept here.
#[derive(Debug, Default)]
pub struct AppState {
    pub config: EngineConfig,
    pub weights: WeightTable,
}

impl AppState {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            weights: WeightTable::default(),
        }
    }
}
