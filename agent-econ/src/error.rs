use thiserror::Error;

use crate::types::{AgentId, TradeId};

/// Everything that can go wrong when building schedules or feeding the ledger.
///
/// Lookups (`Basket::get_good_quantity`, `PreferenceSchedule::get_value`) are
/// total and never produce one of these.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum EconError {
    #[error("num_units must be at least 1, got {0}")]
    InvalidNumUnits(u32),

    #[error("base_value must be positive and finite, got {0}")]
    InvalidBaseValue(f64),

    #[error("noise_factor must be in [0, 1), got {0}")]
    InvalidNoiseFactor(f64),

    #[error("endowment_factor must be non-negative and finite, got {0}")]
    InvalidEndowmentFactor(f64),

    #[error("drift bounds must satisfy 0 < low <= high, got [{low}, {high}]")]
    InvalidDrift { low: f64, high: f64 },

    #[error("trade {trade_id} is between {buyer_id} and {seller_id}, not agent {agent_id}")]
    NotAParty {
        trade_id: TradeId,
        agent_id: AgentId,
        buyer_id: AgentId,
        seller_id: AgentId,
    },

    #[error("order quantity must be at least 1, got {0}")]
    InvalidOrderQuantity(u32),

    #[error("order has is_buyer = {is_buyer}, which does not match a {kind}")]
    OrderSideMismatch { kind: &'static str, is_buyer: bool },

    #[error("decode error: {0}")]
    Decode(String),
}

impl From<serde_json::Error> for EconError {
    fn from(err: serde_json::Error) -> Self {
        EconError::Decode(err.to_string())
    }
}

impl From<serde_wasm_bindgen::Error> for EconError {
    fn from(err: serde_wasm_bindgen::Error) -> Self {
        EconError::Decode(err.to_string())
    }
}
