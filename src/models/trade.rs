//! Trade model as reported by an agent's public trade history.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Direction of a trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum TradeSide {
    Buy,
    Sell,
    /// Any side the service reports that we do not know how to mirror.
    #[serde(other)]
    #[value(skip)]
    Unsupported,
}

impl TradeSide {
    pub fn as_str(&self) -> &'static str {
        match self {
            TradeSide::Buy => "buy",
            TradeSide::Sell => "sell",
            TradeSide::Unsupported => "unsupported",
        }
    }
}

/// A single trade by some agent.
///
/// Amounts are decimal strings and stay strings: they are forwarded to the
/// service untouched. Fields not modelled here are kept in `extra` so the
/// trade can be echoed back exactly as received.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trade {
    /// Opaque identifier, unique per agent
    pub id: String,

    pub side: TradeSide,

    /// Token contract traded
    pub contract_address: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount_usdc: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_usdc: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<String>,

    /// Token quantity, set on sells
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}
