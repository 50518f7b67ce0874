//! Wire types shared by all service endpoints.

use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

use crate::models::Trade;

/// Envelope wrapping every service response.
#[derive(Debug, Clone, Deserialize)]
pub struct Envelope {
    pub success: bool,
    #[serde(default)]
    pub response: Value,
    #[serde(default)]
    pub error: Option<EnvelopeError>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EnvelopeError {
    #[serde(default)]
    pub code: Option<String>,
}

impl Envelope {
    /// Human-readable failure message: the `response` string itself, or its
    /// JSON encoding when the service sent a structured payload.
    pub fn failure_message(&self) -> String {
        match &self.response {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }
}

/// Page returned by `/agent/{name}/trades`, newest trade first.
///
/// Entries stay raw until [`TradesPage::into_entries`] so that one malformed
/// trade cannot fail the whole page.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TradesPage {
    #[serde(default)]
    pub trades: Vec<Value>,
}

/// One entry of a trade history page, decoded on its own.
#[derive(Debug, Clone, PartialEq)]
pub struct PageEntry {
    pub id: String,
    /// The decoded trade, or why it could not be decoded
    pub trade: Result<Trade, String>,
}

impl TradesPage {
    /// Decode each entry separately, keeping page order. Entries without an
    /// id cannot be diffed against a cursor and are dropped.
    pub fn into_entries(self) -> Vec<PageEntry> {
        self.trades
            .into_iter()
            .filter_map(|raw| {
                let id = match raw.get("id") {
                    Some(Value::String(id)) if !id.is_empty() => id.clone(),
                    Some(Value::Number(n)) => n.to_string(),
                    _ => {
                        warn!(entry = %raw, "Dropping trade without an id");
                        return None;
                    }
                };
                let trade = serde_json::from_value::<Trade>(raw).map_err(|e| e.to_string());
                Some(PageEntry { id, trade })
            })
            .collect()
    }
}
