//! Copy-trading configuration.

use std::time::Duration;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::Market;

pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 30;

/// Configuration for mirroring one source agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CopyConfig {
    /// Agent whose trades are mirrored
    pub source_agent: String,

    /// Venue the mirrored orders are placed on
    pub market: Market,

    /// Upper bound on a mirrored buy, in USDC
    pub max_usdc: Option<Decimal>,

    /// Seconds between polls (1 to 3600)
    pub poll_interval_secs: u64,

    /// Page size requested from the trade history endpoint
    pub page_size: Option<u32>,
}

impl CopyConfig {
    pub fn new(source_agent: impl Into<String>) -> Self {
        Self {
            source_agent: source_agent.into(),
            market: Market::Paper,
            max_usdc: None,
            poll_interval_secs: DEFAULT_POLL_INTERVAL_SECS,
            page_size: None,
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    /// Note attached to every mirrored order.
    pub fn note(&self) -> String {
        format!("copy:{}", self.source_agent)
    }
}
