//! Trading venue selection.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Which venue orders go to: simulated paper trading or live on-chain.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Market {
    #[default]
    Paper,
    Live,
}

impl Market {
    pub fn as_str(&self) -> &'static str {
        match self {
            Market::Paper => "paper",
            Market::Live => "live",
        }
    }

    /// Path segments of the DEX order endpoint for this venue.
    pub fn trade_path(&self) -> [&'static str; 4] {
        ["agent", self.as_str(), "dex", "trade"]
    }

    /// Path segments of the portfolio endpoint for this venue.
    pub fn portfolio_path(&self) -> [&'static str; 4] {
        ["agent", self.as_str(), "base", "portfolio"]
    }

    /// Path segments of an account endpoint. Paper accounts are served from
    /// the simulated DEX, live accounts from the Base smart account.
    pub fn account_path<'a>(&self, leaf: &'a str) -> [&'a str; 4] {
        match self {
            Market::Paper => ["agent", "paper", "dex", leaf],
            Market::Live => ["agent", "live", "base", leaf],
        }
    }
}
