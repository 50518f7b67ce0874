//! Periodic snapshots of the operator's portfolio or a token price.

use std::io::Write;

use serde::Serialize;
use serde_json::Value;

use crate::api::{ApiClient, ApiError};
use crate::models::Market;
use crate::output::{ErrorReport, JsonLines};
use crate::trading::Tick;

pub const DEFAULT_WATCH_INTERVAL_SECS: u64 = 10;

/// What a watcher polls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchTarget {
    Portfolio,
    Price { token: String },
}

/// Live prices come from a nominal 1 USDC buy quote.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct QuoteRequest<'a> {
    contract_address: &'a str,
    side: &'static str,
    amount_usdc: &'static str,
}

pub struct Watcher<O, E> {
    client: ApiClient,
    market: Market,
    target: WatchTarget,
    output: JsonLines<O, E>,
}

impl<O: Write, E: Write> Watcher<O, E> {
    pub fn new(client: ApiClient, market: Market, target: WatchTarget, output: JsonLines<O, E>) -> Self {
        Self {
            client,
            market,
            target,
            output,
        }
    }

    async fn fetch(&self) -> Result<Value, ApiError> {
        match &self.target {
            WatchTarget::Portfolio => self.client.get(&self.market.portfolio_path(), &[]).await,
            WatchTarget::Price { token } => match self.market {
                Market::Paper => {
                    self.client
                        .get(&["agent", "paper", "base", "price"], &[("contractAddress", token.as_str())])
                        .await
                }
                Market::Live => {
                    let quote = QuoteRequest {
                        contract_address: token,
                        side: "buy",
                        amount_usdc: "1",
                    };
                    self.client.post(&["agent", "live", "base", "quote"], &quote).await
                }
            },
        }
    }
}

impl<O: Write, E: Write> Tick for Watcher<O, E> {
    type Error = ApiError;

    async fn tick(&mut self) -> Result<(), ApiError> {
        let snapshot = self.fetch().await?;
        self.output.success(&snapshot);
        Ok(())
    }

    fn tick_failed(&mut self, err: ApiError) {
        self.output.failure(&ErrorReport::from(&err));
    }
}
