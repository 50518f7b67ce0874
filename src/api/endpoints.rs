//! One-call wrappers over individual service endpoints.
//!
//! Paper accounts live under `/agent/paper/dex/...` and live accounts under
//! `/agent/live/base/...`; see [`Market::account_path`].

use serde_json::Value;

use super::{ApiClient, ApiError};
use crate::models::{Market, OrderRequest, TradeFilter};

impl ApiClient {
    /// Simulated price of a token.
    pub async fn paper_price(&self, token: &str) -> Result<Value, ApiError> {
        self.get(&Market::Paper.account_path("price"), &[("contractAddress", token)])
            .await
    }

    /// Swap quote on the live market. Nothing is executed.
    pub async fn live_quote(&self, order: &OrderRequest) -> Result<Value, ApiError> {
        self.post(&Market::Live.account_path("quote"), order).await
    }

    /// USDC balance of the live smart account.
    pub async fn live_balance(&self) -> Result<Value, ApiError> {
        self.get(&Market::Live.account_path("balance"), &[]).await
    }

    pub async fn place_order(&self, market: Market, order: &OrderRequest) -> Result<Value, ApiError> {
        self.post(&market.account_path("trade"), order).await
    }

    pub async fn portfolio(&self, market: Market) -> Result<Value, ApiError> {
        self.get(&market.account_path("portfolio"), &[]).await
    }

    pub async fn performance(&self, market: Market) -> Result<Value, ApiError> {
        self.get(&market.account_path("performance"), &[]).await
    }

    /// The operator's own trade history.
    pub async fn trade_history(&self, market: Market, filter: &TradeFilter) -> Result<Value, ApiError> {
        let params = filter.query();
        let query: Vec<(&str, &str)> = params.iter().map(|(k, v)| (*k, v.as_str())).collect();
        self.get(&market.account_path("trades"), &query).await
    }

    /// Public profile of any agent.
    pub async fn agent_profile(&self, name: &str) -> Result<Value, ApiError> {
        self.get(&["agent", name], &[]).await
    }

    /// Public trade history of any agent, newest first.
    pub async fn agent_trades(&self, name: &str, cursor: Option<&str>, limit: u32) -> Result<Value, ApiError> {
        let limit = limit.to_string();
        self.get(&["agent", name, "trades"], &page_query(cursor, &limit)).await
    }

    /// Recent trades across the platform.
    pub async fn platform_feed(&self, cursor: Option<&str>, limit: u32) -> Result<Value, ApiError> {
        let limit = limit.to_string();
        self.get(&["trades"], &page_query(cursor, &limit)).await
    }

    /// Machine-readable description of the API.
    pub async fn api_manifest(&self) -> Result<Value, ApiError> {
        self.get(&["spec"], &[]).await
    }
}

fn page_query<'a>(cursor: Option<&'a str>, limit: &'a str) -> Vec<(&'static str, &'a str)> {
    let mut query = vec![("limit", limit)];
    if let Some(cursor) = cursor.filter(|c| !c.is_empty()) {
        query.push(("cursor", cursor));
    }
    query
}
