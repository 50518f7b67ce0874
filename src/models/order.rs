//! Orders placed by the operator and filters over their own trade history.

use clap::{value_parser, Args, ValueEnum};
use rust_decimal::Decimal;
use serde::Serialize;

use super::TradeSide;
use crate::validate::{self, ValidationError};

/// Body of a trade or quote request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderRequest {
    pub contract_address: String,
    pub side: TradeSide,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount_usdc: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quantity: Option<Decimal>,
    /// Slippage tolerance in percent, live market only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slippage: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl OrderRequest {
    /// Buys are sized in USDC and sells in tokens; the matching size is
    /// required.
    pub fn new(
        side: TradeSide,
        contract_address: impl Into<String>,
        amount_usdc: Option<Decimal>,
        quantity: Option<Decimal>,
    ) -> Result<Self, ValidationError> {
        match side {
            TradeSide::Buy if amount_usdc.is_none() => return Err(ValidationError::MissingUsdc),
            TradeSide::Sell if quantity.is_none() => return Err(ValidationError::MissingQuantity),
            TradeSide::Unsupported => return Err(ValidationError::UnsupportedSide),
            _ => {}
        }

        Ok(Self {
            contract_address: contract_address.into(),
            side,
            amount_usdc,
            quantity,
            slippage: None,
            note: None,
        })
    }

    pub fn with_slippage(mut self, slippage: Option<Decimal>) -> Self {
        self.slippage = slippage;
        self
    }

    pub fn with_note(mut self, note: Option<String>) -> Self {
        self.note = note;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }
}

/// Filters for the operator's own trade history.
#[derive(Debug, Clone, Default, PartialEq, Eq, Args)]
pub struct TradeFilter {
    /// Pagination cursor
    #[arg(long)]
    pub cursor: Option<String>,

    /// Max results (1-100)
    #[arg(long, value_parser = value_parser!(u32).range(1..=100))]
    pub limit: Option<u32>,

    /// Filter by token contract address
    #[arg(long, value_parser = validate::token_address)]
    pub token: Option<String>,

    /// Filter by side
    #[arg(long, value_enum)]
    pub side: Option<TradeSide>,

    /// Filter from ISO datetime
    #[arg(long)]
    pub start_date: Option<String>,

    /// Filter to ISO datetime
    #[arg(long)]
    pub end_date: Option<String>,

    #[arg(long, value_enum)]
    pub sort: Option<SortOrder>,

    /// Settlement status, live market only
    #[arg(skip)]
    pub status: Option<String>,
}

impl TradeFilter {
    /// Query parameters for the set filters, in a stable order.
    pub fn query(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        let mut push = |key: &'static str, value: Option<String>| {
            if let Some(value) = value.filter(|v| !v.is_empty()) {
                params.push((key, value));
            }
        };

        push("cursor", self.cursor.clone());
        push("limit", self.limit.map(|n| n.to_string()));
        push("contractAddress", self.token.clone());
        push("side", self.side.map(|s| s.as_str().to_string()));
        push("status", self.status.clone());
        push("startDate", self.start_date.clone());
        push("endDate", self.end_date.clone());
        push("sort", self.sort.map(|s| s.as_str().to_string()));
        params
    }
}
