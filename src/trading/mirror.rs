//! Translation of a source trade into the order that mirrors it.

use std::str::FromStr;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;

use crate::models::{Trade, TradeSide};

/// Field of a trade that can carry a buy's USDC size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AmountField {
    TotalUsdc,
    AmountUsdc,
    Amount,
}

impl AmountField {
    fn read(self, trade: &Trade) -> Option<&str> {
        let value = match self {
            AmountField::TotalUsdc => trade.total_usdc.as_deref(),
            AmountField::AmountUsdc => trade.amount_usdc.as_deref(),
            AmountField::Amount => trade.amount.as_deref(),
        };
        value.filter(|v| !v.trim().is_empty())
    }
}

/// The service reports a buy's size under a different key depending on the
/// kind of trade. The keys are aliases; the first populated one is used.
const BUY_AMOUNT_PRECEDENCE: [AmountField; 3] = [
    AmountField::TotalUsdc,
    AmountField::AmountUsdc,
    AmountField::Amount,
];

/// Why a trade could not be turned into an order.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MirrorError {
    #[error("buy trade has no USDC amount")]
    MissingAmount,
    #[error("sell trade has no quantity")]
    MissingQuantity,
    #[error("unsupported trade side")]
    UnsupportedSide,
    #[error("buy amount {0:?} is not a number and cannot be capped")]
    InvalidAmount(String),
}

/// Order body submitted to the DEX trade endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MirrorOrder {
    pub contract_address: String,
    pub side: TradeSide,
    pub note: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount_usdc: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quantity: Option<String>,
}

impl MirrorOrder {
    /// Build the mirror of `trade`.
    ///
    /// Buys spend the source's USDC amount, replaced by `max_usdc` when the
    /// amount exceeds it. Sells copy the token quantity exactly and are never
    /// capped.
    pub fn from_trade(
        trade: &Trade,
        note: impl Into<String>,
        max_usdc: Option<Decimal>,
    ) -> Result<Self, MirrorError> {
        let (amount_usdc, quantity) = match trade.side {
            TradeSide::Buy => {
                let amount = buy_amount(trade).ok_or(MirrorError::MissingAmount)?;
                (Some(cap_amount(amount, max_usdc)?), None)
            }
            TradeSide::Sell => {
                let quantity = trade
                    .quantity
                    .as_deref()
                    .filter(|q| !q.trim().is_empty())
                    .ok_or(MirrorError::MissingQuantity)?;
                (None, Some(quantity.to_string()))
            }
            TradeSide::Unsupported => return Err(MirrorError::UnsupportedSide),
        };

        Ok(Self {
            contract_address: trade.contract_address.clone(),
            side: trade.side,
            note: note.into(),
            amount_usdc,
            quantity,
        })
    }
}

/// USDC size of a buy, by alias precedence.
pub fn buy_amount(trade: &Trade) -> Option<&str> {
    BUY_AMOUNT_PRECEDENCE
        .iter()
        .find_map(|field| field.read(trade))
}

/// Apply the optional cap.
///
/// Without a cap the amount is forwarded as is. With one, a number too
/// large for `Decimal` is capped, and anything that is not a number is
/// rejected rather than sent uncapped.
pub fn cap_amount(amount: &str, max_usdc: Option<Decimal>) -> Result<String, MirrorError> {
    let Some(max) = max_usdc else {
        return Ok(amount.to_string());
    };

    let raw = amount.trim();
    match Decimal::from_str(raw).or_else(|_| Decimal::from_scientific(raw)) {
        Ok(value) if value > max => Ok(max.to_string()),
        Ok(_) => Ok(amount.to_string()),
        Err(_) => {
            let exceeds = raw
                .parse::<f64>()
                .is_ok_and(|v| max.to_f64().is_some_and(|m| v > m));
            if exceeds {
                Ok(max.to_string())
            } else {
                Err(MirrorError::InvalidAmount(amount.to_string()))
            }
        }
    }
}
