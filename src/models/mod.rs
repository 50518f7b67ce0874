//! Data models for trades, orders and trading venues.

mod market;
mod order;
mod trade;

pub use market::Market;
pub use order::{OrderRequest, TradeFilter};
pub use trade::{Trade, TradeSide};
