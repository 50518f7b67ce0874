//! Fomolt service client: request primitive, error taxonomy and wire types.

mod client;
mod endpoints;
mod error;
mod types;

pub use client::{ApiClient, DEFAULT_API_URL};
pub use error::ApiError;
pub use types::{PageEntry, TradesPage};
