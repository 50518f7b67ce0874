//! Copy trading: configuration, mirror orders, the engine and its scheduler.

mod config;
mod copy_engine;
mod events;
mod mirror;
mod schedule;

pub use config::{CopyConfig, DEFAULT_POLL_INTERVAL_SECS};
pub use copy_engine::CopyEngine;
pub use schedule::{Schedule, Tick};
