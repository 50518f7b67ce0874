//! Tick scheduling: run once, or run now and then at a fixed delay.

use std::future::Future;
use std::time::Duration;

use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::debug;

/// A unit of periodic work.
pub trait Tick {
    type Error;

    fn tick(&mut self) -> impl Future<Output = Result<(), Self::Error>>;

    /// Called when a tick after the first one fails. The loop keeps going.
    fn tick_failed(&mut self, err: Self::Error);
}

/// When ticks run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Schedule {
    /// A single tick, then return.
    Once,
    /// A tick immediately, then one per period until the process exits.
    Every(Duration),
}

impl Schedule {
    /// Drive `target` according to the schedule.
    ///
    /// The first tick's error is returned so start-up problems surface to the
    /// caller. Later errors go to [`Tick::tick_failed`].
    pub async fn drive<T: Tick>(self, target: &mut T) -> Result<(), T::Error> {
        target.tick().await?;

        let period = match self {
            Schedule::Once => return Ok(()),
            Schedule::Every(period) => period,
        };

        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            debug!(period_secs = period.as_secs(), "Scheduled tick");
            if let Err(e) = target.tick().await {
                target.tick_failed(e);
            }
        }
    }
}
