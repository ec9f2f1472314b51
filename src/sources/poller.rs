use async_trait::async_trait;
use tokio::time::{Duration, Instant, Interval, MissedTickBehavior, interval_at};

use super::BlockSource;
use crate::common::error::Result;

/// Timer-driven source. The first tick fires one period after creation.
pub struct IntervalSource {
    interval: Interval,
}

impl IntervalSource {
    #[must_use]
    pub fn new(period: Duration) -> Self {
        let mut interval = interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        Self { interval }
    }
}

#[async_trait]
impl BlockSource for IntervalSource {
    async fn next_block(&mut self) -> Result<Option<u64>> {
        self.interval.tick().await;
        Ok(None)
    }

    fn source_name(&self) -> &'static str {
        "Polling"
    }
}
