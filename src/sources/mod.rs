//! Block notification sources that pace receipt polling.
//!
//! Each call to [`BlockSource::next_block`] waits until it is worth checking
//! for a receipt again: either a timer tick or a new chain head.

pub mod poller;
pub mod websocket;

use async_trait::async_trait;

use crate::common::error::Result;

pub use poller::IntervalSource;
pub use websocket::WebSocketSource;

#[async_trait]
pub trait BlockSource: Send {
    /// Waits for the next tick. Returns the new head's number when the source
    /// knows it.
    async fn next_block(&mut self) -> Result<Option<u64>>;

    fn source_name(&self) -> &'static str;
}
