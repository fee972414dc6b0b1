//! Midas Ports
//!
//! Port definitions (traits) for the Midas signal notifier.
//! These define the boundaries between domain logic and infrastructure:
//! the clock, the market-data source, and the chat transport.

mod clock;
mod market;
mod messenger;

pub use clock::Clock;
pub use market::{MarketData, MarketError};
pub use messenger::{Messenger, SendError};
