//! Midas Signal
//!
//! The signal-generation pipeline: random symbol/direction/confidence draws
//! combined with the market adapter's current price under the fixed offset
//! policy. Also hosts the concrete HTTP market-data adapter.

mod generator;
mod market;

pub use generator::{SignalConfig, SignalGenerator};
pub use market::HttpMarketData;
