//! Signal - what the generator produces and the dispatcher fans out
//!
//! A signal is one trading recommendation. The stop-loss / take-profit
//! offsets are fixed and symmetric regardless of direction; entry and both
//! offsets are rounded half-away-from-zero to 2 decimal places.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;

use crate::values::{Price, Symbol, Timestamp};

/// Trade direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Direction {
    Buy,
    Sell,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Buy => "Buy",
            Direction::Sell => "Sell",
        }
    }
}

/// Constant mode label carried on every generated signal
pub const SIGNAL_MODE: &str = "Auto";

/// Stop-loss offset: entry x 0.995
pub const SL_FACTOR: Decimal = Decimal::from_parts(995, 0, 0, false, 3);

/// Take-profit offset: entry x 1.005
pub const TP_FACTOR: Decimal = Decimal::from_parts(1005, 0, 0, false, 3);

/// One generated trading recommendation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Signal {
    pub symbol: Symbol,
    pub direction: Direction,
    pub mode: &'static str,
    pub entry: Price,
    pub stop_loss: Price,
    pub take_profit: Price,
    /// Percentage in [70, 90]
    pub confidence: u8,
    pub timestamp: Timestamp,
}

impl Signal {
    /// Build a signal from a raw adapter price, applying the rounding and
    /// offset policy.
    pub fn from_market(
        symbol: impl Into<Symbol>,
        direction: Direction,
        raw_price: Price,
        confidence: u8,
        timestamp: Timestamp,
    ) -> Self {
        let entry = round2(raw_price);
        Self {
            symbol: symbol.into(),
            direction,
            mode: SIGNAL_MODE,
            entry,
            stop_loss: round2(entry * SL_FACTOR),
            take_profit: round2(entry * TP_FACTOR),
            confidence,
            timestamp,
        }
    }
}

/// Round half-away-from-zero to 2 decimal places
pub fn round2(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal_macros::dec;

    #[test]
    fn round2_is_half_away_from_zero() {
        assert_eq!(round2(dec!(1.005)), dec!(1.01));
        assert_eq!(round2(dec!(-1.005)), dec!(-1.01));
        assert_eq!(round2(dec!(2.344)), dec!(2.34));
    }

    #[test]
    fn offsets_bracket_entry() {
        let signal = Signal::from_market("XAUUSD", Direction::Buy, dec!(2355.247), 80, Utc::now());
        assert_eq!(signal.entry, dec!(2355.25));
        assert!(signal.stop_loss < signal.entry);
        assert!(signal.take_profit > signal.entry);
        assert_eq!(signal.stop_loss, dec!(2343.47));
        assert_eq!(signal.take_profit, dec!(2367.03));
    }

    #[test]
    fn offsets_are_symmetric_across_directions() {
        let buy = Signal::from_market("EURUSD", Direction::Buy, dec!(1.0850), 75, Utc::now());
        let sell = Signal::from_market("EURUSD", Direction::Sell, dec!(1.0850), 75, Utc::now());
        // Source behavior: the same offsets apply regardless of direction
        assert_eq!(buy.stop_loss, sell.stop_loss);
        assert_eq!(buy.take_profit, sell.take_profit);
    }
}
