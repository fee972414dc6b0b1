//! Midas Core Domain
//!
//! Pure domain types for the Midas signal notifier.
//! This crate contains no async, no I/O, and is 100% unit testable.

pub mod command;
pub mod entities;
pub mod signal;
pub mod texts;
pub mod values;

// Re-export commonly used types at crate root
pub use command::Command;
pub use entities::{Key, User};
pub use signal::{Direction, Signal, SIGNAL_MODE, SL_FACTOR, TP_FACTOR};
pub use values::{EpochSeconds, Price, Symbol, Timestamp, UserId};
