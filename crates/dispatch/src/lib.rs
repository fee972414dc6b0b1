//! Midas Dispatch
//!
//! The periodic jobs: a daily signal tick that snapshots the active
//! recipients, generates exactly one signal, and fans it out with bounded
//! retries; and an hourly expiry tick that runs the pre-expiry notification
//! pass followed by the expiry pass.

mod dispatcher;
mod scheduler;

pub use dispatcher::{DispatchConfig, Dispatcher, TickReport};
pub use scheduler::{next_fire_after, run_expiry_loop, run_signal_loop};
