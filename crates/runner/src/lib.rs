//! Midas Runner
//!
//! Pulls the pieces together: environment configuration, store
//! initialization, adapter construction, and the three long-running tasks
//! (inbound handler, signal dispatcher, expiry ticker) under one shutdown
//! signal.

pub mod bootstrap;
pub mod config;

pub use config::{Config, ConfigError};
