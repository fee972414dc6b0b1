//! Midas Store
//!
//! Durable persistence for users and subscription keys, backed by a single
//! embedded SQLite file. The connection pool is capped at one connection, so
//! every operation - including the compound redemption transaction - runs
//! under a single-writer discipline: a redemption is atomic against a
//! concurrent redemption of the same code and against the expiry passes.

mod error;
mod store;

pub use error::StoreError;
pub use store::{RedeemOutcome, Store};
