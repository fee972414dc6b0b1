//! Midas Subscription
//!
//! The subscription manager is the sole mutator of subscription state.
//! Inbound contact, key redemption, the pre-expiry notification pass and the
//! expiry pass all go through it; the dispatcher and the inbound router only
//! read.

mod manager;

pub use manager::{PassReport, SubscriptionError, SubscriptionManager};

// Redemption outcomes surface through the manager's API
pub use midas_store::RedeemOutcome;
