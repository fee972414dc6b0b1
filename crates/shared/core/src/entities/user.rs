use serde::{Deserialize, Serialize};

use crate::values::{EpochSeconds, UserId};

/// A registered chat user.
///
/// Rows are created on first inbound contact and never deleted. `active`
/// and `expiry` mutate only through the subscription manager.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub user_id: UserId,
    /// Display handle as last observed on inbound contact
    pub username: Option<String>,
    pub active: bool,
    /// Subscription end, epoch seconds; 0 if never activated
    pub expiry: EpochSeconds,
    /// Expiry value for which a pre-expiry notice was already sent; 0 if none
    pub notified_expiry: EpochSeconds,
}

impl User {
    /// A fresh, never-activated user
    pub fn registered(user_id: UserId, username: Option<String>) -> Self {
        Self {
            user_id,
            username,
            active: false,
            expiry: 0,
            notified_expiry: 0,
        }
    }

    /// Whether the subscription covers the given instant
    pub fn is_active_at(&self, now: EpochSeconds) -> bool {
        self.active && self.expiry > now
    }

    /// Seconds of subscription left, clamped at zero
    pub fn seconds_remaining(&self, now: EpochSeconds) -> i64 {
        (self.expiry - now).max(0)
    }

    /// Hours of subscription left, rounded up
    pub fn hours_remaining(&self, now: EpochSeconds) -> i64 {
        (self.seconds_remaining(now) + 3599) / 3600
    }
}
