use serde::{Deserialize, Serialize};

use crate::values::{EpochSeconds, UserId, SECONDS_PER_DAY};

/// A single-use subscription key.
///
/// Created by the administrator, mutated exactly once on redemption, then
/// immutable. `used_by`, `consumed_at` and `subscription_expiry` are all set
/// together; a key is usable iff all three are unset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Key {
    /// Opaque code, unique across all keys
    pub code: String,
    pub duration_days: i64,
    pub created_at: EpochSeconds,
    pub used_by: Option<UserId>,
    pub consumed_at: Option<EpochSeconds>,
    /// The expiry granted by this redemption
    pub subscription_expiry: Option<EpochSeconds>,
}

impl Key {
    pub fn is_used(&self) -> bool {
        self.used_by.is_some()
    }

    /// Subscription time this key grants, in seconds
    pub fn duration_seconds(&self) -> i64 {
        self.duration_days * SECONDS_PER_DAY
    }
}
