use std::sync::Arc;

use midas_core::{texts, User, UserId};
use midas_ports::{Clock, Messenger};
use midas_store::{RedeemOutcome, Store, StoreError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SubscriptionError {
    #[error(transparent)]
    Store(#[from] StoreError),
}

type Result<T> = std::result::Result<T, SubscriptionError>;

/// Outcome counts of one pre-expiry pass
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PassReport {
    /// Notices delivered and marked
    pub notified: usize,
    /// Recipients unreachable for good; marked so they are not retried
    pub unreachable: usize,
    /// Transient send failures; left unmarked for the next tick
    pub deferred: usize,
}

/// Sole writer of subscription state.
///
/// Wraps the store with the redemption policy and the two periodic passes.
pub struct SubscriptionManager {
    store: Arc<Store>,
    clock: Arc<dyn Clock>,
}

impl SubscriptionManager {
    pub fn new(store: Arc<Store>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Register or refresh a user on inbound contact. Idempotent.
    pub async fn on_user_contact(
        &self,
        user_id: UserId,
        username: Option<&str>,
    ) -> Result<User> {
        Ok(self.store.upsert_user(user_id, username).await?)
    }

    /// Redeem a key for the user at the current clock time.
    ///
    /// The extension tie-break (unexpired time extends from the old expiry)
    /// and the pre-expiry-notice reset happen inside the store transaction.
    pub async fn redeem(&self, user_id: UserId, code: &str) -> Result<RedeemOutcome> {
        let outcome = self
            .store
            .redeem_key(code, user_id, self.clock.epoch())
            .await?;
        match outcome {
            RedeemOutcome::Granted { expiry } => {
                log::info!("user {user_id} redeemed a key, active until {expiry}");
            }
            RedeemOutcome::KeyNotFound => {
                log::debug!("user {user_id} tried an unknown key");
            }
            RedeemOutcome::KeyAlreadyUsed => {
                log::debug!("user {user_id} tried a spent key");
            }
        }
        Ok(outcome)
    }

    pub async fn find_user(&self, user_id: UserId) -> Result<Option<User>> {
        Ok(self.store.find_user(user_id).await?)
    }

    /// Snapshot of the active recipient set
    pub async fn active_users(&self) -> Result<Vec<User>> {
        Ok(self.store.active_users().await?)
    }

    /// Send at most one pre-expiry notice per (user, expiry) pair for every
    /// user inside the trailing window.
    ///
    /// A permanent send failure still marks the user notified - an
    /// unreachable chat must not be retried every tick. Transient failures
    /// leave the user unmarked so the next tick retries.
    pub async fn pre_expiry_pass(
        &self,
        window_seconds: i64,
        messenger: &dyn Messenger,
    ) -> Result<PassReport> {
        let now = self.clock.epoch();
        let expiring = self.store.users_expiring_within(now, window_seconds).await?;
        let mut report = PassReport::default();

        for user in expiring {
            let notice = texts::expiring_soon(user.hours_remaining(now));
            match messenger.send(user.user_id, &notice).await {
                Ok(()) => {
                    self.store
                        .mark_pre_expiry_notified(user.user_id, user.expiry)
                        .await?;
                    report.notified += 1;
                }
                Err(err) if err.is_permanent() => {
                    log::warn!("pre-expiry notice to {} undeliverable: {err}", user.user_id);
                    self.store
                        .mark_pre_expiry_notified(user.user_id, user.expiry)
                        .await?;
                    report.unreachable += 1;
                }
                Err(err) => {
                    log::warn!("pre-expiry notice to {} deferred: {err}", user.user_id);
                    report.deferred += 1;
                }
            }
        }

        if report != PassReport::default() {
            log::info!(
                "pre-expiry pass: {} notified, {} unreachable, {} deferred",
                report.notified,
                report.unreachable,
                report.deferred
            );
        }
        Ok(report)
    }

    /// Deactivate every user whose expiry has passed and attempt a one-shot
    /// expired notice each. Send failures never block deactivation.
    pub async fn expire_pass(&self, messenger: &dyn Messenger) -> Result<usize> {
        let now = self.clock.epoch();
        let expired = self.store.deactivate_expired(now).await?;

        for user in &expired {
            if let Err(err) = messenger.send(user.user_id, texts::expired_notice()).await {
                log::warn!("expired notice to {} failed: {err}", user.user_id);
            }
        }

        if !expired.is_empty() {
            log::info!("expire pass deactivated {} users", expired.len());
        }
        Ok(expired.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use midas_clock::ManualClock;
    use midas_ports::SendError;
    use std::sync::Mutex;

    /// Records sends; per-user scripted failures
    #[derive(Default)]
    struct FakeMessenger {
        sent: Mutex<Vec<(UserId, String)>>,
        fail_with: Mutex<Option<SendError>>,
    }

    impl FakeMessenger {
        fn failing(error: SendError) -> Self {
            Self {
                sent: Mutex::new(Vec::new()),
                fail_with: Mutex::new(Some(error)),
            }
        }

        fn sent(&self) -> Vec<(UserId, String)> {
            self.sent.lock().unwrap().clone()
        }

        fn clear_failure(&self) {
            *self.fail_with.lock().unwrap() = None;
        }
    }

    #[async_trait]
    impl Messenger for FakeMessenger {
        async fn send(&self, user: UserId, text: &str) -> std::result::Result<(), SendError> {
            if let Some(err) = self.fail_with.lock().unwrap().clone() {
                return Err(err);
            }
            self.sent.lock().unwrap().push((user, text.to_string()));
            Ok(())
        }
    }

    async fn manager_at(epoch: i64) -> (SubscriptionManager, Arc<Store>, Arc<ManualClock>) {
        let store = Arc::new(Store::in_memory().await.unwrap());
        let clock = Arc::new(ManualClock::at_epoch(epoch));
        let manager = SubscriptionManager::new(Arc::clone(&store), clock.clone());
        (manager, store, clock)
    }

    #[tokio::test]
    async fn contact_then_redeem_walks_the_state_machine() {
        let now = 1_000_000_000;
        let (manager, store, _clock) = manager_at(now).await;

        let user = manager.on_user_contact(42, Some("alice")).await.unwrap();
        assert!(!user.active);

        store.create_key("K1", 7, now).await.unwrap();
        let outcome = manager.redeem(42, "K1").await.unwrap();
        assert_eq!(outcome, RedeemOutcome::Granted { expiry: 1_000_604_800 });

        let user = manager.find_user(42).await.unwrap().unwrap();
        assert!(user.is_active_at(now));
    }

    #[tokio::test]
    async fn re_redemption_extends_never_shortens() {
        let now = 1_000_000_000;
        let (manager, store, _clock) = manager_at(now).await;
        store.create_key("K1", 7, now).await.unwrap();
        store.create_key("K2", 30, now).await.unwrap();

        manager.redeem(42, "K1").await.unwrap();
        let before = manager.find_user(42).await.unwrap().unwrap().expiry;

        manager.redeem(42, "K2").await.unwrap();
        let after = manager.find_user(42).await.unwrap().unwrap().expiry;

        assert!(after >= before + 30 * 86_400);
        assert_eq!(after, 1_003_196_800);
    }

    #[tokio::test]
    async fn pre_expiry_notice_sent_once_per_expiry() {
        let now = 1_000_000_000;
        let (manager, store, _clock) = manager_at(now).await;

        // expiry lands 3h from now
        store.create_key("K", 1, now - 86_400 + 3 * 3600).await.unwrap();
        store
            .redeem_key("K", 7, now - 86_400 + 3 * 3600)
            .await
            .unwrap();

        let messenger = FakeMessenger::default();
        let report = manager.pre_expiry_pass(6 * 3600, &messenger).await.unwrap();
        assert_eq!(report.notified, 1);
        assert_eq!(messenger.sent().len(), 1);
        assert!(messenger.sent()[0].1.contains("3h"));

        // second pass: nothing new
        let report = manager.pre_expiry_pass(6 * 3600, &messenger).await.unwrap();
        assert_eq!(report, PassReport::default());
        assert_eq!(messenger.sent().len(), 1);
    }

    #[tokio::test]
    async fn redemption_resets_the_notice_for_the_new_expiry() {
        let now = 1_000_000_000;
        let (manager, store, clock) = manager_at(now).await;
        store.create_key("K1", 1, now - 86_400 + 3600).await.unwrap();
        store.redeem_key("K1", 5, now - 86_400 + 3600).await.unwrap();

        let messenger = FakeMessenger::default();
        manager.pre_expiry_pass(6 * 3600, &messenger).await.unwrap();
        assert_eq!(messenger.sent().len(), 1);

        // a fresh 1-day key moves the expiry; the old notice no longer counts
        store.create_key("K2", 1, now).await.unwrap();
        manager.redeem(5, "K2").await.unwrap();

        clock.advance_secs(86_400 - 3600);
        let report = manager.pre_expiry_pass(6 * 3600, &messenger).await.unwrap();
        assert_eq!(report.notified, 1);
        assert_eq!(messenger.sent().len(), 2);
    }

    #[tokio::test]
    async fn transient_failure_defers_the_notice() {
        let now = 1_000_000_000;
        let (manager, store, _clock) = manager_at(now).await;
        store.create_key("K", 1, now - 86_400 + 3600).await.unwrap();
        store.redeem_key("K", 7, now - 86_400 + 3600).await.unwrap();

        let messenger = FakeMessenger::failing(SendError::Transient("rate limited".into()));
        let report = manager.pre_expiry_pass(6 * 3600, &messenger).await.unwrap();
        assert_eq!(report.deferred, 1);
        assert_eq!(report.notified, 0);

        // next tick the send works and the notice goes out
        messenger.clear_failure();
        let report = manager.pre_expiry_pass(6 * 3600, &messenger).await.unwrap();
        assert_eq!(report.notified, 1);
        assert_eq!(messenger.sent().len(), 1);
    }

    #[tokio::test]
    async fn permanent_failure_marks_without_retry() {
        let now = 1_000_000_000;
        let (manager, store, _clock) = manager_at(now).await;
        store.create_key("K", 1, now - 86_400 + 3600).await.unwrap();
        store.redeem_key("K", 7, now - 86_400 + 3600).await.unwrap();

        let messenger = FakeMessenger::failing(SendError::Permanent("blocked".into()));
        let report = manager.pre_expiry_pass(6 * 3600, &messenger).await.unwrap();
        assert_eq!(report.unreachable, 1);

        // even after the transport recovers, the notice is not re-sent
        messenger.clear_failure();
        let report = manager.pre_expiry_pass(6 * 3600, &messenger).await.unwrap();
        assert_eq!(report, PassReport::default());
        assert!(messenger.sent().is_empty());
    }

    #[tokio::test]
    async fn expire_pass_deactivates_and_notifies_once() {
        let now = 1_000_000_000;
        let (manager, store, clock) = manager_at(now).await;
        store.create_key("K", 1, now).await.unwrap();
        store.redeem_key("K", 7, now).await.unwrap();

        clock.advance_secs(86_401);
        let messenger = FakeMessenger::default();
        assert_eq!(manager.expire_pass(&messenger).await.unwrap(), 1);
        assert_eq!(messenger.sent().len(), 1);

        // active=true implies expiry in the future for everyone left
        let now = clock.epoch();
        for user in manager.active_users().await.unwrap() {
            assert!(user.expiry > now);
        }

        // second pass is a no-op
        assert_eq!(manager.expire_pass(&messenger).await.unwrap(), 0);
        assert_eq!(messenger.sent().len(), 1);
    }

    #[tokio::test]
    async fn notification_failure_never_blocks_deactivation() {
        let now = 1_000_000_000;
        let (manager, store, clock) = manager_at(now).await;
        store.create_key("K", 1, now).await.unwrap();
        store.redeem_key("K", 7, now).await.unwrap();

        clock.advance_secs(2 * 86_400);
        let messenger = FakeMessenger::failing(SendError::Transient("down".into()));
        assert_eq!(manager.expire_pass(&messenger).await.unwrap(), 1);

        let user = manager.find_user(7).await.unwrap().unwrap();
        assert!(!user.active);
    }

    #[tokio::test]
    async fn expired_user_can_reactivate() {
        let now = 1_000_000_000;
        let (manager, store, clock) = manager_at(now).await;
        store.create_key("K1", 1, now).await.unwrap();
        store.redeem_key("K1", 7, now).await.unwrap();

        clock.advance_secs(3 * 86_400);
        manager.expire_pass(&FakeMessenger::default()).await.unwrap();

        // redemption after expiry starts from now, not the stale expiry
        store.create_key("K2", 2, clock.epoch()).await.unwrap();
        let outcome = manager.redeem(7, "K2").await.unwrap();
        assert_eq!(
            outcome,
            RedeemOutcome::Granted { expiry: clock.epoch() + 2 * 86_400 }
        );
        let user = manager.find_user(7).await.unwrap().unwrap();
        assert!(user.is_active_at(clock.epoch()));
    }
}
