use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveTime;
use dashmap::DashMap;
use midas_core::{texts, UserId};
use midas_ports::{Clock, Messenger};
use midas_signal::SignalGenerator;
use midas_subscription::{PassReport, SubscriptionError, SubscriptionManager};

/// Dispatch timing and delivery policy
#[derive(Debug, Clone)]
pub struct DispatchConfig {
    /// Local time of the daily signal tick
    pub fire_at: NaiveTime,
    /// Period of the expiry ticker
    pub check_expire_every: Duration,
    /// Pre-expiry notification window, seconds
    pub pre_expiry_window: i64,
    /// Sleep schedule between transient retries; its length bounds the
    /// retry count
    pub retry_backoff: Vec<Duration>,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            fire_at: NaiveTime::from_hms_opt(9, 0, 0).unwrap_or_default(),
            check_expire_every: Duration::from_secs(3600),
            pre_expiry_window: 6 * 3600,
            retry_backoff: vec![
                Duration::from_secs(1),
                Duration::from_secs(2),
                Duration::from_secs(4),
            ],
        }
    }
}

/// What one signal tick did
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TickReport {
    /// Size of the recipient snapshot
    pub recipients: usize,
    pub delivered: usize,
    /// Permanent failures this tick
    pub undeliverable: usize,
    /// Transient failures that exhausted their retries
    pub failed: usize,
    /// True when the tick delivered nothing (empty set or market failure)
    pub skipped: bool,
}

enum Delivery {
    Delivered,
    Undeliverable,
    Failed,
}

/// Periodic fan-out of generated signals to the active subscriber set
pub struct Dispatcher {
    subscriptions: Arc<SubscriptionManager>,
    generator: Arc<SignalGenerator>,
    messenger: Arc<dyn Messenger>,
    clock: Arc<dyn Clock>,
    config: DispatchConfig,
    /// Permanent-failure counts per recipient. Delivery failure never
    /// deactivates; the ledger only records, so a threshold policy could be
    /// added later.
    undeliverable: DashMap<UserId, u32>,
}

impl Dispatcher {
    pub fn new(
        subscriptions: Arc<SubscriptionManager>,
        generator: Arc<SignalGenerator>,
        messenger: Arc<dyn Messenger>,
        clock: Arc<dyn Clock>,
        config: DispatchConfig,
    ) -> Self {
        Self {
            subscriptions,
            generator,
            messenger,
            clock,
            config,
            undeliverable: DashMap::new(),
        }
    }

    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }

    pub(crate) fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    /// Permanent-failure count recorded against a recipient
    pub fn undeliverable_count(&self, user: UserId) -> u32 {
        self.undeliverable.get(&user).map(|c| *c).unwrap_or(0)
    }

    /// One signal tick.
    ///
    /// The recipient set is snapshotted first; an empty snapshot
    /// short-circuits without invoking the generator. One signal is
    /// generated and formatted once, then sent to every recipient; failures
    /// are isolated per recipient.
    pub async fn signal_tick(&self) -> Result<TickReport, SubscriptionError> {
        let recipients = self.subscriptions.active_users().await?;
        let mut report = TickReport {
            recipients: recipients.len(),
            ..TickReport::default()
        };

        if recipients.is_empty() {
            log::debug!("signal tick: no active subscribers");
            report.skipped = true;
            return Ok(report);
        }

        let signal = match self.generator.generate().await {
            Ok(signal) => signal,
            Err(err) => {
                log::warn!("signal tick skipped, market unavailable: {err}");
                report.skipped = true;
                return Ok(report);
            }
        };

        // Payload is fixed before the first send; the fan-out never
        // re-invokes the generator
        let text = texts::signal_message(&signal);

        for user in &recipients {
            match self.send_with_retry(user.user_id, &text).await {
                Delivery::Delivered => report.delivered += 1,
                Delivery::Undeliverable => {
                    *self.undeliverable.entry(user.user_id).or_insert(0) += 1;
                    report.undeliverable += 1;
                }
                Delivery::Failed => report.failed += 1,
            }
        }

        log::info!(
            "signal tick: {} {} sent to {}/{} subscribers ({} undeliverable, {} failed)",
            signal.symbol,
            signal.direction.as_str(),
            report.delivered,
            report.recipients,
            report.undeliverable,
            report.failed
        );
        Ok(report)
    }

    /// One expiry tick: pre-expiry notices, then deactivation
    pub async fn expiry_tick(&self) -> Result<(PassReport, usize), SubscriptionError> {
        let notices = self
            .subscriptions
            .pre_expiry_pass(self.config.pre_expiry_window, self.messenger.as_ref())
            .await?;
        let expired = self
            .subscriptions
            .expire_pass(self.messenger.as_ref())
            .await?;
        Ok((notices, expired))
    }

    async fn send_with_retry(&self, user: UserId, text: &str) -> Delivery {
        let mut attempt = 0;
        loop {
            match self.messenger.send(user, text).await {
                Ok(()) => return Delivery::Delivered,
                Err(err) if err.is_permanent() => {
                    log::warn!("recipient {user} unreachable: {err}");
                    return Delivery::Undeliverable;
                }
                Err(err) => {
                    let Some(delay) = self.config.retry_backoff.get(attempt) else {
                        log::warn!("giving up on {user} after {attempt} retries: {err}");
                        return Delivery::Failed;
                    };
                    log::debug!("transient failure for {user}, retrying in {delay:?}: {err}");
                    tokio::time::sleep(*delay).await;
                    attempt += 1;
                }
            }
        }
    }
}
