use std::sync::Arc;
use std::time::Duration;

use midas_clock::SystemClock;
use midas_dispatch::{run_expiry_loop, run_signal_loop, DispatchConfig, Dispatcher};
use midas_gateway::{run_polling, InboundRouter, TelegramClient};
use midas_ports::{Clock, Messenger};
use midas_signal::{HttpMarketData, SignalConfig, SignalGenerator};
use midas_store::Store;
use midas_subscription::SubscriptionManager;
use tokio::sync::watch;

use crate::config::Config;

/// Bounded wait for in-flight work after the shutdown signal
const SHUTDOWN_GRACE: Duration = Duration::from_secs(30);

/// Wire the system and run until ctrl-c.
///
/// Store initialization failure is fatal; afterwards the three tasks share
/// the store's single writer and one shutdown channel.
pub async fn run(config: Config) -> anyhow::Result<()> {
    let store = Arc::new(Store::open(&config.db_path).await?);
    log::info!("store open at {}", config.db_path.display());

    let clock: Arc<dyn Clock> = Arc::new(SystemClock::new());
    let telegram = Arc::new(TelegramClient::new(&config.bot_token));
    let messenger: Arc<dyn Messenger> = telegram.clone();

    let subscriptions = Arc::new(SubscriptionManager::new(
        Arc::clone(&store),
        Arc::clone(&clock),
    ));
    let generator = Arc::new(SignalGenerator::new(
        Arc::new(HttpMarketData::new(&config.api_url)),
        Arc::clone(&clock),
        SignalConfig::default(),
    ));
    let dispatcher = Arc::new(Dispatcher::new(
        Arc::clone(&subscriptions),
        generator,
        Arc::clone(&messenger),
        Arc::clone(&clock),
        DispatchConfig {
            fire_at: config.fire_at,
            check_expire_every: Duration::from_secs(config.check_expire_hours as u64 * 3600),
            pre_expiry_window: config.notify_before_hours * 3600,
            ..DispatchConfig::default()
        },
    ));
    let router = Arc::new(InboundRouter::new(
        subscriptions,
        store,
        messenger,
        clock,
        config.admin_id,
    ));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let inbound = tokio::spawn(run_polling(
        Arc::clone(&telegram),
        router,
        shutdown_rx.clone(),
    ));
    let signals = tokio::spawn(run_signal_loop(
        Arc::clone(&dispatcher),
        shutdown_rx.clone(),
    ));
    let expiry = tokio::spawn(run_expiry_loop(dispatcher, shutdown_rx));

    tokio::signal::ctrl_c().await?;
    log::info!("shutdown requested");
    let _ = shutdown_tx.send(true);

    let drain = async {
        let _ = inbound.await;
        let _ = signals.await;
        let _ = expiry.await;
    };
    if tokio::time::timeout(SHUTDOWN_GRACE, drain).await.is_err() {
        log::warn!("tasks still running after {SHUTDOWN_GRACE:?}, abandoning them");
    }

    log::info!("midas stopped");
    Ok(())
}
