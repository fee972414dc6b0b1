use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;

use crate::router::InboundRouter;
use crate::telegram::TelegramClient;

/// Server-side long-poll window
const POLL_TIMEOUT_SECS: u64 = 30;
/// Pause after a failed poll before trying again
const POLL_RETRY_DELAY: Duration = Duration::from_secs(5);

/// Inbound loop: long-poll for updates, route each one, advance the ack
/// offset. Returns when the shutdown signal fires.
pub async fn run_polling(
    client: Arc<TelegramClient>,
    router: Arc<InboundRouter>,
    mut shutdown: watch::Receiver<bool>,
) {
    log::info!("inbound handler polling for updates");
    let mut offset: Option<i64> = None;

    loop {
        tokio::select! {
            polled = client.get_updates(offset, POLL_TIMEOUT_SECS) => {
                match polled {
                    Ok(updates) => {
                        for update in &updates {
                            offset = Some(offset.unwrap_or(0).max(update.update_id + 1));
                            if let Err(err) = router.handle_update(update).await {
                                log::error!("update {} failed: {err}", update.update_id);
                            }
                        }
                    }
                    Err(err) => {
                        log::warn!("poll failed, retrying in {POLL_RETRY_DELAY:?}: {err}");
                        tokio::time::sleep(POLL_RETRY_DELAY).await;
                    }
                }
            }
            _ = shutdown.changed() => {
                log::info!("inbound handler stopping");
                return;
            }
        }
    }
}
