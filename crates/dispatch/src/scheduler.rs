use std::sync::Arc;

use chrono::{Duration as ChronoDuration, Local, NaiveDateTime, NaiveTime};
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;

use crate::dispatcher::Dispatcher;

/// Next daily occurrence of `at` strictly after `now`
pub fn next_fire_after(now: NaiveDateTime, at: NaiveTime) -> NaiveDateTime {
    let today = now.date().and_time(at);
    if today > now {
        today
    } else {
        today + ChronoDuration::days(1)
    }
}

/// Daily signal loop: sleep until the configured local fire time, tick,
/// repeat. Returns when the shutdown signal fires.
pub async fn run_signal_loop(dispatcher: Arc<Dispatcher>, mut shutdown: watch::Receiver<bool>) {
    let fire_at = dispatcher.config().fire_at;
    log::info!("signal dispatcher armed for {fire_at} local, daily");

    loop {
        let now = dispatcher.clock().now().with_timezone(&Local).naive_local();
        let next = next_fire_after(now, fire_at);
        let wait = (next - now).to_std().unwrap_or_default();

        tokio::select! {
            _ = tokio::time::sleep(wait) => {
                if let Err(err) = dispatcher.signal_tick().await {
                    log::error!("signal tick failed: {err}");
                }
            }
            _ = shutdown.changed() => {
                log::info!("signal dispatcher stopping");
                return;
            }
        }
    }
}

/// Expiry loop: every check period, run the pre-expiry pass then the expiry
/// pass. The first tick fires immediately so expired users are caught up at
/// startup.
pub async fn run_expiry_loop(dispatcher: Arc<Dispatcher>, mut shutdown: watch::Receiver<bool>) {
    let period = dispatcher.config().check_expire_every;
    log::info!("expiry ticker armed, every {period:?}");

    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if let Err(err) = dispatcher.expiry_tick().await {
                    log::error!("expiry tick failed: {err}");
                }
            }
            _ = shutdown.changed() => {
                log::info!("expiry ticker stopping");
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn time(h: u32, m: u32, s: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, s).unwrap()
    }

    #[test]
    fn before_the_fire_time_fires_today() {
        let now = date(2024, 5, 10).and_time(time(8, 30, 0));
        let next = next_fire_after(now, time(9, 0, 0));
        assert_eq!(next, date(2024, 5, 10).and_time(time(9, 0, 0)));
    }

    #[test]
    fn at_or_after_the_fire_time_fires_tomorrow() {
        let at = time(9, 0, 0);

        let exactly = date(2024, 5, 10).and_time(at);
        assert_eq!(next_fire_after(exactly, at), date(2024, 5, 11).and_time(at));

        let later = date(2024, 5, 10).and_time(time(17, 45, 12));
        assert_eq!(next_fire_after(later, at), date(2024, 5, 11).and_time(at));
    }

    #[test]
    fn crosses_month_boundaries() {
        let now = date(2024, 1, 31).and_time(time(23, 0, 0));
        let next = next_fire_after(now, time(9, 0, 0));
        assert_eq!(next, date(2024, 2, 1).and_time(time(9, 0, 0)));
    }
}
