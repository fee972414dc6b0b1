use midas_runner::{bootstrap, Config};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Config::from_env()?;
    log::info!(
        "starting midas (admin {}, signal at {} local, expiry check every {}h)",
        config.admin_id,
        config.fire_at,
        config.check_expire_hours
    );

    bootstrap::run(config).await
}
