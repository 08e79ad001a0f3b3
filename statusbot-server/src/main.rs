use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::sync::watch;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

use statusbot_core::config::ConfigStore;
use statusbot_core::http::DefaultHttpClient;
use statusbot_core::platforms::discord::DiscordPlatform;
use statusbot_core::platforms::fivem::FivemApi;
use statusbot_core::platforms::{PlatformAuth, PlatformIntegration};
use statusbot_core::status::lifecycle::{ChannelGateway, LifecycleManager};
use statusbot_core::status::render::DisplaySettings;
use statusbot_core::tasks::status_loop::run_status_loop;
use statusbot_core::Error;

#[derive(Parser, Debug, Clone)]
#[command(name = "statusbot")]
#[command(author, version, about = "FiveM server status mirror for Discord")]
struct Args {
    /// Path to the bot configuration file
    #[arg(long, default_value = "statusbot.toml")]
    config: PathBuf,
}

fn init_tracing() {
    let filter = EnvFilter::from_default_env()
        .add_directive("statusbot=info".parse().unwrap_or_default());
    let sub = fmt().with_env_filter(filter).finish();
    tracing::subscriber::set_global_default(sub)
        .expect("Failed to set global subscriber");
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();
    let args = Args::parse();
    info!("Statusbot starting. config={}", args.config.display());

    if let Err(e) = run(args).await {
        error!("Statusbot error: {:?}", e);
        return Err(e.into());
    }
    info!("Main finished. Goodbye!");
    Ok(())
}

async fn run(args: Args) -> Result<(), Error> {
    let store = ConfigStore::load(&args.config)?;
    let config = store.config().clone();

    // The only hard-fail path: bad token / unreachable gateway at startup.
    let mut platform = DiscordPlatform::new(&config)?;
    platform.authenticate().await?;
    platform.connect().await?;

    let gateway: Arc<dyn ChannelGateway> = platform.gateway()?;
    let events = platform
        .take_event_receiver()
        .await
        .ok_or_else(|| Error::Platform("Event receiver already taken".into()))?;

    let http = Arc::new(DefaultHttpClient::new()?);
    let source = Arc::new(FivemApi::new(http, &config.server_ip, config.server_port));

    let mut manager = LifecycleManager::new(
        gateway,
        source,
        DisplaySettings::from_config(&config),
        store,
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Ctrl-C received; shutting down.");
            let _ = shutdown_tx.send(true);
        }
    });

    info!(
        "Status loop starting. channel={}, interval={}ms",
        config.status_channel_id, config.update_interval_ms
    );
    run_status_loop(
        &mut manager,
        events,
        Duration::from_millis(config.update_interval_ms),
        shutdown_rx,
    )
    .await;

    platform.disconnect().await?;
    Ok(())
}
