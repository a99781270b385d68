use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use log::info;

mod config;
mod display;
mod errors;
mod identity;
mod liveness;
mod messages;
mod session;
mod transport;

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Arguments {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if std::env::var_os("RUST_LOG").is_none() {
        pretty_env_logger::formatted_builder()
            .filter_level(log::LevelFilter::Info)
            .init();
    } else {
        pretty_env_logger::init();
    }

    let args = Arguments::parse();
    let config = config::AppConfig::load(&args.config)?;

    let device = config.device.clone().unwrap_or_default();
    let display_config = config.display.clone().unwrap_or_default();
    info!(
        "Starting as {:?} device {:?}, hub at {}",
        device.role(),
        device.name(),
        config.hub.url
    );

    let mut presenter = display::Presenter::new(
        display::TerminalDisplay::stdout(display_config.columns(), display_config.rows()),
        &display_config,
    );
    presenter.startup();

    let identity = Arc::new(identity::IdentityStore::new());
    let (link, events) = transport::spawn(&config.hub);

    let emitter = liveness::LivenessEmitter::new(
        Arc::clone(&identity),
        link.clone(),
        device.role(),
        &config.liveness.clone().unwrap_or_default(),
    );
    tokio::spawn(emitter.run());

    let session = session::Session::new(device.role(), device.name(), identity, link, presenter);
    session.run(events).await;

    anyhow::bail!("hub transport stopped")
}
