//! Chat relay entry point.

mod app;
mod commands;

use pgrelay_session::RelayConfig;
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    // Logs go to stderr; stdout carries the event stream.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "starting chat relay");

    let config = RelayConfig::load()?;
    tracing::info!(
        server = %config.server_url,
        guild = %config.guild_name,
        guild_chat = config.guild_chat_enabled,
        "configuration loaded"
    );

    let rt = tokio::runtime::Runtime::new()?;
    let result = rt.block_on(app::run(config));
    // The stdin reader blocks in a thread that cannot be cancelled.
    rt.shutdown_background();
    result?;

    tracing::info!("relay shut down cleanly");
    Ok(())
}
