//! Wires the relay session together and prints its events.

use std::io::Write;
use std::sync::Arc;

use anyhow::Context;
use pgrelay_chat_log::{LogTailer, default_candidate_folders};
use pgrelay_credentials::CredentialFile;
use pgrelay_session::{EVENT_CHANNEL_CAPACITY, RelayConfig, RelayEvent, RelaySession};
use pgrelay_sync::{HttpTransport, SyncClient};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::commands;

const COMMAND_CHANNEL_CAPACITY: usize = 16;

/// Runs the relay until Ctrl+C.
pub async fn run(config: RelayConfig) -> anyhow::Result<()> {
    let cancel = CancellationToken::new();

    let credentials_path = config.credentials_file();
    let credentials = Arc::new(
        CredentialFile::open(credentials_path.clone())
            .with_context(|| format!("loading credentials from {}", credentials_path.display()))?,
    );
    tracing::info!(
        path = %credentials_path.display(),
        characters = credentials.entries().len(),
        "credentials loaded"
    );

    let tailer = LogTailer::new(default_candidate_folders(), config.custom_log_folder.clone());
    let client = SyncClient::new(
        Box::new(HttpTransport::new(config.server_url.clone())),
        config.session_id.clone(),
    );

    let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
    let (command_tx, command_rx) = mpsc::channel(COMMAND_CHANNEL_CAPACITY);
    let session = RelaySession::new(config, tailer, client, credentials, tx);

    let printer = tokio::spawn(print_events(rx));
    tokio::spawn(async move {
        if let Err(e) = commands::read_commands(command_tx).await {
            tracing::warn!(error = %e, "stopped reading commands");
        }
    });
    let relay = tokio::spawn(pgrelay_session::run(session, command_rx, cancel.clone()));

    tokio::signal::ctrl_c().await?;
    tracing::info!("SIGINT received, shutting down");
    cancel.cancel();

    // Dropping the session closes the event channel and ends the printer.
    drop(relay.await?);
    printer.await??;
    Ok(())
}

/// Writes each event as one JSON line on stdout.
async fn print_events(mut rx: mpsc::Receiver<RelayEvent>) -> anyhow::Result<()> {
    while let Some(event) = rx.recv().await {
        let line = serde_json::to_string(&event)?;
        let mut out = std::io::stdout().lock();
        writeln!(out, "{line}")?;
        out.flush()?;
    }
    Ok(())
}
