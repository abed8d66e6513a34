//! Cooperative scheduler for a relay session.

use std::time::Duration;

use pgrelay_chat_log::POLL_INTERVAL;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::commands::SessionCommand;
use crate::session::RelaySession;

/// Interval between downloads.
pub const DOWNLOAD_INTERVAL: Duration = Duration::from_secs(1);

/// Suggested capacity for the session's event channel.
pub const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Drives the tail and download ticks until `cancel` fires.
///
/// Ticks never overlap: a slow request delays the next tick instead of
/// running beside it. Commands are applied between ticks; once every
/// sender is dropped the loop keeps running on its current settings. The
/// chat log is released on return.
pub async fn run(
    mut session: RelaySession,
    mut commands: mpsc::Receiver<SessionCommand>,
    cancel: CancellationToken,
) -> RelaySession {
    let mut tail = tokio::time::interval(POLL_INTERVAL);
    tail.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut download = tokio::time::interval(DOWNLOAD_INTERVAL);
    download.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut commands_open = true;

    tracing::info!(session_id = %session.client().session_id(), "relay session started");

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            command = commands.recv(), if commands_open => match command {
                Some(command) => session.apply(command).await,
                None => {
                    tracing::debug!("command channel closed");
                    commands_open = false;
                }
            },
            _ = tail.tick() => session.tick_tail().await,
            _ = download.tick() => session.tick_download().await,
        }
    }

    session.shutdown();
    tracing::info!("relay session stopped");
    session
}
