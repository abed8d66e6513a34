use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use chrono::NaiveDate;
use pgrelay_chat_log::LogTailer;
use pgrelay_credentials::CredentialStore;
use pgrelay_presence::PresenceTracker;
use pgrelay_sync::SyncClient;
use tokio::sync::mpsc;

use crate::config::RelayConfig;
use crate::events::RelayEvent;

/// All state of one relay session.
///
/// Owned by the runner and only touched from one poll step at a time.
pub struct RelaySession {
    pub(crate) config: RelayConfig,
    pub(crate) tailer: LogTailer,
    pub(crate) client: SyncClient,
    pub(crate) credentials: Arc<dyn CredentialStore>,
    pub(crate) presence: PresenceTracker,
    pub(crate) login_name: Option<String>,
    events: mpsc::Sender<RelayEvent>,
}

impl RelaySession {
    pub fn new(
        config: RelayConfig,
        tailer: LogTailer,
        client: SyncClient,
        credentials: Arc<dyn CredentialStore>,
        events: mpsc::Sender<RelayEvent>,
    ) -> Self {
        Self {
            config,
            tailer,
            client,
            credentials,
            presence: PresenceTracker::new(),
            login_name: None,
            events,
        }
    }

    pub fn config(&self) -> &RelayConfig {
        &self.config
    }

    /// Character currently logged in according to the chat log.
    pub fn login_name(&self) -> Option<&str> {
        self.login_name.as_deref()
    }

    pub fn presence(&self) -> &PresenceTracker {
        &self.presence
    }

    pub fn client(&self) -> &SyncClient {
        &self.client
    }

    /// Points the tailer at another log folder, or back to the defaults.
    pub fn set_custom_log_folder(&mut self, folder: Option<PathBuf>) {
        self.tailer.set_custom_folder(folder.clone());
        self.config.custom_log_folder = folder;
    }

    /// Switches the downloaded guild feed. Known guildmates are dropped.
    pub async fn select_guild(&mut self, guild_name: impl Into<String>) {
        let guild_name = guild_name.into();
        if guild_name == self.config.guild_name {
            return;
        }
        tracing::info!(guild = %guild_name, "selected guild changed");
        self.config.guild_name = guild_name;
        for event in self.presence.clear() {
            self.emit(RelayEvent::Presence(event)).await;
        }
    }

    pub fn set_guild_chat_enabled(&mut self, enabled: bool) {
        self.config.guild_chat_enabled = enabled;
    }

    pub fn set_display_global(&mut self, on: bool) {
        self.config.display_global = on;
    }

    pub fn set_display_help(&mut self, on: bool) {
        self.config.display_help = on;
    }

    pub fn set_display_trade(&mut self, on: bool) {
        self.config.display_trade = on;
    }

    /// Applies to records downloaded from now on.
    pub fn set_hide_spoilers(&mut self, on: bool) {
        self.config.hide_spoilers = on;
    }

    /// Reads new chat log lines and forwards them.
    pub async fn tick_tail(&mut self) {
        let output = self.tailer.poll();
        self.process_tail(output).await;
    }

    /// [`tick_tail`](Self::tick_tail) with an explicit date and clock.
    pub async fn tick_tail_at(&mut self, today: NaiveDate, now: Instant) {
        let output = self.tailer.poll_at(today, now);
        self.process_tail(output).await;
    }

    async fn process_tail(&mut self, output: pgrelay_chat_log::TailOutput) {
        for line in &output.lines {
            self.handle_log_line(line).await;
        }
        if output.keep_alive_due && self.login_name.is_some() {
            self.client.keep_alive().await;
        }
    }

    /// Releases the chat log.
    pub fn shutdown(&mut self) {
        self.tailer.close();
    }

    pub(crate) async fn emit(&self, event: RelayEvent) {
        if self.events.send(event).await.is_err() {
            tracing::trace!("event receiver dropped");
        }
    }
}
