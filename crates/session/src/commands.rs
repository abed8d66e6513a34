//! Settings changes sent into a running session.

use std::path::PathBuf;

use crate::session::RelaySession;

/// Commands sent into the session loop by the consumer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionCommand {
    /// Switch the downloaded guild feed.
    SelectGuild(String),
    /// Allow or stop uploading guild chat.
    SetGuildChatEnabled(bool),
    /// Tail another log folder, or return to the defaults with `None`.
    SetCustomLogFolder(Option<PathBuf>),
    SetDisplayGlobal(bool),
    SetDisplayHelp(bool),
    SetDisplayTrade(bool),
    /// Redact spoiler-tagged text in downloaded records.
    SetHideSpoilers(bool),
}

impl RelaySession {
    /// Applies one settings change.
    pub async fn apply(&mut self, command: SessionCommand) {
        tracing::debug!(?command, "applying session command");
        match command {
            SessionCommand::SelectGuild(name) => self.select_guild(name).await,
            SessionCommand::SetGuildChatEnabled(enabled) => self.set_guild_chat_enabled(enabled),
            SessionCommand::SetCustomLogFolder(folder) => self.set_custom_log_folder(folder),
            SessionCommand::SetDisplayGlobal(on) => self.set_display_global(on),
            SessionCommand::SetDisplayHelp(on) => self.set_display_help(on),
            SessionCommand::SetDisplayTrade(on) => self.set_display_trade(on),
            SessionCommand::SetHideSpoilers(on) => self.set_hide_spoilers(on),
        }
    }
}

#[cfg(test)]
mod tests {
    use pgrelay_protocol::constants::UPLOAD_ENDPOINT;

    use super::*;
    use crate::events::RelayEvent;
    use crate::testing::TestSession;

    #[tokio::test]
    async fn toggles_update_config() {
        let mut t = TestSession::new();
        let session = &mut t.session;

        session.apply(SessionCommand::SetDisplayGlobal(false)).await;
        session.apply(SessionCommand::SetDisplayHelp(false)).await;
        session.apply(SessionCommand::SetDisplayTrade(false)).await;
        session.apply(SessionCommand::SetHideSpoilers(true)).await;
        session.apply(SessionCommand::SetGuildChatEnabled(true)).await;
        session
            .apply(SessionCommand::SelectGuild("Knights".into()))
            .await;

        let config = session.config();
        assert!(!config.display_global);
        assert!(!config.display_help);
        assert!(!config.display_trade);
        assert!(config.hide_spoilers);
        assert!(config.guild_chat_enabled);
        assert_eq!(config.guild_name, "Knights");
        assert!(t.bulletin.requests_to(UPLOAD_ENDPOINT).is_empty());
    }

    #[tokio::test]
    async fn hidden_channel_dropped_after_toggle() {
        let mut t = TestSession::new();
        t.bulletin
            .queue_download("*0/0/0/\n*1/2024/3/15/18/0/0/Trade/Bob: selling swords\n");
        t.bulletin
            .queue_download("*0/0/0/\n*2/2024/3/15/18/0/1/Trade/Bob: still selling\n");

        t.session.tick_download().await;
        t.session.apply(SessionCommand::SetDisplayTrade(false)).await;
        t.session.tick_download().await;

        let chats: Vec<_> = t
            .drain_events()
            .into_iter()
            .filter_map(|e| match e {
                RelayEvent::Chat(chat) => Some(chat.message),
                _ => None,
            })
            .collect();
        assert_eq!(chats, vec![" selling swords"]);
        assert_eq!(t.session.client().cursor().value(), 2);
    }
}
