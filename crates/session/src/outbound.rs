//! Chat log → bulletin.

use pgrelay_chat_log::{LineEvent, parse_line};
use pgrelay_guild_cipher::{GuildCipher, extract_password, integrity_hash, is_system_message};
use pgrelay_protocol::ChannelType;
use pgrelay_sync::OutgoingMessage;
use tracing::{debug, info, warn};

use crate::events::RelayEvent;
use crate::session::RelaySession;

const ANNOUNCEMENT_PREFIXES: [&str; 2] = [
    "(SYSTEM) [Announcement]: Updating your character",
    "(SYSTEM) [Announcement]: Done upgrading your character",
];

/// Server notices about character upgrades, which every player sees in Global.
pub fn is_server_announcement(message: &str) -> bool {
    ANNOUNCEMENT_PREFIXES
        .iter()
        .any(|prefix| message.starts_with(prefix))
}

impl RelaySession {
    /// Handles one raw chat log line.
    pub async fn handle_log_line(&mut self, line: &str) {
        match parse_line(line) {
            Some(LineEvent::Login(name)) => self.set_login(Some(name)).await,
            Some(LineEvent::Logout) => self.set_login(None).await,
            Some(LineEvent::Chat {
                channel, message, ..
            }) => {
                if let Some(upload) = self.prepare_upload(channel, &message).await {
                    self.client.upload(&upload).await;
                }
            }
            None => {}
        }
    }

    async fn set_login(&mut self, name: Option<String>) {
        if self.login_name == name {
            return;
        }
        info!(name = ?name, "login changed");
        self.login_name = name.clone();
        self.emit(RelayEvent::LoginChanged { name }).await;
    }

    /// Decides whether and how a chat line is uploaded.
    ///
    /// Guild chat leaves this function encrypted or not at all.
    async fn prepare_upload(
        &mut self,
        channel: ChannelType,
        message: &str,
    ) -> Option<OutgoingMessage> {
        if !channel.is_relay_eligible() {
            return None;
        }

        let mut message = message.replace('\n', "\t");
        let mut hash = String::new();

        match channel {
            ChannelType::Guild => {
                if !self.config.guild_chat_enabled {
                    return None;
                }
                let login = self.login_name.clone()?;

                if is_system_message(&message) {
                    self.accept_password(&login, &message).await;
                    return None;
                }

                let Some(password) = self.credentials.password_for_character(&login) else {
                    debug!(character = %login, "no guild password, guild line not relayed");
                    return None;
                };
                hash = integrity_hash(&message);
                message = match GuildCipher::new(&password).encrypt(&message) {
                    Ok(ciphertext) => ciphertext,
                    Err(e) => {
                        debug!(error = %e, "guild line encryption failed");
                        return None;
                    }
                };
            }
            ChannelType::Global if is_server_announcement(&message) => return None,
            _ => {}
        }

        let name = self.login_name.clone().unwrap_or_default();
        let guild_name = self
            .login_name
            .as_deref()
            .and_then(|login| self.credentials.guild_for_character(login))
            .unwrap_or_default();

        Some(OutgoingMessage {
            name,
            channel,
            guild_name,
            message,
            hash,
        })
    }

    /// Stores a password announced in guild chat.
    async fn accept_password(&mut self, login: &str, message: &str) {
        let Some(password) = extract_password(message) else {
            return;
        };
        match self.credentials.update_password(login, &password) {
            Ok(true) => {
                info!(character = %login, "guild password updated from announcement");
                self.emit(RelayEvent::PasswordUpdated {
                    character: login.to_string(),
                })
                .await;
            }
            Ok(false) => debug!(character = %login, "password announcement not applied"),
            Err(e) => warn!(character = %login, error = %e, "failed to store guild password"),
        }
    }
}
