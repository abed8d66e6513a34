//! Bulletin → consumer.

use pgrelay_guild_cipher::GuildCipher;
use pgrelay_protocol::{ChannelType, ChatRecord, WireRecord};
use tracing::debug;

use crate::events::RelayEvent;
use crate::session::RelaySession;

impl RelaySession {
    /// Downloads new records and presence, emitting events in response order.
    ///
    /// A failed request changes nothing and is retried on the next tick.
    pub async fn tick_download(&mut self) {
        let guild_name = self.config.guild_name.clone();
        let batch = match self.client.download(&guild_name).await {
            Ok(batch) => batch,
            Err(e) => {
                debug!(error = %e, "download skipped");
                return;
            }
        };

        if let Some(snapshot) = &batch.snapshot {
            for event in self.presence.apply(snapshot) {
                self.emit(RelayEvent::Presence(event)).await;
            }
            if let Some(counts) = self.presence.apply_counts(snapshot) {
                self.emit(RelayEvent::Counts(counts)).await;
            }
        }

        for record in &batch.records {
            if let Some(chat) = self.open_record(record, &guild_name) {
                self.emit(RelayEvent::Chat(chat)).await;
            }
        }
    }

    /// Turns a wire record into a displayable one, or drops it.
    fn open_record(&self, record: &WireRecord, guild_name: &str) -> Option<ChatRecord> {
        if !self.config.displays(record.channel) {
            return None;
        }

        let payload = if record.channel == ChannelType::Guild {
            let password = (!guild_name.is_empty())
                .then(|| self.credentials.password_for_guild(guild_name))
                .flatten();
            let Some(password) = password else {
                debug!(index = record.index, "no password for guild record");
                return None;
            };
            match GuildCipher::new(&password).decrypt(&record.payload) {
                Ok(plaintext) => plaintext,
                Err(e) => {
                    debug!(index = record.index, error = %e, "guild record not decrypted");
                    return None;
                }
            }
        } else {
            record.payload.clone()
        };

        Some(ChatRecord::from_payload(
            record.timestamp,
            record.channel,
            &payload,
            self.config.hide_spoilers,
        ))
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use pgrelay_presence::{GuildmatePresence, PresenceEvent};
    use pgrelay_protocol::UserCounts;

    use super::*;
    use crate::testing::TestSession;

    fn wire(index: i64, channel: ChannelType, payload: &str) -> String {
        let record = WireRecord {
            index,
            timestamp: Utc.with_ymd_and_hms(2024, 3, 15, 18, 0, 0).unwrap(),
            channel,
            payload: payload.to_string(),
        };
        format!("*{}", record.encode())
    }

    fn chats(events: &[RelayEvent]) -> Vec<&ChatRecord> {
        events
            .iter()
            .filter_map(|e| match e {
                RelayEvent::Chat(chat) => Some(chat),
                _ => None,
            })
            .collect()
    }

    #[tokio::test]
    async fn records_emitted_in_order() {
        let mut t = TestSession::new();
        t.bulletin.queue_download(format!(
            "*0/0/0/\n{}\n{}\n",
            wire(3, ChannelType::Global, "Alice:hi\t[Sword]"),
            wire(4, ChannelType::Trade, "Bob:wts"),
        ));
        t.session.tick_download().await;

        let events = t.drain_events();
        let chats = chats(&events);
        assert_eq!(chats.len(), 2);
        assert_eq!(chats[0].author, "Alice");
        assert_eq!(chats[0].message, "hi");
        assert_eq!(chats[0].items, vec!["[Sword]"]);
        assert_eq!(chats[1].channel, ChannelType::Trade);
        assert_eq!(t.session.client().cursor().value(), 5);
    }

    #[tokio::test]
    async fn gated_channel_dropped_but_cursor_advances() {
        let mut t = TestSession::new();
        t.session.config.display_global = false;
        t.bulletin
            .queue_download(format!("*0/0/0/\n{}\n", wire(9, ChannelType::Global, "A:x")));
        t.session.tick_download().await;

        assert!(chats(&t.drain_events()).is_empty());
        assert_eq!(t.session.client().cursor().value(), 10);
    }

    #[tokio::test]
    async fn guild_record_decrypted_with_selected_guild_password() {
        let mut t = TestSession::new();
        t.add_credentials("Alice", "Knights", false, "secret");
        t.session.select_guild("Knights").await;

        let ciphertext = GuildCipher::new("secret").encrypt("Carol:see you").unwrap();
        t.bulletin.queue_download(format!(
            "*0/0/0/\n{}\n{}\n",
            wire(1, ChannelType::Guild, &ciphertext),
            wire(2, ChannelType::Guild, "not-ciphertext"),
        ));
        t.session.tick_download().await;

        let events = t.drain_events();
        let chats = chats(&events);
        assert_eq!(chats.len(), 1);
        assert_eq!(chats[0].author, "Carol");
        assert_eq!(chats[0].message, "see you");
        assert_eq!(t.session.client().cursor().value(), 3);
    }

    #[tokio::test]
    async fn guild_record_dropped_without_password() {
        let mut t = TestSession::new();
        t.session.select_guild("Knights").await;
        let ciphertext = GuildCipher::new("secret").encrypt("Carol:hi").unwrap();
        t.bulletin
            .queue_download(format!("*0/0/0/\n{}\n", wire(1, ChannelType::Guild, &ciphertext)));
        t.session.tick_download().await;

        assert!(chats(&t.drain_events()).is_empty());
    }

    #[tokio::test]
    async fn spoilers_hidden_when_configured() {
        let mut t = TestSession::new();
        t.session.config.hide_spoilers = true;
        t.bulletin.queue_download(format!(
            "*0/0/0/\n{}\n",
            wire(1, ChannelType::Help, "Dan:the boss is [[[a dragon]]]!")
        ));
        t.session.tick_download().await;

        let events = t.drain_events();
        assert_eq!(chats(&events)[0].message, "the boss is [[[Spoiler]]]!");
    }

    #[tokio::test]
    async fn presence_and_counts() {
        let mut t = TestSession::new();
        t.bulletin.queue_download("*12/3/1/Alice=2;Bob=1\n");
        t.bulletin.queue_download("*12/3/1/Bob=2\n");
        t.session.tick_download().await;
        t.session.tick_download().await;

        let alice = GuildmatePresence {
            name: "Alice".into(),
            level: 2,
        };
        let bob = |level| GuildmatePresence {
            name: "Bob".into(),
            level,
        };
        assert_eq!(
            t.drain_events(),
            vec![
                RelayEvent::Presence(PresenceEvent::Added(alice)),
                RelayEvent::Presence(PresenceEvent::Added(bob(1))),
                RelayEvent::Counts(UserCounts {
                    registered: 12,
                    connected: 3,
                    guests: 1
                }),
                RelayEvent::Presence(PresenceEvent::Removed {
                    name: "Alice".into()
                }),
                RelayEvent::Presence(PresenceEvent::Updated(bob(2))),
            ]
        );
    }

    #[tokio::test]
    async fn failed_download_keeps_presence() {
        let mut t = TestSession::new();
        t.bulletin.queue_download("*1/1/0/Alice=1\n");
        t.bulletin.queue_failure();
        t.session.tick_download().await;
        t.session.tick_download().await;

        assert_eq!(t.session.presence().guildmates().len(), 1);
        assert!(t.session.client().cursor().is_unset());
    }

    #[tokio::test]
    async fn download_sends_selected_guild_and_cursor() {
        let mut t = TestSession::new();
        t.session.select_guild("Knights").await;
        t.bulletin
            .queue_download(format!("*0/0/0/\n{}\n", wire(41, ChannelType::Help, "x")));
        t.session.tick_download().await;
        t.session.tick_download().await;

        let downloads = t.bulletin.requests_to(pgrelay_protocol::constants::DOWNLOAD_ENDPOINT);
        assert_eq!(downloads[0][1], ("guildname", "Knights".to_string()));
        assert_eq!(downloads[0][2], ("index", "-1".to_string()));
        assert_eq!(downloads[1][2], ("index", "42".to_string()));
    }
}
