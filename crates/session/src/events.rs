use pgrelay_presence::PresenceEvent;
use pgrelay_protocol::{ChatRecord, UserCounts};
use serde::Serialize;

/// Notification from the session to its consumer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum RelayEvent {
    /// The character in the chat log changed. `None` after logout.
    LoginChanged { name: Option<String> },
    /// A downloaded chat line, decrypted if it was guild chat.
    Chat(ChatRecord),
    Presence(PresenceEvent),
    Counts(UserCounts),
    /// A password announcement was stored for this character.
    PasswordUpdated { character: String },
}
