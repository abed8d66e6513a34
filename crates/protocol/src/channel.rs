use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Chat channel a log line or wire record belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChannelType {
    Global,
    Trade,
    Help,
    Guild,
    Nearby,
    #[serde(rename = "NPC Chatter")]
    NpcChatter,
    Status,
    Error,
    /// Anything the relay does not recognize. Never displayed or relayed.
    Other,
}

impl ChannelType {
    /// Classifies a channel tag as written in the game log (`Global`, `NPC Chatter`, ...).
    pub fn classify(tag: &str) -> Self {
        match tag {
            "Global" => Self::Global,
            "Trade" => Self::Trade,
            "Help" => Self::Help,
            "Guild" => Self::Guild,
            "Nearby" => Self::Nearby,
            "NPC Chatter" => Self::NpcChatter,
            "Status" => Self::Status,
            "Error" => Self::Error,
            _ => Self::Other,
        }
    }

    /// Name used for this channel in upload requests and record lines.
    pub fn wire_name(self) -> &'static str {
        match self {
            Self::Global => "Global",
            Self::Trade => "Trade",
            Self::Help => "Help",
            Self::Guild => "Guild",
            Self::Nearby => "Nearby",
            Self::NpcChatter => "NPCChatter",
            Self::Status => "Status",
            Self::Error => "Error",
            Self::Other => "Other",
        }
    }

    /// Whether messages on this channel may be forwarded to the remote service.
    pub fn is_relay_eligible(self) -> bool {
        matches!(self, Self::Global | Self::Trade | Self::Help | Self::Guild)
    }

    /// Whether this channel carries end-to-end encrypted content.
    pub fn is_encrypted(self) -> bool {
        self == Self::Guild
    }
}

impl fmt::Display for ChannelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name())
    }
}

impl FromStr for ChannelType {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::classify(s))
    }
}
