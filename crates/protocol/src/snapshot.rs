//! Presence snapshot line.
//!
//! The first sentinel line of every download response:
//!
//! ```text
//! registered/connected/guests/Name1=2;Name2=0;...
//! ```

use serde::{Deserialize, Serialize};

use crate::constants::FIELD_SEPARATOR;

/// Aggregate user counts reported by the remote service.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserCounts {
    pub registered: i32,
    pub connected: i32,
    pub guests: i32,
}

/// One parsed snapshot line.
///
/// Counters are `None` when their field did not parse; the previous value
/// should then be kept.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PresenceSnapshot {
    pub registered: Option<i32>,
    pub connected: Option<i32>,
    pub guests: Option<i32>,
    /// `(name, connection level)` in line order, first occurrence of a name only.
    pub guildmates: Vec<(String, i32)>,
}

impl PresenceSnapshot {
    /// Parses a snapshot line (sentinel already stripped).
    ///
    /// A line with fewer than four fields yields an empty snapshot.
    pub fn parse(line: &str) -> Self {
        let parts: Vec<&str> = line.split(FIELD_SEPARATOR).collect();
        if parts.len() < 4 {
            return Self::default();
        }

        let mut guildmates: Vec<(String, i32)> = Vec::new();
        for entry in parts[3].split(';') {
            let pair: Vec<&str> = entry.split('=').collect();
            let &[name, level] = pair.as_slice() else {
                continue;
            };
            if name.is_empty() || guildmates.iter().any(|(n, _)| n == name) {
                continue;
            }
            guildmates.push((name.to_string(), level.parse().unwrap_or(0)));
        }

        Self {
            registered: parts[0].parse().ok(),
            connected: parts[1].parse().ok(),
            guests: parts[2].parse().ok(),
            guildmates,
        }
    }

    /// Applies the parsed counters on top of the previous ones.
    pub fn counts_over(&self, previous: UserCounts) -> UserCounts {
        UserCounts {
            registered: self.registered.unwrap_or(previous.registered),
            connected: self.connected.unwrap_or(previous.connected),
            guests: self.guests.unwrap_or(previous.guests),
        }
    }
}
