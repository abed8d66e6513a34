//! Guildmate presence.
//!
//! Every download response starts with a snapshot of who in the guild is
//! running the relay. [`PresenceTracker`] keeps the last known state and
//! reports what changed.

use std::fmt;

use pgrelay_protocol::{PresenceSnapshot, UserCounts};
use serde::{Deserialize, Serialize};

/// One guildmate as last reported.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuildmatePresence {
    pub name: String,
    /// 0 offline, 1 reading, 2 or more connected.
    pub level: i32,
}

impl GuildmatePresence {
    pub fn is_connected(&self) -> bool {
        self.level > 1
    }

    pub fn is_reading(&self) -> bool {
        self.level > 0
    }
}

impl fmt::Display for GuildmatePresence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_connected() {
            write!(f, "{} (connected)", self.name)
        } else if self.is_reading() {
            write!(f, "{} (reading)", self.name)
        } else {
            f.write_str(&self.name)
        }
    }
}

/// A change in the tracked guildmate set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "change", rename_all = "camelCase")]
pub enum PresenceEvent {
    Added(GuildmatePresence),
    Updated(GuildmatePresence),
    Removed { name: String },
}

/// Last known guildmate set and user counts.
#[derive(Debug, Default)]
pub struct PresenceTracker {
    /// In first-seen order.
    guildmates: Vec<GuildmatePresence>,
    counts: UserCounts,
}

impl PresenceTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn guildmates(&self) -> &[GuildmatePresence] {
        &self.guildmates
    }

    pub fn counts(&self) -> UserCounts {
        self.counts
    }

    /// Replaces the tracked state with `snapshot`, returning the differences.
    ///
    /// Removals come first, then level updates and additions in snapshot order.
    pub fn apply(&mut self, snapshot: &PresenceSnapshot) -> Vec<PresenceEvent> {
        let mut events = Vec::new();

        self.guildmates.retain(|mate| {
            let keep = snapshot.guildmates.iter().any(|(name, _)| *name == mate.name);
            if !keep {
                events.push(PresenceEvent::Removed {
                    name: mate.name.clone(),
                });
            }
            keep
        });

        for (name, level) in &snapshot.guildmates {
            match self.guildmates.iter_mut().find(|m| m.name == *name) {
                Some(mate) => {
                    if mate.level != *level {
                        mate.level = *level;
                        events.push(PresenceEvent::Updated(mate.clone()));
                    }
                }
                None => {
                    let mate = GuildmatePresence {
                        name: name.clone(),
                        level: *level,
                    };
                    events.push(PresenceEvent::Added(mate.clone()));
                    self.guildmates.push(mate);
                }
            }
        }

        events
    }

    /// Folds the snapshot counters into the held counts.
    ///
    /// Returns the new counts when they changed.
    pub fn apply_counts(&mut self, snapshot: &PresenceSnapshot) -> Option<UserCounts> {
        let counts = snapshot.counts_over(self.counts);
        if counts == self.counts {
            return None;
        }
        self.counts = counts;
        Some(counts)
    }

    /// Forgets every guildmate, e.g. when the selected guild changes.
    pub fn clear(&mut self) -> Vec<PresenceEvent> {
        self.guildmates
            .drain(..)
            .map(|mate| PresenceEvent::Removed { name: mate.name })
            .collect()
    }
}
