//! Relay session.
//!
//! A [`RelaySession`] owns all per-session state (login name, download
//! cursor, guildmate presence) and drives two pipelines:
//!
//! - outbound: chat log line → parse → encrypt guild chat → upload
//! - inbound: download → decode → decrypt guild chat → [`RelayEvent`]s
//!
//! [`run`] schedules both on one cooperative loop and applies
//! [`SessionCommand`]s between ticks.

mod commands;
mod config;
mod events;
mod inbound;
mod outbound;
mod runner;
mod session;

#[cfg(test)]
mod testing;

pub use commands::SessionCommand;
pub use config::{ConfigError, DEFAULT_SERVER_URL, RelayConfig, config_dir};
pub use events::RelayEvent;
pub use outbound::is_server_announcement;
pub use runner::{DOWNLOAD_INTERVAL, EVENT_CHANNEL_CAPACITY, run};
pub use session::RelaySession;
