//! Chat log line parser.
//!
//! Every line starts with a fixed-width local timestamp and a tab:
//!
//! ```text
//! 24-03-15 18:42:07\t[Global] Alice: hello
//! ```

use chrono::{DateTime, Local, TimeZone};
use pgrelay_protocol::ChannelType;

/// Width of the `YY-MM-DD hh:mm:ss\t` prefix.
const PREFIX_LEN: usize = 18;

/// Lines must be strictly longer than this to carry any content.
const MIN_LINE_LEN: usize = 20;

/// Written by the game when a character enters the world, followed by its name.
pub const LOGIN_MARKER: &str = "**************************************** Logged In As ";

/// Written by the game when the character leaves the world.
pub const LOGOUT_MARKER: &str = "**************************************** Logged Out";

/// What a log line means to the relay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineEvent {
    Login(String),
    Logout,
    Chat {
        time: DateTime<Local>,
        channel: ChannelType,
        message: String,
    },
}

/// Parses one raw log line. Returns `None` for anything that is not a
/// session marker or a message on a known channel.
pub fn parse_line(line: &str) -> Option<LineEvent> {
    if line.len() <= MIN_LINE_LEN || line.as_bytes()[PREFIX_LEN - 1] != b'\t' {
        return None;
    }

    let time = parse_prefix_time(line)?;
    let content = line.get(PREFIX_LEN..)?;

    if let Some(name) = content.strip_prefix(LOGIN_MARKER) {
        return Some(LineEvent::Login(name.to_string()));
    }
    if content == LOGOUT_MARKER {
        return Some(LineEvent::Logout);
    }

    let rest = content.strip_prefix('[')?;
    let (tag, message) = rest.split_once(']')?;
    let channel = ChannelType::classify(tag);
    if channel == ChannelType::Other {
        return None;
    }

    Some(LineEvent::Chat {
        time,
        channel,
        message: message.trim().to_string(),
    })
}

/// Reads the two-digit date and time fields at offsets 0, 3, 6, 9, 12, 15.
fn parse_prefix_time(line: &str) -> Option<DateTime<Local>> {
    let field = |at: usize| -> Option<u32> { line.get(at..at + 2)?.parse().ok() };

    let year = 2000 + field(0)? as i32;
    Local
        .with_ymd_and_hms(year, field(3)?, field(6)?, field(9)?, field(12)?, field(15)?)
        .earliest()
}
