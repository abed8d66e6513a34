//! Chat record wire format.
//!
//! One record per line, fields separated by `/`:
//!
//! ```text
//! index/year/month/day/hour/minute/second/channel/message...
//! ```
//!
//! The timestamp is UTC. The message is everything from the ninth field on,
//! so it may itself contain `/`. Inside the message, the first `:` separates
//! the author from the spoken text and the first tab introduces a run of
//! bracketed item tags.

use chrono::{DateTime, Datelike, Local, TimeZone, Timelike, Utc};
use serde::{Deserialize, Serialize};

use crate::channel::ChannelType;
use crate::constants::{
    FIELD_SEPARATOR, MESSAGE_FIELD, MIN_RECORD_FIELDS, SPOILER_CLOSE, SPOILER_OPEN,
    SPOILER_REDACTED,
};

/// Errors from decoding a record line.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CodecError {
    #[error("expected at least {MIN_RECORD_FIELDS} fields, got {0}")]
    TooFewFields(usize),

    #[error("invalid record index {0:?}")]
    BadIndex(String),

    #[error("invalid timestamp in record {index}")]
    BadTimestamp { index: i64 },

    #[error("unrecognized channel {channel:?} in record {index}")]
    BadChannel { index: i64, channel: String },
}

/// A record line as exchanged with the remote service.
///
/// `payload` is opaque at this level: for guild records it is ciphertext.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WireRecord {
    pub index: i64,
    pub timestamp: DateTime<Utc>,
    pub channel: ChannelType,
    pub payload: String,
}

impl WireRecord {
    /// Extracts only the record index.
    ///
    /// Succeeds whenever the line has enough fields and an integer index,
    /// even if the rest of the line is malformed.
    pub fn index_of(line: &str) -> Result<i64, CodecError> {
        let fields: Vec<&str> = line.split(FIELD_SEPARATOR).collect();
        parse_index(&fields)
    }

    /// Decodes a full record line.
    pub fn decode(line: &str) -> Result<Self, CodecError> {
        let fields: Vec<&str> = line.split(FIELD_SEPARATOR).collect();
        let index = parse_index(&fields)?;

        let mut parts = [0i32; 6];
        for (slot, field) in parts.iter_mut().zip(&fields[1..7]) {
            *slot = field
                .parse()
                .map_err(|_| CodecError::BadTimestamp { index })?;
        }
        let [year, month, day, hour, minute, second] = parts;
        let timestamp = Utc
            .with_ymd_and_hms(
                year,
                month as u32,
                day as u32,
                hour as u32,
                minute as u32,
                second as u32,
            )
            .single()
            .ok_or(CodecError::BadTimestamp { index })?;

        let channel = parse_channel(fields[7]).ok_or_else(|| CodecError::BadChannel {
            index,
            channel: fields[7].to_string(),
        })?;

        let payload = fields[MESSAGE_FIELD..].join("/");

        Ok(Self {
            index,
            timestamp,
            channel,
            payload,
        })
    }

    /// Encodes this record as a line, without the response sentinel.
    pub fn encode(&self) -> String {
        let t = &self.timestamp;
        format!(
            "{}/{}/{}/{}/{}/{}/{}/{}/{}",
            self.index,
            t.year(),
            t.month(),
            t.day(),
            t.hour(),
            t.minute(),
            t.second(),
            self.channel.wire_name(),
            self.payload
        )
    }
}

fn parse_index(fields: &[&str]) -> Result<i64, CodecError> {
    if fields.len() < MIN_RECORD_FIELDS {
        return Err(CodecError::TooFewFields(fields.len()));
    }
    fields[0]
        .parse()
        .map_err(|_| CodecError::BadIndex(fields[0].to_string()))
}

/// Upper-cases the first letter of a channel token and classifies it.
fn parse_channel(token: &str) -> Option<ChannelType> {
    let mut chars = token.chars();
    let first = chars.next()?;
    if chars.clone().next().is_none() {
        return None;
    }
    let normalized: String = first.to_uppercase().chain(chars).collect();
    match ChannelType::classify(&normalized) {
        ChannelType::Other => None,
        channel => Some(channel),
    }
}

/// A chat message ready for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRecord {
    pub timestamp: DateTime<Local>,
    pub channel: ChannelType,
    /// Empty when the payload carried no `:` separator.
    pub author: String,
    pub message: String,
    /// Item tags in order, each including its brackets.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub items: Vec<String>,
}

impl ChatRecord {
    /// Builds a record from a plaintext payload.
    pub fn from_payload(
        timestamp: DateTime<Utc>,
        channel: ChannelType,
        payload: &str,
        hide_spoilers: bool,
    ) -> Self {
        let (author, body) = split_author(payload);
        let (message, items) = split_items(body);
        let message = if hide_spoilers {
            redact_spoilers(&message)
        } else {
            message
        };

        Self {
            timestamp: timestamp.with_timezone(&Local),
            channel,
            author: author.to_string(),
            message,
            items,
        }
    }

    /// Rebuilds the plaintext payload this record was decoded from.
    pub fn payload(&self) -> String {
        let mut out = String::new();
        if !self.author.is_empty() {
            out.push_str(&self.author);
            out.push(':');
        }
        out.push_str(&self.message);
        if !self.items.is_empty() {
            out.push('\t');
            out.push_str(&self.items.concat());
        }
        out
    }

    /// Wraps this record into a wire record with the given index.
    pub fn to_wire(&self, index: i64) -> WireRecord {
        WireRecord {
            index,
            timestamp: self.timestamp.with_timezone(&Utc),
            channel: self.channel,
            payload: self.payload(),
        }
    }
}

/// Splits `author:body` at the first colon. No colon means no author.
pub fn split_author(payload: &str) -> (&str, &str) {
    match payload.split_once(':') {
        Some((author, body)) => (author, body),
        None => ("", payload),
    }
}

/// Splits the spoken text from trailing item tags at the first tab.
pub fn split_items(body: &str) -> (String, Vec<String>) {
    let Some((message, mut rest)) = body.split_once('\t') else {
        return (body.to_string(), Vec::new());
    };

    let mut items = Vec::new();
    while rest.chars().count() >= 3 && rest.starts_with('[') {
        let Some(close) = rest.find(']') else {
            break;
        };
        items.push(rest[..=close].to_string());
        rest = rest[close + 1..].trim();
    }

    (message.to_string(), items)
}

/// Replaces every `[[[...]]]` section with `[[[Spoiler]]]`, left to right.
pub fn redact_spoilers(message: &str) -> String {
    let mut out = String::with_capacity(message.len());
    let mut rest = message;

    loop {
        let Some(start) = rest.find(SPOILER_OPEN) else {
            break;
        };
        let after_open = start + SPOILER_OPEN.len();
        let Some(len) = rest[after_open..].find(SPOILER_CLOSE) else {
            break;
        };
        out.push_str(&rest[..start]);
        out.push_str(SPOILER_REDACTED);
        rest = &rest[after_open + len + SPOILER_CLOSE.len()..];
    }

    out.push_str(rest);
    out
}
