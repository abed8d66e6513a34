//! Wire types shared by the chat relay.
//!
//! Covers the channel taxonomy, the slash-delimited record format exchanged
//! with the remote bulletin, and the presence snapshot line that heads every
//! download response.

pub mod channel;
pub mod constants;
pub mod record;
pub mod snapshot;

pub use channel::ChannelType;
pub use record::{ChatRecord, CodecError, WireRecord};
pub use snapshot::{PresenceSnapshot, UserCounts};
