//! Guild channel confidentiality.
//!
//! Guild messages leave the relay encrypted with a password shared by the
//! guild, and come back through [`GuildCipher::decrypt`]. The password is
//! distributed in game by the guild leader; [`exchange`] recognizes those
//! announcements.

pub mod cipher;
pub mod error;
pub mod exchange;
pub mod hash;

pub use cipher::{GuildCipher, MIN_PASSWORD_LEN, normalize_password};
pub use error::CipherError;
pub use exchange::{extract_password, is_system_message};
pub use hash::integrity_hash;
