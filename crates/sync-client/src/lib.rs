//! Client for the relay bulletin.
//!
//! The remote side exposes three form-POST endpoints: upload one chat line,
//! download everything past a cursor, and a bare keep-alive. Requests go
//! through a [`RelayTransport`] so pipelines can be tested without a server.

mod client;
mod cursor;
mod error;
mod transport;

pub use client::{DownloadBatch, OutgoingMessage, SyncClient, parse_response};
pub use cursor::SyncCursor;
pub use error::SyncError;
pub use transport::{HttpTransport, REQUEST_TIMEOUT, RelayTransport};
