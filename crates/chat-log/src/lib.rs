//! Game chat log access.
//!
//! The game appends one line per chat message to a file named after the
//! current local date. [`LogTailer`] follows that file across folder and
//! date changes; [`parse_line`] turns each raw line into a [`LineEvent`].

mod parser;
mod tailer;

pub use parser::{LOGIN_MARKER, LOGOUT_MARKER, LineEvent, parse_line};
pub use tailer::{
    FOLDER_CHECK_INTERVAL, KEEP_ALIVE_IDLE, LogTailer, POLL_INTERVAL, TailOutput,
    default_candidate_folders, log_file_name,
};
