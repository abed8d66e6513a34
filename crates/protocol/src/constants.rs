//! Literals of the relay wire protocol.

/// Prefix marking meaningful lines in a download response.
pub const RESPONSE_SENTINEL: char = '*';

/// Separator between fields of a record or snapshot line.
pub const FIELD_SEPARATOR: char = '/';

/// Minimum number of `/`-separated fields in a record line.
pub const MIN_RECORD_FIELDS: usize = 9;

/// Index of the first message field in a record line.
pub const MESSAGE_FIELD: usize = 8;

/// Upload endpoint, relative to the server base URL.
pub const UPLOAD_ENDPOINT: &str = "upload_form.php";

/// Download endpoint, relative to the server base URL.
pub const DOWNLOAD_ENDPOINT: &str = "download_form.php";

/// Keep-alive endpoint, relative to the server base URL.
pub const KEEP_ALIVE_ENDPOINT: &str = "keep_alive_form.php";

/// Form field names.
pub mod form {
    pub const SESSION_ID: &str = "id";
    pub const NAME: &str = "name";
    pub const CHANNEL: &str = "channel";
    pub const GUILD_NAME: &str = "guildname";
    pub const MESSAGE: &str = "message";
    pub const HASH: &str = "hash";
    pub const CURSOR: &str = "index";
}

/// Opening delimiter of a spoiler section.
pub const SPOILER_OPEN: &str = "[[[";

/// Closing delimiter of a spoiler section.
pub const SPOILER_CLOSE: &str = "]]]";

/// Replacement text for a redacted spoiler section.
pub const SPOILER_REDACTED: &str = "[[[Spoiler]]]";
