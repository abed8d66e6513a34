//! In-game password announcements.
//!
//! A guild leader shares the current password by posting a system message
//! in guild chat that contains `PgMessenger: <password>`. The game renders
//! it with a `(SYSTEM)` prefix (older clients used `-SYSTEM-`) and sometimes
//! wraps the text in quotes.

/// Prefix of system-originated guild messages.
pub const SYSTEM_PREFIX: &str = "(SYSTEM)";

/// Prefix used by older game clients.
pub const LEGACY_SYSTEM_PREFIX: &str = "-SYSTEM-";

/// Token announcing the password.
pub const PASSWORD_KEYWORD: &str = "PgMessenger:";

/// Whether a guild message is a system message.
///
/// System messages are never relayed or displayed as chat.
pub fn is_system_message(message: &str) -> bool {
    message.starts_with(SYSTEM_PREFIX) || message.starts_with(LEGACY_SYSTEM_PREFIX)
}

/// Extracts the announced password from a system guild message.
///
/// Returns `None` for non-system messages and for system messages that do
/// not carry the keyword. The password is the first whitespace-delimited
/// token after the keyword, and may be empty.
pub fn extract_password(message: &str) -> Option<String> {
    if !is_system_message(message) {
        return None;
    }

    let message = message.strip_suffix('"').unwrap_or(message);
    let start = message.find(PASSWORD_KEYWORD)? + PASSWORD_KEYWORD.len();
    let password = message[start..]
        .trim_start()
        .split(char::is_whitespace)
        .next()
        .unwrap_or_default();

    Some(password.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_after_keyword() {
        assert_eq!(
            extract_password("(SYSTEM) Guild MOTD: PgMessenger: s3cret welcome all"),
            Some("s3cret".into())
        );
    }

    #[test]
    fn legacy_prefix_and_trailing_quote() {
        assert_eq!(
            extract_password("-SYSTEM- MOTD \"PgMessenger:   hunter2\""),
            Some("hunter2".into())
        );
    }

    #[test]
    fn keyword_at_end_gives_empty_password() {
        assert_eq!(extract_password("(SYSTEM) PgMessenger:"), Some(String::new()));
    }

    #[test]
    fn system_message_without_keyword() {
        assert!(is_system_message("(SYSTEM) Bob has joined the guild"));
        assert_eq!(extract_password("(SYSTEM) Bob has joined the guild"), None);
    }

    #[test]
    fn ordinary_chat_ignored() {
        assert!(!is_system_message("Alice: PgMessenger: fake"));
        assert_eq!(extract_password("Alice: PgMessenger: fake"), None);
    }
}
