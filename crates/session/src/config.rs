//! Relay configuration.
//!
//! Stored as TOML:
//! - Linux: `$XDG_CONFIG_HOME/pgrelay/relay.toml` (or `~/.config/...`)
//! - Windows: `%APPDATA%/pgrelay/relay.toml`

use std::path::{Path, PathBuf};

use pgrelay_protocol::ChannelType;
use serde::{Deserialize, Serialize};

/// Bulletin the relay talks to unless configured otherwise.
pub const DEFAULT_SERVER_URL: &str = "http://www.enu.numbatsoft.com/pgmessenger/";

const CONFIG_FILE: &str = "relay.toml";
const CREDENTIALS_FILE: &str = "credentials.json";

/// Errors from loading or saving the configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Relay configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayConfig {
    /// Identifies this install to the bulletin. Generated on first load.
    #[serde(default)]
    pub session_id: String,

    /// Base URL the endpoint names are appended to.
    #[serde(default = "default_server_url")]
    pub server_url: String,

    /// Read the chat log from this folder instead of the game's defaults.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_log_folder: Option<PathBuf>,

    /// Relay guild chat (encrypted) in both directions.
    #[serde(default)]
    pub guild_chat_enabled: bool,

    #[serde(default = "default_true")]
    pub display_global: bool,

    #[serde(default = "default_true")]
    pub display_help: bool,

    #[serde(default = "default_true")]
    pub display_trade: bool,

    /// Replace `[[[...]]]` sections in downloaded chat.
    #[serde(default)]
    pub hide_spoilers: bool,

    /// Guild whose feed is downloaded and decrypted.
    #[serde(default)]
    pub guild_name: String,

    /// Overrides the credential store location.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credentials_path: Option<PathBuf>,
}

fn default_server_url() -> String {
    DEFAULT_SERVER_URL.into()
}

fn default_true() -> bool {
    true
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            session_id: new_session_id(),
            server_url: default_server_url(),
            custom_log_folder: None,
            guild_chat_enabled: false,
            display_global: true,
            display_help: true,
            display_trade: true,
            hide_spoilers: false,
            guild_name: String::new(),
            credentials_path: None,
        }
    }
}

impl RelayConfig {
    /// Loads the configuration from the default location.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&config_dir().join(CONFIG_FILE))
    }

    /// Loads the configuration, writing defaults if the file is missing.
    ///
    /// A file without a session id gets one and is rewritten.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            let config = Self::default();
            config.save_to(path)?;
            return Ok(config);
        }

        let content = std::fs::read_to_string(path)?;
        let mut config: RelayConfig = toml::from_str(&content)?;
        if config.session_id.is_empty() {
            config.session_id = new_session_id();
            config.save_to(path)?;
        }
        Ok(config)
    }

    /// Saves the configuration to the default location.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&config_dir().join(CONFIG_FILE))
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))?;
        }

        tracing::debug!(path = %path.display(), "configuration saved");
        Ok(())
    }

    /// Where guild passwords are kept.
    pub fn credentials_file(&self) -> PathBuf {
        self.credentials_path
            .clone()
            .unwrap_or_else(|| config_dir().join(CREDENTIALS_FILE))
    }

    /// Whether downloaded chat on `channel` should be shown.
    pub fn displays(&self, channel: ChannelType) -> bool {
        match channel {
            ChannelType::Global => self.display_global,
            ChannelType::Help => self.display_help,
            ChannelType::Trade => self.display_trade,
            ChannelType::Other => false,
            _ => true,
        }
    }
}

fn new_session_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Platform configuration directory for the relay.
pub fn config_dir() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        let appdata =
            std::env::var("APPDATA").unwrap_or_else(|_| "C:\\Users\\Default\\AppData".into());
        PathBuf::from(appdata).join("pgrelay")
    }

    #[cfg(not(target_os = "windows"))]
    {
        if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME")
            && !xdg.is_empty()
        {
            return PathBuf::from(xdg).join("pgrelay");
        }
        let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".into());
        PathBuf::from(home).join(".config").join("pgrelay")
    }
}
