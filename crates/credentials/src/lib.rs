//! Guild password store.
//!
//! Maps each played character to its guild and the guild's shared chat
//! password. The relay reads passwords by character (to encrypt outgoing
//! guild chat) or by guild (to decrypt the guild feed), and writes them back
//! when a password announcement is seen in game.

use std::path::{Path, PathBuf};
use std::sync::RwLock;

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Errors from credential persistence.
#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Settings for one character.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialEntry {
    pub name: String,
    #[serde(default)]
    pub guild_name: String,
    /// Accept password announcements seen in game for this character.
    #[serde(default)]
    pub auto_update: bool,
    #[serde(default)]
    pub password: String,
}

/// Lookup and update of guild passwords.
///
/// Passwords are returned as stored; normalization for key use is the
/// cipher's job.
pub trait CredentialStore: Send + Sync {
    /// Password of the first entry for this character with a non-empty password.
    fn password_for_character(&self, character: &str) -> Option<String>;

    /// Password of the first entry in this guild with a non-empty password.
    fn password_for_guild(&self, guild: &str) -> Option<String>;

    /// Guild the character belongs to, if known.
    fn guild_for_character(&self, character: &str) -> Option<String>;

    /// Stores an announced password for a character.
    ///
    /// Only entries flagged `auto_update` accept it. Returns whether the
    /// stored password changed.
    fn update_password(&self, character: &str, password: &str) -> Result<bool, CredentialError>;
}

/// Credential store persisted as a JSON array.
///
/// Entries are cached in memory and written through on every change.
pub struct CredentialFile {
    path: PathBuf,
    entries: RwLock<Vec<CredentialEntry>>,
}

impl CredentialFile {
    /// Opens the store, loading existing entries from disk.
    pub fn open(path: PathBuf) -> Result<Self, CredentialError> {
        let entries = load_entries(&path)?;
        Ok(Self {
            path,
            entries: RwLock::new(entries),
        })
    }

    /// Returns a copy of all entries.
    pub fn entries(&self) -> Vec<CredentialEntry> {
        self.read().clone()
    }

    /// Adds an entry, or replaces the one with the same character name.
    pub fn upsert(&self, entry: CredentialEntry) -> Result<(), CredentialError> {
        {
            let mut entries = self.write();
            match entries.iter_mut().find(|e| e.name == entry.name) {
                Some(existing) => *existing = entry,
                None => entries.push(entry),
            }
        }
        self.persist()
    }

    /// Removes the entry for a character.
    pub fn remove(&self, character: &str) -> Result<(), CredentialError> {
        self.write().retain(|e| e.name != character);
        self.persist()
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Vec<CredentialEntry>> {
        self.entries.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Vec<CredentialEntry>> {
        self.entries
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Writes the current entries to disk.
    fn persist(&self) -> Result<(), CredentialError> {
        let entries = self.read();
        let json = serde_json::to_string_pretty(&*entries)?;
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, json)?;
        debug!("persisted {} credential(s) to {:?}", entries.len(), self.path);
        Ok(())
    }
}

impl CredentialStore for CredentialFile {
    fn password_for_character(&self, character: &str) -> Option<String> {
        self.read()
            .iter()
            .find(|e| e.name == character && !e.password.is_empty())
            .map(|e| e.password.clone())
    }

    fn password_for_guild(&self, guild: &str) -> Option<String> {
        self.read()
            .iter()
            .find(|e| e.guild_name == guild && !e.password.is_empty())
            .map(|e| e.password.clone())
    }

    fn guild_for_character(&self, character: &str) -> Option<String> {
        self.read()
            .iter()
            .find(|e| e.name == character)
            .map(|e| e.guild_name.clone())
    }

    fn update_password(&self, character: &str, password: &str) -> Result<bool, CredentialError> {
        let changed = {
            let mut entries = self.write();
            match entries.iter_mut().find(|e| e.name == character) {
                Some(entry) if entry.auto_update && entry.password != password => {
                    entry.password = password.to_string();
                    true
                }
                _ => false,
            }
        };
        if changed {
            self.persist()?;
        }
        Ok(changed)
    }
}

/// Loads entries from a JSON file on disk.
fn load_entries(path: &Path) -> Result<Vec<CredentialEntry>, CredentialError> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let data = std::fs::read_to_string(path)?;
    let entries: Vec<CredentialEntry> = serde_json::from_str(&data)?;
    debug!("loaded {} credential(s) from {:?}", entries.len(), path);
    Ok(entries)
}
