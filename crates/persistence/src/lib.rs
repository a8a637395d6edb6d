#![deny(warnings)]

//! Persistence layer: JSON save slot and player settings.
//!
//! Loading never fails hard: a missing or unreadable file is reported as
//! "nothing saved" (or default settings) and logged.

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};
use tycoon_core::GameState;

/// Returns the default save slot path used for local saves.
pub fn default_save_path() -> &'static str {
    "saves/slot1.json"
}

/// Returns the default settings file path.
pub fn default_settings_path() -> &'static str {
    "saves/settings.json"
}

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("io error: {0}")]
    Io(String),
    #[error("encode error: {0}")]
    Encode(String),
}

impl From<std::io::Error> for PersistenceError {
    fn from(e: std::io::Error) -> Self {
        PersistenceError::Io(e.to_string())
    }
}

impl From<serde_json::Error> for PersistenceError {
    fn from(e: serde_json::Error) -> Self {
        PersistenceError::Encode(e.to_string())
    }
}

/// A single save file holding the whole `GameState`.
#[derive(Clone, Debug)]
pub struct SaveSlot {
    path: PathBuf,
}

impl SaveSlot {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Write `state` as pretty JSON, replacing any previous save atomically.
    pub fn save(&self, state: &GameState) -> Result<(), PersistenceError> {
        write_json_atomic(&self.path, state)?;
        info!(path = %self.path.display(), "game saved");
        Ok(())
    }

    /// Load the saved state; `None` when absent or unreadable.
    pub fn try_load(&self) -> Option<GameState> {
        read_json(&self.path)
    }
}

impl Default for SaveSlot {
    fn default() -> Self {
        Self::new(default_save_path())
    }
}

/// Player settings consumed by the game loop.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Seconds between autosaves; 0 disables autosave.
    #[serde(default = "default_autosave_seconds")]
    pub autosave_seconds: u32,
}

fn default_autosave_seconds() -> u32 {
    30
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            autosave_seconds: default_autosave_seconds(),
        }
    }
}

impl Settings {
    /// Load settings, falling back to defaults on any problem.
    pub fn load<P: AsRef<Path>>(path: P) -> Self {
        read_json(path.as_ref()).unwrap_or_default()
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), PersistenceError> {
        write_json_atomic(path.as_ref(), self)
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Option<T> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "could not read file");
            return None;
        }
    };
    match serde_json::from_str(&text) {
        Ok(v) => Some(v),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "ignoring corrupt file");
            None
        }
    }
}

fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<(), PersistenceError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let json = serde_json::to_string_pretty(value)?;
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    fs::write(&tmp, json)?;
    fs::rename(&tmp, path)?;
    Ok(())
}
