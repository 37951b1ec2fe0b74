//! Persisted user preferences
//!
//! The one durable flag in the system: the hydration reminder opt-in.
//! Stored as a small TOML file in the platform data directory.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::Result;

/// Persisted preferences
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct Preferences {
    /// Whether hydration reminders are opted in
    #[serde(default)]
    pub reminder_enabled: bool,
}

impl Preferences {
    /// Path of the prefs file inside the data directory
    #[must_use]
    pub fn path(data_dir: &Path) -> PathBuf {
        data_dir.join("prefs.toml")
    }

    /// Load preferences, defaulting when the file does not exist
    ///
    /// # Errors
    ///
    /// Returns error if the file exists but cannot be read or parsed
    pub fn load(data_dir: &Path) -> Result<Self> {
        let path = Self::path(data_dir);
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&raw)?)
    }

    /// Persist preferences, creating the data directory if needed
    ///
    /// # Errors
    ///
    /// Returns error if the directory or file cannot be written
    pub fn save(&self, data_dir: &Path) -> Result<()> {
        std::fs::create_dir_all(data_dir)?;
        let raw = toml::to_string_pretty(self)
            .map_err(|e| crate::Error::Config(e.to_string()))?;
        std::fs::write(Self::path(data_dir), raw)?;
        Ok(())
    }
}
