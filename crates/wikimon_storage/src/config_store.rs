use crate::error::StorageError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use uuid::Uuid;
use wikimon_domain::ConfigEntry;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preferences {
    pub log_level: String,
    pub json_logs: bool,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    preferences: Preferences,
    #[serde(default)]
    entries: Vec<ConfigEntry>,
}

/// `<config dir>/wikimon/config.toml`
pub fn default_config_path() -> Result<PathBuf, StorageError> {
    dirs::config_dir()
        .map(|dir| dir.join("wikimon").join("config.toml"))
        .ok_or(StorageError::NoConfigDir)
}

/// Preferences and config entries kept together in one TOML file.
pub struct TomlConfigStore {
    path: PathBuf,
}

impl TomlConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load_file(&self) -> Result<ConfigFile, StorageError> {
        if !self.path.exists() {
            return Ok(ConfigFile::default());
        }
        let data = std::fs::read_to_string(&self.path)?;
        let config: ConfigFile = toml::from_str(&data)?;
        Ok(config)
    }

    fn save_file(&self, config: &ConfigFile) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let data = toml::to_string_pretty(config)?;

        // Write to a sibling temp file and rename over the original
        let tmp = self.path.with_extension("toml.tmp");
        std::fs::write(&tmp, data)?;

        // Set restrictive permissions on Unix (0600 = owner read/write only)
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&tmp, std::fs::Permissions::from_mode(0o600))?;
        }

        std::fs::rename(&tmp, &self.path)?;
        tracing::debug!(path = %self.path.display(), entries = config.entries.len(), "Config saved");
        Ok(())
    }

    pub fn load_preferences(&self) -> Result<Preferences, StorageError> {
        Ok(self.load_file()?.preferences)
    }

    pub fn save_preferences(&self, prefs: &Preferences) -> Result<(), StorageError> {
        let mut config = self.load_file()?;
        config.preferences = prefs.clone();
        self.save_file(&config)
    }

    pub fn list_entries(&self) -> Result<Vec<ConfigEntry>, StorageError> {
        Ok(self.load_file()?.entries)
    }

    pub fn load_entry(&self, entry_id: Uuid) -> Result<ConfigEntry, StorageError> {
        self.load_file()?
            .entries
            .into_iter()
            .find(|e| e.entry_id == entry_id)
            .ok_or_else(|| StorageError::NotFound(entry_id.to_string()))
    }

    /// Insert the entry, replacing any stored entry with the same id.
    pub fn save_entry(&self, entry: &ConfigEntry) -> Result<(), StorageError> {
        let mut config = self.load_file()?;
        match config.entries.iter_mut().find(|e| e.entry_id == entry.entry_id) {
            Some(existing) => *existing = entry.clone(),
            None => config.entries.push(entry.clone()),
        }
        self.save_file(&config)
    }

    pub fn remove_entry(&self, entry_id: Uuid) -> Result<ConfigEntry, StorageError> {
        let mut config = self.load_file()?;
        let index = config
            .entries
            .iter()
            .position(|e| e.entry_id == entry_id)
            .ok_or_else(|| StorageError::NotFound(entry_id.to_string()))?;
        let removed = config.entries.remove(index);
        self.save_file(&config)?;
        Ok(removed)
    }
}
