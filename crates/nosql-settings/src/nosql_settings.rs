//! NoSQL Settings
//!
//! Persistent settings for the schema browser:
//! - Result paging (page size, collection mode, cell width)
//! - Schema loading behavior
//! - Logging defaults
//! - Saved connection profiles

use anyhow::{Context, Result, bail};
use nosql_core::ConnectionProfile;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

mod settings_file;

pub use settings_file::{AppDirs, config_dir, data_dir, ensure_directories, fixtures_dir};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Settings {
    pub results: ResultsSettings,
    pub schema: SchemaSettings,
    pub logging: LogSettings,
    pub profiles: Vec<SavedProfile>,
}

impl Settings {
    /// Load from the default location, or defaults if there is no file yet
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::settings_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings from {:?}", path))?;
        let settings: Self =
            serde_json::from_str(&content).with_context(|| "Failed to parse settings JSON")?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::settings_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        self.validate()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        tracing::debug!(path = ?path, "saved settings");
        Ok(())
    }

    pub fn settings_path() -> Result<PathBuf> {
        AppDirs::resolve().map(|d| d.settings_file())
    }

    pub fn validate(&self) -> Result<()> {
        if self.results.page_size == 0 {
            bail!("results.page_size must be at least 1");
        }
        if self.results.max_cell_width < 4 {
            bail!("results.max_cell_width must be at least 4");
        }
        let mut names: Vec<String> = self.profiles.iter().map(|p| p.name.to_lowercase()).collect();
        names.sort();
        if let Some(pair) = names.windows(2).find(|w| w[0] == w[1]) {
            bail!("profile '{}' is saved more than once", pair[0]);
        }
        Ok(())
    }

    /// Save a connection profile under `name`
    ///
    /// Names compare case-insensitively. An existing profile is replaced only
    /// with `overwrite`.
    pub fn add_profile(
        &mut self,
        name: &str,
        profile: ConnectionProfile,
        overwrite: bool,
    ) -> Result<()> {
        if name.trim().is_empty() {
            bail!("profile name must not be empty");
        }
        match self.profiles.iter_mut().find(|p| p.name.eq_ignore_ascii_case(name)) {
            Some(_) if !overwrite => bail!("profile '{name}' already exists"),
            Some(existing) => existing.profile = profile,
            None => self.profiles.push(SavedProfile {
                name: name.to_string(),
                profile,
            }),
        }
        Ok(())
    }

    pub fn profile(&self, name: &str) -> Option<&ConnectionProfile> {
        self.profiles
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case(name))
            .map(|p| &p.profile)
    }

    pub fn remove_profile(&mut self, name: &str) -> Option<ConnectionProfile> {
        let pos = self
            .profiles
            .iter()
            .position(|p| p.name.eq_ignore_ascii_case(name))?;
        Some(self.profiles.remove(pos).profile)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResultsSettings {
    /// Rows per page when browsing a table
    pub page_size: usize,
    /// Show rows as primary key plus nested row data
    pub collection_mode: bool,
    /// Longest cell text before it is cut with an ellipsis
    pub max_cell_width: usize,
}

impl Default for ResultsSettings {
    fn default() -> Self {
        Self {
            page_size: 10,
            collection_mode: false,
            max_cell_width: 48,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchemaSettings {
    /// Load every table's details when a connection is opened instead of
    /// on first access
    pub refresh_on_open: bool,
}

impl Default for SchemaSettings {
    fn default() -> Self {
        Self {
            refresh_on_open: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogSettings {
    /// `EnvFilter` directive used when `RUST_LOG` is not set
    pub filter: String,
    pub format: LogFormat,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            filter: "warn".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedProfile {
    pub name: String,
    pub profile: ConnectionProfile,
}

#[cfg(test)]
mod tests;
