//! Where settings and store fixtures live on disk
//!
//! By default the platform config and data directories are used, each with
//! an `nosqlb` subdirectory. Setting `NOSQLB_HOME` moves everything under
//! one directory, which keeps test runs and portable installs self-contained.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

const APP_DIR: &str = "nosqlb";
const HOME_ENV: &str = "NOSQLB_HOME";

/// Resolved application directories
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppDirs {
    pub config: PathBuf,
    pub data: PathBuf,
}

impl AppDirs {
    /// Directories from `NOSQLB_HOME`, or the platform defaults
    pub fn resolve() -> Result<Self> {
        match std::env::var_os(HOME_ENV).filter(|v| !v.is_empty()) {
            Some(home) => Ok(Self::rooted(Path::new(&home))),
            None => Ok(Self {
                config: dirs::config_dir()
                    .context("Could not determine config directory")?
                    .join(APP_DIR),
                data: dirs::data_dir()
                    .context("Could not determine data directory")?
                    .join(APP_DIR),
            }),
        }
    }

    /// Directories kept together under `base`
    pub fn rooted(base: &Path) -> Self {
        Self {
            config: base.join("config"),
            data: base.join("data"),
        }
    }

    pub fn settings_file(&self) -> PathBuf {
        self.config.join("settings.json")
    }

    pub fn fixtures(&self) -> PathBuf {
        self.data.join("fixtures")
    }

    /// Create every directory that does not exist yet
    pub fn ensure(&self) -> Result<()> {
        for dir in [&self.config, &self.data, &self.fixtures()] {
            if !dir.exists() {
                std::fs::create_dir_all(dir)
                    .with_context(|| format!("Failed to create directory: {:?}", dir))?;
                tracing::debug!(dir = ?dir, "created application directory");
            }
        }
        Ok(())
    }
}

pub fn config_dir() -> Result<PathBuf> {
    AppDirs::resolve().map(|d| d.config)
}

pub fn data_dir() -> Result<PathBuf> {
    AppDirs::resolve().map(|d| d.data)
}

/// Default location of store fixtures used by simulated connections
pub fn fixtures_dir() -> Result<PathBuf> {
    AppDirs::resolve().map(|d| d.fixtures())
}

pub fn ensure_directories() -> Result<()> {
    AppDirs::resolve()?.ensure()
}
