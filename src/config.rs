use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::library::DEFAULT_PAGE_SIZE;

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub library: LibraryConfig,
    #[serde(default)]
    pub bridge: BridgeConfig,
    #[serde(default)]
    pub onboarding: OnboardingConfig,
}

/// Library polling and layout
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LibraryConfig {
    /// Milliseconds between polls of each game source
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,
    /// Games per page in the library grid
    #[serde(default = "default_page_size")]
    pub page_size: usize,
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval(),
            page_size: default_page_size(),
        }
    }
}

fn default_poll_interval() -> u64 {
    1000
}

fn default_page_size() -> usize {
    DEFAULT_PAGE_SIZE
}

/// Where the host process keeps its data
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BridgeConfig {
    /// Host data directory (platform data dir if unset)
    #[serde(default)]
    pub data_dir: Option<String>,
    /// Program and arguments that install game dependencies
    #[serde(default)]
    pub installer_command: Vec<String>,
}

/// Onboarding flow settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OnboardingConfig {
    /// Page opened when the browser extension is accepted
    #[serde(default = "default_extension_url")]
    pub extension_url: String,
}

impl Default for OnboardingConfig {
    fn default() -> Self {
        Self {
            extension_url: default_extension_url(),
        }
    }
}

fn default_extension_url() -> String {
    "https://ascendara.app/extension".to_string()
}

fn project_dirs() -> Result<directories::ProjectDirs> {
    directories::ProjectDirs::from("com", "shelf", "Shelf")
        .ok_or_else(|| anyhow::anyhow!("Could not determine project directories"))
}

impl Config {
    /// Get the configuration file path
    pub fn config_path() -> Result<PathBuf> {
        let dirs = project_dirs()?;
        let config_dir = dirs.config_dir();
        std::fs::create_dir_all(config_dir)?;

        Ok(config_dir.join("config.toml"))
    }

    /// Load configuration from the default location
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    /// Save configuration to the default location
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            let config: Config = toml::from_str(&content)
                .with_context(|| format!("Failed to parse {}", path.display()))?;
            tracing::info!("Loaded configuration from {:?}", path);
            Ok(config)
        } else {
            tracing::info!("No configuration file found, using defaults");
            Ok(Self::default())
        }
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        tracing::info!("Saved configuration to {:?}", path);
        Ok(())
    }

    /// Host data directory: the configured one, or the platform data dir
    pub fn data_dir(&self) -> Result<PathBuf> {
        match &self.bridge.data_dir {
            Some(dir) => Ok(PathBuf::from(dir)),
            None => Ok(project_dirs()?.data_dir().to_path_buf()),
        }
    }
}
