//! Configuration management for Agora.
//!
//! Provides TOML-based configuration with XDG-compliant paths and
//! environment variable overrides.

use crate::error::{ConfigError, ConfigResult};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use url::Url;

/// Main client-core configuration.
///
/// This is loaded from `~/.config/agora/config.toml` (or platform equivalent).
/// If the file doesn't exist, default values are used.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Origin site settings
    pub site: SiteConfig,
    /// Cookie and once-token settings
    pub session: SessionConfig,
    /// Extraction engine settings
    pub extraction: ExtractionConfig,
}

impl AppConfig {
    /// Load configuration from disk, falling back to defaults if not found.
    ///
    /// # Errors
    /// Returns error if:
    /// - Config directory cannot be determined
    /// - File exists but cannot be read
    /// - File contents are not valid TOML
    pub fn load() -> ConfigResult<Self> {
        Self::load_from(&Self::config_path()?)
    }

    /// Load configuration from an explicit path, falling back to defaults if
    /// the file does not exist.
    pub fn load_from(config_path: &Path) -> ConfigResult<Self> {
        if config_path.exists() {
            tracing::debug!("Loading config from {}", config_path.display());
            let contents = fs::read_to_string(config_path)?;
            let config: Self = toml::from_str(&contents)?;
            config.validate()?;
            Ok(config)
        } else {
            tracing::debug!("Config file not found, using defaults");
            Ok(Self::default())
        }
    }

    /// Load configuration with environment variable overrides.
    ///
    /// Supports the following environment variables:
    /// - `AGORA_BASE_URL`: Override the origin site URL
    /// - `AGORA_ONCE_HISTORY_CAP`: Override the once-token history cap
    /// - `AGORA_PERSIST_COOKIES`: Override cookie persistence (true/false)
    pub fn load_with_env() -> ConfigResult<Self> {
        let mut config = Self::load()?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Apply `AGORA_*` environment overrides in place.
    ///
    /// Values that fail to parse are ignored.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("AGORA_BASE_URL") {
            tracing::debug!("Override site.base_url from env: {}", val);
            self.site.base_url = val;
        }

        if let Ok(val) = std::env::var("AGORA_ONCE_HISTORY_CAP") {
            if let Ok(cap) = val.parse() {
                self.session.once_history_cap = cap;
                tracing::debug!("Override session.once_history_cap from env: {}", cap);
            }
        }

        if let Ok(val) = std::env::var("AGORA_PERSIST_COOKIES") {
            if let Ok(persist) = val.parse() {
                self.session.persist_cookies = persist;
                tracing::debug!("Override session.persist_cookies from env: {}", persist);
            }
        }
    }

    /// Check values that serde cannot constrain on its own.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.session.once_history_cap == 0 {
            return Err(ConfigError::InvalidValue {
                field: "session.once_history_cap".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }

        self.site.base_url()?;
        Ok(())
    }

    /// Save configuration to disk.
    ///
    /// Creates the config directory if it doesn't exist.
    pub fn save(&self) -> ConfigResult<()> {
        self.save_to(&Self::config_path()?)
    }

    /// Save configuration to an explicit path.
    pub fn save_to(&self, config_path: &Path) -> ConfigResult<()> {
        let config_dir = config_path
            .parent()
            .ok_or_else(|| ConfigError::InvalidValue {
                field: "config_path".to_string(),
                reason: "no parent directory".to_string(),
            })?;

        fs::create_dir_all(config_dir)?;
        tracing::debug!("Saving config to {}", config_path.display());

        let contents = toml::to_string_pretty(self)?;
        fs::write(config_path, contents)?;
        Ok(())
    }

    /// Get the path to the configuration file.
    ///
    /// Uses XDG base directories: `~/.config/agora/config.toml`
    pub fn config_path() -> ConfigResult<PathBuf> {
        let dirs = ProjectDirs::from("com", "agora", "agora").ok_or(ConfigError::NoConfigDir)?;
        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Get the data directory path, where persisted sessions live.
    ///
    /// Uses XDG base directories: `~/.local/share/agora`
    pub fn data_dir() -> ConfigResult<PathBuf> {
        let dirs = ProjectDirs::from("com", "agora", "agora").ok_or(ConfigError::NoConfigDir)?;
        Ok(dirs.data_dir().to_path_buf())
    }
}

/// Origin site settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    /// Base URL of the forum, e.g. `https://www.v2ex.com`
    pub base_url: String,
    /// User agent string sent by the transport
    pub user_agent: String,
}

impl SiteConfig {
    /// Parse the configured base URL.
    pub fn base_url(&self) -> ConfigResult<Url> {
        Url::parse(&self.base_url).map_err(|e| ConfigError::InvalidValue {
            field: "site.base_url".to_string(),
            reason: e.to_string(),
        })
    }
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.v2ex.com".to_string(),
            user_agent: concat!("Agora/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// Cookie and once-token settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// How many spent once-tokens to remember per session
    pub once_history_cap: usize,
    /// Whether cookies should be handed to the persistence collaborator
    pub persist_cookies: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            once_history_cap: 256,
            persist_cookies: true,
        }
    }
}

/// Extraction engine settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Trim surrounding whitespace from text reads
    pub trim_text: bool,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self { trim_text: true }
    }
}
