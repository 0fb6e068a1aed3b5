//! Application configuration.
//!
//! Values come from an optional TOML file; anything unset falls back to
//! per-user data directories.

use crate::db::DEFAULT_DB_FILE_NAME;
use crate::logging::default_log_level;
use crate::speech::SpeechSettings;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

const APP_DIR_NAME: &str = "todo";
const CONFIG_FILE_NAME: &str = "config.toml";
const LOG_DIR_NAME: &str = "logs";

#[derive(Debug)]
pub enum ConfigError {
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    /// No data directory could be determined for this user.
    NoDataDir,
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Read { path, source } => {
                write!(f, "failed to read config `{}`: {source}", path.display())
            }
            Self::Parse { path, source } => {
                write!(f, "failed to parse config `{}`: {source}", path.display())
            }
            Self::NoDataDir => write!(f, "could not determine a data directory"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Read { source, .. } => Some(source),
            Self::Parse { source, .. } => Some(source),
            Self::NoDataDir => None,
        }
    }
}

/// On-disk configuration. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub database_path: Option<PathBuf>,
    pub log_level: Option<String>,
    pub log_dir: Option<PathBuf>,
    pub speech: SpeechSettings,
}

impl AppConfig {
    /// Default config location: `<config_dir>/todo/config.toml`.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    pub fn from_toml_str(path: &Path, raw: &str) -> Result<Self, ConfigError> {
        toml::from_str(raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Reads `path`, failing when it does not exist.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(path, &raw)
    }

    /// Reads the default config file; a missing file yields defaults.
    pub fn load_default() -> Result<Self, ConfigError> {
        match Self::default_path() {
            Some(path) if path.is_file() => Self::load_from(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Resolves every optional field against the user's data directory.
    pub fn resolve(self) -> Result<ResolvedConfig, ConfigError> {
        let data_dir = || {
            dirs::data_local_dir()
                .map(|dir| dir.join(APP_DIR_NAME))
                .ok_or(ConfigError::NoDataDir)
        };

        let database_path = match self.database_path {
            Some(path) => path,
            None => data_dir()?.join(DEFAULT_DB_FILE_NAME),
        };
        let log_dir = match self.log_dir {
            Some(path) => path,
            None => data_dir()?.join(LOG_DIR_NAME),
        };

        Ok(ResolvedConfig {
            database_path,
            log_level: self
                .log_level
                .unwrap_or_else(|| default_log_level().to_string()),
            log_dir,
            speech: self.speech,
        })
    }
}

/// Configuration with every default applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedConfig {
    pub database_path: PathBuf,
    pub log_level: String,
    pub log_dir: PathBuf,
    pub speech: SpeechSettings,
}
