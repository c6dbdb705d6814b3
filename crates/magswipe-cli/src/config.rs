//! Demo configuration file.
//!
//! ```toml
//! [session]
//! verbose_logging = false
//! reader_kind = "UM_II"
//!
//! [storage]
//! database_path = "data/magswipe.db"
//!
//! [driver]
//! config_file = "data/IDT_uniMagCfg.xml"
//!
//! [logging]
//! level = "info"
//! ```
//!
//! Every field is optional; a missing file yields the defaults.

use magswipe_core::constants::CONFIG_FILE_NAME;
use magswipe_session::SessionConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error reading config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub session: SessionConfig,
    pub storage: StorageSection,
    pub driver: DriverSection,
    pub logging: LoggingSection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageSection {
    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriverSection {
    /// Vendor configuration file handed to the driver.
    #[serde(default = "default_config_file")]
    pub config_file: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingSection {
    /// Default `tracing` filter; `RUST_LOG` takes precedence.
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_database_path() -> PathBuf {
    PathBuf::from("data/magswipe.db")
}

fn default_config_file() -> PathBuf {
    Path::new("data").join(CONFIG_FILE_NAME)
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for StorageSection {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
        }
    }
}

impl Default for DriverSection {
    fn default() -> Self {
        Self {
            config_file: default_config_file(),
        }
    }
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl AppConfig {
    /// Load `path`, falling back to defaults if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] for read failures other than "not found"
    /// and [`ConfigError::Parse`] for malformed TOML.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => Ok(toml::from_str(&content)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(source) => Err(ConfigError::Io {
                path: path.to_path_buf(),
                source,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use magswipe_core::ReaderKind;

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::load(&dir.path().join("absent.toml")).unwrap();

        assert_eq!(config, AppConfig::default());
        assert_eq!(config.logging.level, "info");
        assert_eq!(
            config.driver.config_file,
            PathBuf::from("data/IDT_uniMagCfg.xml")
        );
    }

    #[test]
    fn test_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("magswipe.toml");
        std::fs::write(
            &path,
            "[session]\nreader_kind = \"SHUTTLE\"\n\n[logging]\nlevel = \"debug\"\n",
        )
        .unwrap();

        let config = AppConfig::load(&path).unwrap();
        assert_eq!(config.session.reader_kind, Some(ReaderKind::Shuttle));
        assert_eq!(config.session.command_capacity, 100);
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.storage, StorageSection::default());
    }

    #[test]
    fn test_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("magswipe.toml");
        std::fs::write(&path, "[session\n").unwrap();

        assert!(matches!(AppConfig::load(&path), Err(ConfigError::Parse(_))));
    }
}
