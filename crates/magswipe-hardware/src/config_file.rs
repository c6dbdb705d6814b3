//! Configuration file lookup on the local filesystem.

use crate::traits::ConfigFileProvider;
use magswipe_core::constants::CONFIG_FILE_NAME;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Looks for the vendor configuration file in a fixed directory.
///
/// The file is looked up on every call, so a file that appears after
/// startup (for example one downloaded by the driver) is picked up.
#[derive(Debug, Clone)]
pub struct DirectoryConfigFile {
    path: PathBuf,
}

impl DirectoryConfigFile {
    /// Look for [`CONFIG_FILE_NAME`] inside `dir`.
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            path: dir.as_ref().join(CONFIG_FILE_NAME),
        }
    }

    /// Look for an explicitly named file.
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The path that is checked.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ConfigFileProvider for DirectoryConfigFile {
    fn config_file_path(&self) -> Option<PathBuf> {
        if self.path.is_file() {
            Some(self.path.clone())
        } else {
            debug!("Configuration file {} does not exist", self.path.display());
            None
        }
    }
}
