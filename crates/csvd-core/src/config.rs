//! Store configuration.

use std::path::PathBuf;

/// Upper bound on name generation attempts before giving up.
pub const MAX_NAME_ATTEMPTS: usize = 64;

/// Table store configuration.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Directory holding one CSV file per table (None for memory-only).
    pub data_dir: Option<PathBuf>,
    /// Maximum attempts when generating a fresh table name.
    pub max_name_attempts: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            max_name_attempts: MAX_NAME_ATTEMPTS,
        }
    }
}

impl StoreConfig {
    /// Creates a memory-only configuration.
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Creates a configuration persisting tables under `path`.
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: Some(path.into()),
            ..Default::default()
        }
    }

    /// Returns true if tables are written to disk.
    pub fn is_persistent(&self) -> bool {
        self.data_dir.is_some()
    }
}
