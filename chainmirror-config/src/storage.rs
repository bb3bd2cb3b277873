use std::path::PathBuf;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct StorageConfig {
    /// The path to the blob store database file.
    #[serde(default = "default_path")]
    pub path: PathBuf,
    /// If true, the blob store is removed on startup.
    #[serde(default)]
    pub reset: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: default_path(),
            reset: bool::default(),
        }
    }
}

fn default_path() -> PathBuf {
    PathBuf::from("chainmirror.db")
}
