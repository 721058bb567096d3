//! Centralized directory structure management for SpectraLink
//!
//! Directory layout:
//! ```text
//! spectralink_data/
//! ├── local/           # users.sqlite (roster + credentials)
//! ├── messages/        # messages.json, groups.json
//! ├── files/           # uploaded attachments, content-addressed
//! └── downloads/       # attachments saved by the CLI
//! ```

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable that overrides the data root.
pub const ROOT_ENV: &str = "SPECTRALINK_ROOT";

/// Fallback data root, relative to the working directory.
pub const DEFAULT_ROOT: &str = "spectralink_data";

#[derive(Deserialize, Debug)]
struct SpectraConfig {
    data_root: Option<PathBuf>,
}

/// Get the global configuration path
fn get_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("spectralink").join("config.json"))
}

/// Load the persistent root from config file
pub fn load_persistent_root() -> Option<PathBuf> {
    let path = get_config_path()?;
    if !path.exists() {
        return None;
    }

    match fs::read_to_string(&path) {
        Ok(content) => match serde_json::from_str::<SpectraConfig>(&content) {
            Ok(config) => config.data_root,
            Err(e) => {
                warn!("Failed to parse config file at {:?}: {}", path, e);
                None
            }
        },
        Err(e) => {
            warn!("Failed to read config file at {:?}: {}", path, e);
            None
        }
    }
}

/// Get the data root from environment, persistent config, or default
pub fn data_root() -> PathBuf {
    if let Ok(val) = std::env::var(ROOT_ENV) {
        return PathBuf::from(val);
    }

    if let Some(root) = load_persistent_root() {
        return root;
    }

    PathBuf::from(DEFAULT_ROOT)
}

/// Paths of every directory and file under one data root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataLayout {
    pub root: PathBuf,
}

impl DataLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Layout rooted at [`data_root`].
    pub fn from_env() -> Self {
        Self::new(data_root())
    }

    /// Local data directory (SQLite)
    pub fn local_dir(&self) -> PathBuf {
        self.root.join("local")
    }

    /// Roster and credential database
    pub fn users_db_path(&self) -> PathBuf {
        self.local_dir().join("users.sqlite")
    }

    /// Message and group JSON files
    pub fn messages_dir(&self) -> PathBuf {
        self.root.join("messages")
    }

    /// Uploaded attachments
    pub fn files_dir(&self) -> PathBuf {
        self.root.join("files")
    }

    /// Attachments saved by the CLI
    pub fn downloads_dir(&self) -> PathBuf {
        self.root.join("downloads")
    }

    /// Initialize the complete directory structure.
    /// Returns the canonical root.
    pub fn init_structure(&self) -> anyhow::Result<PathBuf> {
        ensure_dir(&self.root)?;
        ensure_dir(&self.local_dir())?;
        ensure_dir(&self.messages_dir())?;
        ensure_dir(&self.files_dir())?;

        let canonical = fs::canonicalize(&self.root).unwrap_or_else(|_| self.root.clone());
        info!("SpectraLink data directory initialized at: {:?}", canonical);
        Ok(canonical)
    }
}

/// Ensure a single directory exists
pub fn ensure_dir(path: &Path) -> anyhow::Result<()> {
    if !path.exists() {
        fs::create_dir_all(path)?;
        info!("Created directory: {:?}", path);
    }
    Ok(())
}
