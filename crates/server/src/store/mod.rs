//! JSON file storage for messages and groups
//!
//! Each store keeps its records in memory behind a `RwLock` and rewrites its
//! file on every change with a temp-file-then-rename atomic write.

pub mod groups;
pub mod messages;

pub use groups::{GroupError, GroupStore, StoredGroup};
pub use messages::{MessageStore, NewMessage, ReadScope, StoredMessage};

use std::path::Path;

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::fs;

/// Read a JSON array file; a missing file is an empty store.
pub(crate) async fn load_records<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    match fs::read_to_string(path).await {
        Ok(content) => serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse {:?}", path)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
        Err(e) => Err(e).with_context(|| format!("Failed to read {:?}", path)),
    }
}

pub(crate) async fn save_records<T: Serialize>(path: &Path, records: &[T]) -> Result<()> {
    let temp_path = path.with_extension("tmp");
    let json = serde_json::to_string_pretty(records)?;

    fs::write(&temp_path, json).await?;
    // Atomic rename
    fs::rename(&temp_path, path).await?;
    Ok(())
}
