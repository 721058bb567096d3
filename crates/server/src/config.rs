//! Server configuration and shared handler state

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use spectralink_common::DataLayout;

use crate::files::FileStore;
use crate::store::{GroupStore, MessageStore};
use crate::users::UserManager;

/// Configuration for the SpectraLink server
#[derive(Clone, Debug)]
pub struct ServerConfig {
    /// Interface to bind
    pub host: String,
    /// Port to bind
    pub port: u16,
    /// Max upload size in MB
    pub max_upload_mb: usize,
    /// bcrypt work factor
    pub bcrypt_cost: u32,
    /// Where users, messages and files live
    pub layout: DataLayout,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3001,
            max_upload_mb: 25,
            bcrypt_cost: bcrypt::DEFAULT_COST,
            layout: DataLayout::from_env(),
        }
    }
}

impl ServerConfig {
    /// Create config rooted at a custom data directory
    pub fn with_base_dir(base_dir: impl Into<std::path::PathBuf>) -> Self {
        Self {
            layout: DataLayout::new(base_dir),
            ..Self::default()
        }
    }

    /// Apply `SPECTRALINK_HOST`, `SPECTRALINK_PORT` and `SPECTRALINK_MAX_UPLOAD_MB`.
    pub fn from_env() -> anyhow::Result<Self> {
        let mut config = Self::default();
        if let Ok(host) = std::env::var("SPECTRALINK_HOST") {
            config.host = host;
        }
        if let Ok(port) = std::env::var("SPECTRALINK_PORT") {
            config.port = port
                .parse()
                .with_context(|| format!("Invalid SPECTRALINK_PORT: {}", port))?;
        }
        if let Ok(mb) = std::env::var("SPECTRALINK_MAX_UPLOAD_MB") {
            config.max_upload_mb = mb
                .parse()
                .with_context(|| format!("Invalid SPECTRALINK_MAX_UPLOAD_MB: {}", mb))?;
        }
        Ok(config)
    }

    pub fn addr(&self) -> anyhow::Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("Invalid bind address {}:{}", self.host, self.port))
    }

    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_mb * 1024 * 1024
    }

    /// Ensure all directories exist
    pub fn ensure_dirs(&self) -> anyhow::Result<()> {
        self.layout.init_structure()?;
        Ok(())
    }
}

/// App state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<UserManager>,
    pub messages: Arc<MessageStore>,
    pub groups: Arc<GroupStore>,
    pub files: Arc<FileStore>,
}

impl AppState {
    /// Open every store under the configured data root.
    pub async fn open(config: &ServerConfig) -> anyhow::Result<Self> {
        config.ensure_dirs()?;
        let layout = &config.layout;

        Ok(Self {
            users: Arc::new(UserManager::new(&layout.users_db_path(), config.bcrypt_cost).await?),
            messages: Arc::new(MessageStore::open(layout.messages_dir().join("messages.json")).await?),
            groups: Arc::new(GroupStore::open(layout.messages_dir().join("groups.json")).await?),
            files: Arc::new(FileStore::new(layout.files_dir())),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_dir_layout() {
        let config = ServerConfig::with_base_dir("/tmp/spectra");
        assert_eq!(config.port, 3001);
        assert_eq!(config.layout.files_dir(), std::path::PathBuf::from("/tmp/spectra/files"));
        assert_eq!(config.max_upload_bytes(), 25 * 1024 * 1024);
    }

    #[test]
    fn test_addr() {
        let config = ServerConfig {
            host: "127.0.0.1".into(),
            port: 4000,
            ..ServerConfig::with_base_dir("data")
        };
        assert_eq!(config.addr().unwrap().port(), 4000);
    }
}
