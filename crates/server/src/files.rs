//! Content-addressed attachment storage
//!
//! Layout under the files directory:
//! ```text
//! files/<sha256>/<filename>
//! files/<sha256>.json      # { filename, content_type, size }
//! ```
//! The locator handed back to clients is `/files/<sha256>/<filename>`.

use std::path::PathBuf;

use anyhow::{Context, Result};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tokio::fs;
use tracing::info;

pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileMeta {
    pub hash: String,
    pub filename: String,
    pub content_type: String,
    pub size: u64,
}

impl FileMeta {
    pub fn locator(&self) -> String {
        format!("/files/{}/{}", self.hash, self.filename)
    }
}

pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub async fn put(
        &self,
        filename: &str,
        content_type: Option<&str>,
        data: Bytes,
    ) -> Result<FileMeta> {
        let mut hasher = Sha256::new();
        hasher.update(&data);
        let hash = format!("{:x}", hasher.finalize());

        let meta = FileMeta {
            hash: hash.clone(),
            filename: sanitize_filename(filename),
            content_type: content_type.unwrap_or(DEFAULT_CONTENT_TYPE).to_string(),
            size: data.len() as u64,
        };

        let blob_dir = self.dir.join(&hash);
        fs::create_dir_all(&blob_dir).await?;

        let path = blob_dir.join(&meta.filename);
        let temp_path = blob_dir.join(format!(".{}.tmp", meta.filename));
        fs::write(&temp_path, &data).await?;
        fs::rename(&temp_path, &path).await?;

        let meta_path = self.dir.join(format!("{}.json", hash));
        fs::write(&meta_path, serde_json::to_vec_pretty(&meta)?).await?;

        info!("Stored file {} ({} bytes) as {}", meta.filename, meta.size, hash);
        Ok(meta)
    }

    /// Bytes and content type, or `None` when nothing is stored under that locator.
    pub async fn get(&self, hash: &str, filename: &str) -> Result<Option<(Bytes, String)>> {
        if !is_sha256_hex(hash) || filename != sanitize_filename(filename) {
            return Ok(None);
        }

        let path = self.dir.join(hash).join(filename);
        let data = match fs::read(&path).await {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e).with_context(|| format!("Failed to read {:?}", path)),
        };

        let content_type = match fs::read(self.dir.join(format!("{}.json", hash))).await {
            Ok(raw) => serde_json::from_slice::<FileMeta>(&raw)
                .map(|meta| meta.content_type)
                .unwrap_or_else(|_| DEFAULT_CONTENT_TYPE.to_string()),
            Err(_) => DEFAULT_CONTENT_TYPE.to_string(),
        };

        Ok(Some((Bytes::from(data), content_type)))
    }
}

fn is_sha256_hex(s: &str) -> bool {
    s.len() == 64 && s.chars().all(|c| c.is_ascii_hexdigit())
}

/// Final path component with anything outside `[A-Za-z0-9._-]` replaced.
pub fn sanitize_filename(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();

    if cleaned.is_empty() || cleaned.starts_with('.') {
        format!("file{}", cleaned)
    } else {
        cleaned
    }
}
