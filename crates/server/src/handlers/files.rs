//! Attachment upload and download

use axum::{
    extract::{Multipart, Path, State},
    http::{header, HeaderMap, HeaderValue},
    Json,
};
use spectralink_core::models::UploadResponse;
use tracing::{error, info};

use crate::config::AppState;
use crate::error::{Error, Result};
use crate::files::DEFAULT_CONTENT_TYPE;

/// POST /upload (multipart field `file`)
pub async fn upload_file(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>> {
    let mut upload = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        error!("Failed to read multipart field: {}", e);
        Error::BadRequest(format!("invalid multipart body: {}", e))
    })? {
        if field.name() != Some("file") {
            continue;
        }
        let filename = field.file_name().unwrap_or("unnamed").to_string();
        let content_type = field.content_type().map(|s| s.to_string());
        let data = field
            .bytes()
            .await
            .map_err(|e| Error::BadRequest(format!("failed to read file data: {}", e)))?;
        upload = Some((filename, content_type, data));
    }

    let (filename, content_type, data) =
        upload.ok_or_else(|| Error::BadRequest("missing multipart field `file`".into()))?;

    let meta = state
        .files
        .put(&filename, content_type.as_deref(), data)
        .await?;
    info!("POST /upload - {} bytes -> {}", meta.size, meta.locator());

    Ok(Json(UploadResponse {
        url: meta.locator(),
    }))
}

/// GET /files/{hash}/{filename}
pub async fn get_file(
    State(state): State<AppState>,
    Path((hash, filename)): Path<(String, String)>,
) -> Result<(HeaderMap, bytes::Bytes)> {
    let (data, content_type) = state
        .files
        .get(&hash, &filename)
        .await?
        .ok_or_else(|| Error::NotFound(format!("no file at /files/{}/{}", hash, filename)))?;

    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_str(&content_type)
            .unwrap_or_else(|_| HeaderValue::from_static(DEFAULT_CONTENT_TYPE)),
    );
    Ok((headers, data))
}
