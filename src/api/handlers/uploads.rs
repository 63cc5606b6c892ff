//! Artifact image uploads.
//!
//! Files land under the configured upload directory and are served back
//! through a static file route; the database only ever stores the URL.

use axum::{
    extract::{Multipart, Path, State},
    Json,
};
use chrono::Utc;
use rand::Rng;
use serde::Serialize;
use utoipa::ToSchema;

use crate::api::dto::ApiResponse;
use crate::api::SharedState;
use crate::error::{AppError, Result};

const ALLOWED_EXTENSIONS: &[&str] = &["jpeg", "jpg", "png", "gif", "webp", "bmp"];
pub const MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

#[derive(Debug, Serialize, ToSchema)]
pub struct UploadedImage {
    pub filename: String,
    pub original_name: String,
    pub size: usize,
    pub url: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ImageEntry {
    pub filename: String,
    pub url: String,
}

fn extension_of(file_name: &str) -> Option<String> {
    std::path::Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
}

/// Accept a single `image` field and persist it under a unique name.
pub async fn upload_image(
    State(state): State<SharedState>,
    mut multipart: Multipart,
) -> Result<Json<ApiResponse<UploadedImage>>> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Invalid multipart payload: {}", e)))?
    {
        if field.name() != Some("image") {
            continue;
        }

        let original_name = field
            .file_name()
            .map(str::to_string)
            .ok_or_else(|| AppError::Validation("Image field has no filename".to_string()))?;

        let ext = extension_of(&original_name).ok_or_else(|| {
            AppError::Validation("Image filename has no extension".to_string())
        })?;
        if !ALLOWED_EXTENSIONS.contains(&ext.as_str()) {
            return Err(AppError::Validation(format!(
                "Unsupported image type: .{} (allowed: {})",
                ext,
                ALLOWED_EXTENSIONS.join(", ")
            )));
        }

        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::Validation(format!("Failed to read upload: {}", e)))?;
        if data.len() > MAX_UPLOAD_BYTES {
            return Err(AppError::Validation(
                "Image exceeds the 5 MB limit".to_string(),
            ));
        }

        let filename = format!(
            "image-{}-{}.{}",
            Utc::now().timestamp_millis(),
            rand::rng().random_range(0..1_000_000_000u32),
            ext
        );

        tokio::fs::create_dir_all(&state.config.upload_dir).await?;
        let path = std::path::Path::new(&state.config.upload_dir).join(&filename);
        tokio::fs::write(&path, &data).await?;

        tracing::info!(filename = %filename, size = data.len(), "image uploaded");

        return Ok(Json(ApiResponse::with_message(
            UploadedImage {
                url: format!("/uploads/{}", filename),
                size: data.len(),
                filename,
                original_name,
            },
            "Image uploaded",
        )));
    }

    Err(AppError::Validation(
        "Multipart payload must contain an 'image' field".to_string(),
    ))
}

/// List the filenames currently in the upload directory.
pub async fn list_images(
    State(state): State<SharedState>,
) -> Result<Json<ApiResponse<Vec<ImageEntry>>>> {
    let mut images = Vec::new();

    match tokio::fs::read_dir(&state.config.upload_dir).await {
        Ok(mut entries) => {
            while let Some(entry) = entries.next_entry().await? {
                if !entry.file_type().await?.is_file() {
                    continue;
                }
                if let Ok(filename) = entry.file_name().into_string() {
                    images.push(ImageEntry {
                        url: format!("/uploads/{}", filename),
                        filename,
                    });
                }
            }
        }
        // No uploads yet.
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => return Err(e.into()),
    }

    images.sort_by(|a, b| a.filename.cmp(&b.filename));
    Ok(Json(ApiResponse::data(images)))
}

/// Remove an uploaded image by filename.
pub async fn delete_image(
    State(state): State<SharedState>,
    Path(filename): Path<String>,
) -> Result<Json<ApiResponse<()>>> {
    // The filename must stay inside the upload directory.
    if filename.contains('/') || filename.contains('\\') || filename.contains("..") {
        return Err(AppError::Validation("Invalid image filename".to_string()));
    }

    let path = std::path::Path::new(&state.config.upload_dir).join(&filename);
    match tokio::fs::remove_file(&path).await {
        Ok(()) => {
            tracing::info!(filename = %filename, "image deleted");
            Ok(Json(ApiResponse::message("Image deleted")))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(AppError::NotFound("Image not found".to_string()))
        }
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_is_lowercased() {
        assert_eq!(extension_of("Photo.JPG"), Some("jpg".to_string()));
        assert_eq!(extension_of("scan.webp"), Some("webp".to_string()));
        assert_eq!(extension_of("noext"), None);
    }

    #[test]
    fn allowed_extensions_cover_common_formats() {
        for ext in ["jpeg", "jpg", "png", "gif", "webp", "bmp"] {
            assert!(ALLOWED_EXTENSIONS.contains(&ext));
        }
        assert!(!ALLOWED_EXTENSIONS.contains(&"svg"));
        assert!(!ALLOWED_EXTENSIONS.contains(&"exe"));
    }
}
