//! Recipe image storage
//!
//! Images arrive as base64 data URIs and are written under the media root.
//! The stored value is the public URL the file is served from.

use anyhow::{Context, Result};
use base64::{Engine, engine::general_purpose::STANDARD};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    error::{ApiError, ApiResult},
    messages,
};

/// URL prefix the media root is served under
pub const MEDIA_URL: &str = "/media/";
const IMAGE_DIR: &str = "recipes/images";

/// Decoded image ready to be written
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedImage {
    pub extension: &'static str,
    pub bytes: Vec<u8>,
}

fn extension_for(mime: &str) -> Option<&'static str> {
    match mime {
        "image/png" => Some("png"),
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/gif" => Some("gif"),
        "image/webp" => Some("webp"),
        _ => None,
    }
}

/// Parse a `data:image/<type>;base64,<payload>` URI
pub fn decode_data_uri(value: &str) -> ApiResult<DecodedImage> {
    let invalid = || ApiError::validation("image", messages::INVALID_IMAGE);

    let rest = value.trim().strip_prefix("data:").ok_or_else(invalid)?;
    let (header, payload) = rest.split_once(',').ok_or_else(invalid)?;
    let mime = header.strip_suffix(";base64").ok_or_else(invalid)?;
    let extension = extension_for(&mime.to_ascii_lowercase()).ok_or_else(invalid)?;

    let bytes = STANDARD.decode(payload.trim()).map_err(|_| invalid())?;
    if bytes.is_empty() {
        return Err(invalid());
    }

    Ok(DecodedImage { extension, bytes })
}

/// Write an image under `media_root` and return its public URL
pub async fn store_image(media_root: &Path, image: &DecodedImage) -> Result<String> {
    let dir = media_root.join(IMAGE_DIR);
    tokio::fs::create_dir_all(&dir)
        .await
        .with_context(|| format!("creating {}", dir.display()))?;

    let file_name = format!("{}.{}", Uuid::new_v4(), image.extension);
    let path = dir.join(&file_name);
    tokio::fs::write(&path, &image.bytes)
        .await
        .with_context(|| format!("writing {}", path.display()))?;

    info!("Stored recipe image {}", path.display());
    Ok(format!("{MEDIA_URL}{IMAGE_DIR}/{file_name}"))
}

/// Map a stored image URL back to its file, if it points inside the media root
pub fn image_path(media_root: &Path, url: &str) -> Option<PathBuf> {
    let relative = url.strip_prefix(MEDIA_URL)?;
    if relative.split('/').any(|part| part.is_empty() || part == "..") {
        return None;
    }
    Some(media_root.join(relative))
}

/// Delete a stored image; failures are only logged
pub async fn remove_image(media_root: &Path, url: &str) {
    let Some(path) = image_path(media_root, url) else {
        return;
    };
    if let Err(e) = tokio::fs::remove_file(&path).await {
        warn!("Failed to remove image {}: {}", path.display(), e);
    }
}
