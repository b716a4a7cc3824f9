use std::path::PathBuf;

use actix_multipart::Multipart;
use actix_web::{web, HttpResponse};
use futures::StreamExt;
use log::info;
use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;

use crate::auth::AdminUser;
use crate::error::AppError;
use crate::resources::products::IMAGE_DIRECTORY;
use crate::state::AppState;

pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

#[derive(Debug, Serialize, Deserialize)]
pub struct UploadResponse {
    /// Path relative to the storage root, as stored in `products.image`.
    pub path: String,
    pub url: String,
}

/// Last path component of a client-supplied filename.
pub fn sanitize_filename(name: &str) -> Option<String> {
    let base = name.rsplit(['/', '\\']).next().unwrap_or_default().trim();
    if base.is_empty() || base == "." || base == ".." {
        return None;
    }
    Some(base.to_string())
}

/// Whether the content itself, not the declared type, is an image.
fn looks_like_image(bytes: &[u8]) -> bool {
    infer::is_image(bytes)
}

/// Accepts one `file` part holding an image and stores it under its
/// original name in the product image directory.
pub async fn upload_image(
    state: web::Data<AppState>,
    admin: AdminUser,
    mut payload: Multipart,
) -> Result<HttpResponse, AppError> {
    while let Some(item) = payload.next().await {
        let mut field = item.map_err(|e| AppError::Upload(e.to_string()))?;
        if field.name() != "file" {
            continue;
        }

        let is_image = field
            .content_type()
            .is_some_and(|mime| mime.type_().as_str() == "image");
        if !is_image {
            return Err(AppError::Upload("The file must be an image.".to_string()));
        }

        let filename = field
            .content_disposition()
            .get_filename()
            .and_then(sanitize_filename)
            .ok_or_else(|| AppError::Upload("The file must have a name.".to_string()))?;

        let mut bytes = Vec::new();
        while let Some(chunk) = field.next().await {
            let chunk = chunk.map_err(|e| AppError::Upload(e.to_string()))?;
            if bytes.len() + chunk.len() > MAX_UPLOAD_BYTES {
                return Err(AppError::Upload("The file is too large.".to_string()));
            }
            bytes.extend_from_slice(&chunk);
        }
        if !looks_like_image(&bytes) {
            return Err(AppError::Upload("The file must be an image.".to_string()));
        }

        let directory: PathBuf = [state.settings.storage.root.as_str(), IMAGE_DIRECTORY].iter().collect();
        tokio::fs::create_dir_all(&directory)
            .await
            .map_err(|e| AppError::Internal(format!("cannot create {}: {}", directory.display(), e)))?;
        let target = directory.join(&filename);
        let mut file = tokio::fs::File::create(&target)
            .await
            .map_err(|e| AppError::Internal(format!("cannot create {}: {}", target.display(), e)))?;
        file.write_all(&bytes)
            .await
            .map_err(|e| AppError::Internal(format!("cannot write {}: {}", target.display(), e)))?;

        let path = format!("{}/{}", IMAGE_DIRECTORY, filename);
        let url = format!("{}/{}", state.settings.storage.public_prefix.trim_end_matches('/'), path);
        info!("{} uploaded {}", admin.user.email, path);
        return Ok(HttpResponse::Created().json(UploadResponse { path, url }));
    }

    Err(AppError::Upload("The file field is required.".to_string()))
}
