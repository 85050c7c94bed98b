use uuid::Uuid;

use eterna_shared::errors::{AppError, AppResult, ErrorCode};

pub const MAX_PHOTO_BYTES: usize = 5 * 1024 * 1024;

/// Checks an uploaded file and picks the extension it is stored under: the
/// one implied by the content type, else the file name's own extension.
pub fn accept_upload(content_type: &str, file_name: Option<&str>, size: usize) -> AppResult<&'static str> {
    if !content_type.starts_with("image/") {
        return Err(AppError::new(
            ErrorCode::InvalidPhoto,
            "invalid file type, only images are allowed",
        ));
    }
    if size == 0 {
        return Err(AppError::new(ErrorCode::InvalidPhoto, "uploaded file is empty"));
    }
    if size > MAX_PHOTO_BYTES {
        return Err(AppError::new(
            ErrorCode::InvalidPhoto,
            "file size too large, maximum 5MB allowed",
        ));
    }

    let from_type = match content_type {
        "image/jpeg" | "image/jpg" | "image/pjpeg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/webp" => Some("webp"),
        "image/gif" => Some("gif"),
        "image/avif" => Some("avif"),
        "image/heic" => Some("heic"),
        "image/svg+xml" => Some("svg"),
        _ => None,
    };

    Ok(from_type
        .or_else(|| file_name.and_then(known_extension))
        .unwrap_or("img"))
}

fn known_extension(file_name: &str) -> Option<&'static str> {
    let (_, ext) = file_name.rsplit_once('.')?;
    match ext.to_ascii_lowercase().as_str() {
        "jpg" | "jpeg" => Some("jpg"),
        "png" => Some("png"),
        "webp" => Some("webp"),
        "gif" => Some("gif"),
        "avif" => Some("avif"),
        "heic" => Some("heic"),
        "bmp" => Some("bmp"),
        "tif" | "tiff" => Some("tiff"),
        _ => None,
    }
}

pub fn object_key(user_id: Uuid, photo_id: Uuid, ext: &str) -> String {
    format!("photos/{user_id}/{photo_id}.{ext}")
}
