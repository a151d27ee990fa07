use bytes::Bytes;
use std::path::Path;

use crate::error::AppError;

/// Directory name uploads are stored under and served from.
pub const UPLOADS_URL_PREFIX: &str = "images";

/// Write an uploaded file under `uploads_dir` with a fresh unique name,
/// keeping the original extension when there is one (falling back to the
/// content type's preferred extension). Returns the relative path stored
/// in the media row, e.g. `images/0192ab....png`.
pub async fn save_upload(
    uploads_dir: &Path,
    original_name: Option<&str>,
    content_type: Option<&str>,
    data: Bytes,
) -> Result<String, AppError> {
    let ext = original_name
        .and_then(|name| Path::new(name).extension())
        .and_then(|ext| ext.to_str())
        .or_else(|| {
            content_type
                .and_then(mime_guess::get_mime_extensions_str)
                .and_then(|exts| exts.first())
                .copied()
        })
        .unwrap_or("bin");

    let filename = format!("{}.{}", uuid::Uuid::now_v7(), ext);

    tokio::fs::create_dir_all(uploads_dir).await?;
    tokio::fs::write(uploads_dir.join(&filename), &data).await?;

    Ok(format!("{}/{}", UPLOADS_URL_PREFIX, filename))
}

/// Unlink stored media files. A missing file is logged and skipped; the
/// database rows are already gone at this point.
pub async fn remove_files(uploads_dir: &Path, stored_paths: &[String]) {
    for stored in stored_paths {
        let Some(filename) = Path::new(stored).file_name() else {
            tracing::warn!("Stored media path has no file name: {}", stored);
            continue;
        };
        let path = uploads_dir.join(filename);
        if let Err(e) = tokio::fs::remove_file(&path).await {
            tracing::warn!("Failed to remove media file {}: {}", path.display(), e);
        }
    }
}
