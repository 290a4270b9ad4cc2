use std::path::{Path, PathBuf};

use uuid::Uuid;

/// Relative storage path for a show image:
/// `uploads/movies/{title}-{uuid}{extension}`. The token is fresh per
/// upload, so repeated uploads never collide and earlier files are left
/// on disk untouched.
pub fn image_upload_path(title: &str, filename: &str) -> String {
    let ext = Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{e}"))
        .unwrap_or_default();
    format!("uploads/movies/{title}-{}{ext}", Uuid::new_v4())
}

pub async fn save_image(
    media_root: &Path,
    relative: &str,
    bytes: &[u8],
) -> std::io::Result<PathBuf> {
    let full = media_root.join(relative);
    if let Some(parent) = full.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(&full, bytes).await?;
    Ok(full)
}
