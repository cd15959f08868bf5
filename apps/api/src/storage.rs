use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{info, warn};
use uuid::Uuid;

/// Upload formats accepted for storage. Only PDF is parsed for scoring.
pub const ALLOWED_EXTENSIONS: &[&str] = &["pdf", "doc", "docx"];

#[derive(Debug, Clone)]
pub struct StoredFile {
    pub original_filename: String,
    /// Unique on-disk name: `<uuid>_<sanitized original>`.
    pub filename: String,
    pub path: PathBuf,
}

/// Lowercased extension of `filename` if it is one of [`ALLOWED_EXTENSIONS`].
pub fn allowed_extension(filename: &str) -> Option<String> {
    let ext = Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())?
        .to_ascii_lowercase();
    ALLOWED_EXTENSIONS.contains(&ext.as_str()).then_some(ext)
}

/// Keeps ASCII alphanumerics, `.`, `-` and `_`; everything else becomes `_`.
/// Directory components and leading dots are dropped.
pub fn sanitize_filename(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        "resume".to_string()
    } else {
        cleaned.to_string()
    }
}

/// Writes an uploaded file under `upload_dir`, creating the directory if needed.
pub async fn store_upload(
    upload_dir: &Path,
    original_filename: &str,
    data: &[u8],
) -> Result<StoredFile> {
    tokio::fs::create_dir_all(upload_dir)
        .await
        .with_context(|| format!("Failed to create upload dir {}", upload_dir.display()))?;

    let filename = format!("{}_{}", Uuid::new_v4(), sanitize_filename(original_filename));
    let path = upload_dir.join(&filename);
    tokio::fs::write(&path, data)
        .await
        .with_context(|| format!("Failed to write upload {}", path.display()))?;

    info!("Stored upload {original_filename} as {}", path.display());

    Ok(StoredFile {
        original_filename: original_filename.to_string(),
        filename,
        path,
    })
}

/// Deletes a stored upload. Missing files are ignored; other failures are logged.
pub async fn remove_stored(path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!("Failed to remove stored upload {}: {e}", path.display()),
    }
}

/// Removes a stored upload when dropped unless [`keep`](UploadGuard::keep) was called.
///
/// Covers early returns and a request future dropped mid-flight (client disconnect).
pub struct UploadGuard {
    path: Option<PathBuf>,
}

impl UploadGuard {
    pub fn new(path: PathBuf) -> Self {
        Self { path: Some(path) }
    }

    /// The upload is referenced by a committed record; leave it on disk.
    pub fn keep(mut self) {
        self.path = None;
    }
}

impl Drop for UploadGuard {
    fn drop(&mut self) {
        let Some(path) = self.path.take() else {
            return;
        };
        match std::fs::remove_file(&path) {
            Ok(()) => info!("Discarded orphaned upload {}", path.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!("Failed to remove stored upload {}: {e}", path.display()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allowed_extensions() {
        assert_eq!(allowed_extension("cv.PDF").as_deref(), Some("pdf"));
        assert_eq!(allowed_extension("cv.docx").as_deref(), Some("docx"));
        assert_eq!(allowed_extension("cv.txt"), None);
        assert_eq!(allowed_extension("no_extension"), None);
    }

    #[test]
    fn test_sanitize_strips_paths_and_specials() {
        assert_eq!(sanitize_filename("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_filename("C:\\Users\\me\\My CV (1).pdf"), "My_CV__1_.pdf");
        assert_eq!(sanitize_filename("..."), "resume");
        assert_eq!(sanitize_filename(".hidden.pdf"), "hidden.pdf");
    }

    #[tokio::test]
    async fn test_store_and_remove_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let upload_dir = dir.path().join("nested");
        let stored = store_upload(&upload_dir, "Jane Doe.pdf", b"%PDF-1.4")
            .await
            .unwrap();

        assert!(stored.filename.ends_with("_Jane_Doe.pdf"));
        assert_eq!(stored.original_filename, "Jane Doe.pdf");
        assert_eq!(tokio::fs::read(&stored.path).await.unwrap(), b"%PDF-1.4");

        remove_stored(&stored.path).await;
        assert!(!stored.path.exists());
        // Removing twice is a no-op.
        remove_stored(&stored.path).await;
    }

    #[tokio::test]
    async fn test_upload_guard_removes_unless_kept() {
        let dir = tempfile::tempdir().unwrap();

        let dropped = store_upload(dir.path(), "a.pdf", b"%PDF").await.unwrap();
        drop(UploadGuard::new(dropped.path.clone()));
        assert!(!dropped.path.exists());

        let kept = store_upload(dir.path(), "b.pdf", b"%PDF").await.unwrap();
        UploadGuard::new(kept.path.clone()).keep();
        assert!(kept.path.exists());
    }

    #[tokio::test]
    async fn test_upload_guard_fires_when_future_is_dropped() {
        let dir = tempfile::tempdir().unwrap();
        let stored = store_upload(dir.path(), "c.pdf", b"%PDF").await.unwrap();

        let path = stored.path.clone();
        let pending = async move {
            let _guard = UploadGuard::new(path);
            std::future::pending::<()>().await;
        };
        let timed_out =
            tokio::time::timeout(std::time::Duration::from_millis(10), pending).await;
        assert!(timed_out.is_err());
        assert!(!stored.path.exists());
    }
}
