//! Local download boundary: persisting a returned artifact.
//!
//! The payload buffer is the exclusively-owned result of a successful
//! operation; writing it out and closing the file handle on every path is
//! this module's whole job. Filenames come from the server suggestion when
//! present (sanitized), else the operation default, with numeric suffixes
//! on collision.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::request::OperationKind;
use crate::transport::{OperationSuccess, resolve_unique_path};

/// Writes the artifact into `dir` and returns the resolved path.
///
/// # Errors
///
/// Returns the underlying IO error when the directory is not writable.
pub async fn save_artifact(
    success: &OperationSuccess,
    kind: OperationKind,
    dir: &Path,
) -> std::io::Result<PathBuf> {
    let name = success.filename_or(kind.default_filename());
    let path = resolve_unique_path(dir, name);
    debug!(path = %path.display(), bytes = success.payload().len(), "saving artifact");
    tokio::fs::write(&path, success.payload()).await?;
    Ok(path)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use bytes::Bytes;
    use tempfile::TempDir;

    use super::*;

    fn success(name: Option<&str>) -> OperationSuccess {
        OperationSuccess::new(
            Bytes::from_static(b"%PDF-1.4 artifact"),
            name.map(str::to_string),
        )
    }

    #[tokio::test]
    async fn test_save_uses_suggested_filename() {
        let dir = TempDir::new().unwrap();
        let path = save_artifact(&success(Some("result.pdf")), OperationKind::Merge, dir.path())
            .await
            .unwrap();

        assert_eq!(path.file_name().unwrap(), "result.pdf");
        assert_eq!(std::fs::read(&path).unwrap(), b"%PDF-1.4 artifact");
    }

    #[tokio::test]
    async fn test_save_falls_back_to_operation_default() {
        let dir = TempDir::new().unwrap();
        let path = save_artifact(&success(None), OperationKind::ExtractImages, dir.path())
            .await
            .unwrap();

        assert_eq!(path.file_name().unwrap(), "extracted_images.zip");
    }

    #[tokio::test]
    async fn test_save_suffixes_on_collision() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("merged.pdf"), b"earlier run").unwrap();

        let path = save_artifact(&success(None), OperationKind::Merge, dir.path())
            .await
            .unwrap();

        assert_eq!(path.file_name().unwrap(), "merged_1.pdf");
    }

    #[tokio::test]
    async fn test_save_sanitizes_hostile_suggestion() {
        let dir = TempDir::new().unwrap();
        let path = save_artifact(
            &success(Some("../../escape.pdf")),
            OperationKind::Merge,
            dir.path(),
        )
        .await
        .unwrap();

        assert!(path.starts_with(dir.path()), "must stay under output dir");
    }
}
