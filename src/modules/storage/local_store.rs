//! Local disk adapter for uploaded files.
//!
//! Multipart payloads are staged here first; files either stay (local
//! provider) or are removed once the remote upload succeeds.

use chrono::Utc;
use std::path::{Component, Path, PathBuf};
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

use crate::core::error::AppError;

/// A file written to the upload root, awaiting storage dispatch
#[derive(Debug, Clone)]
pub struct StagedFile {
    pub path: PathBuf,
    pub server_filename: String,
    pub original_filename: String,
    pub mime_type: String,
    pub size: i64,
}

/// An in-progress staged write.
///
/// Chunks are appended as they come off the wire, so the payload never has
/// to fit in memory. The size limit is enforced per chunk; once crossed no
/// further bytes land on disk.
pub struct StagedUpload {
    staged: StagedFile,
    file: tokio::fs::File,
    written: u64,
    max_size: u64,
}

impl StagedUpload {
    pub async fn write_chunk(&mut self, chunk: &[u8]) -> Result<(), AppError> {
        let total = self.written + chunk.len() as u64;
        if total > self.max_size {
            return Err(AppError::BadRequest(format!(
                "File too large. Maximum size is {} MB",
                self.max_size / 1024 / 1024
            )));
        }

        self.file
            .write_all(chunk)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to write upload file: {}", e)))?;
        self.written = total;
        Ok(())
    }

    /// Flush and seal the upload, yielding the staged record
    pub async fn finish(mut self) -> Result<StagedFile, AppError> {
        if let Err(e) = self.file.flush().await {
            let _ = tokio::fs::remove_file(&self.staged.path).await;
            return Err(AppError::Internal(format!(
                "Failed to flush upload file: {}",
                e
            )));
        }

        self.staged.size = self.written as i64;
        Ok(self.staged)
    }

    /// Remove the partial file after a failed or abandoned upload
    pub async fn discard(self) {
        drop(self.file);
        if let Err(e) = tokio::fs::remove_file(&self.staged.path).await {
            tracing::warn!(
                "Failed to remove partial upload '{}': {}",
                self.staged.path.display(),
                e
            );
        }
    }
}

pub struct LocalStore {
    root: PathBuf,
}

impl LocalStore {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create the upload root if it does not exist yet
    pub async fn ensure_root(&self) -> Result<(), AppError> {
        tokio::fs::create_dir_all(&self.root).await.map_err(|e| {
            AppError::Internal(format!(
                "Failed to create upload directory '{}': {}",
                self.root.display(),
                e
            ))
        })
    }

    /// Open a staged write under a generated unique name
    pub async fn begin_stage(
        &self,
        original_filename: &str,
        mime_type: &str,
        max_size: u64,
    ) -> Result<StagedUpload, AppError> {
        let extension = Path::new(original_filename)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| format!(".{}", e.to_lowercase()))
            .unwrap_or_default();

        let server_filename = format!(
            "file-{}-{}{}",
            Utc::now().timestamp_millis(),
            Uuid::new_v4().simple(),
            extension
        );
        let path = self.root.join(&server_filename);

        let file = tokio::fs::File::create(&path)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to create upload file: {}", e)))?;

        Ok(StagedUpload {
            staged: StagedFile {
                path,
                server_filename,
                original_filename: original_filename.to_string(),
                mime_type: mime_type.to_string(),
                size: 0,
            },
            file,
            written: 0,
            max_size,
        })
    }

    /// Deterministic join of the upload root and a stored relative filename.
    ///
    /// Rejects anything that would escape the root.
    pub fn resolve(&self, server_filename: &str) -> Result<PathBuf, AppError> {
        let candidate = Path::new(server_filename);
        let is_plain_name = candidate.components().count() == 1
            && matches!(candidate.components().next(), Some(Component::Normal(_)));

        if server_filename.is_empty() || !is_plain_name {
            return Err(AppError::NotFound("File not found on server".to_string()));
        }

        Ok(self.root.join(server_filename))
    }

    /// Open a stored file for streaming, checking existence first
    pub async fn open(&self, server_filename: &str) -> Result<tokio::fs::File, AppError> {
        let path = self.resolve(server_filename)?;

        match tokio::fs::File::open(&path).await {
            Ok(file) => Ok(file),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(AppError::NotFound("File not found on server".to_string()))
            }
            Err(e) => Err(AppError::Internal(format!(
                "Failed to open file '{}': {}",
                path.display(),
                e
            ))),
        }
    }

    /// Delete a file. The failure is reported; deletion callers treat it as
    /// non-fatal.
    pub async fn remove(&self, path: &Path) -> Result<(), AppError> {
        tokio::fs::remove_file(path).await.map_err(|e| {
            AppError::Internal(format!(
                "Failed to delete local file '{}': {}",
                path.display(),
                e
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_store() -> LocalStore {
        let root = std::env::temp_dir().join(format!("photofine-test-{}", Uuid::new_v4()));
        LocalStore::new(root)
    }

    #[tokio::test]
    async fn staged_chunks_accumulate_into_one_file() {
        let store = temp_store();
        store.ensure_root().await.unwrap();

        let mut upload = store
            .begin_stage("album.zip", "application/zip", 1024)
            .await
            .unwrap();
        upload.write_chunk(b"test-").await.unwrap();
        upload.write_chunk(b"bytes").await.unwrap();
        let staged = upload.finish().await.unwrap();

        assert!(staged.server_filename.starts_with("file-"));
        assert!(staged.server_filename.ends_with(".zip"));
        assert_eq!(staged.original_filename, "album.zip");
        assert_eq!(staged.size, 10);
        assert_eq!(
            tokio::fs::read(&staged.path).await.unwrap(),
            b"test-bytes".to_vec()
        );

        tokio::fs::remove_dir_all(store.root()).await.unwrap();
    }

    #[tokio::test]
    async fn oversize_chunk_is_rejected_before_it_lands() {
        let store = temp_store();
        store.ensure_root().await.unwrap();

        let mut upload = store
            .begin_stage("album.zip", "application/zip", 8)
            .await
            .unwrap();
        upload.write_chunk(b"12345678").await.unwrap();

        let err = upload.write_chunk(b"9").await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));

        let path = upload.staged.path.clone();
        assert!(path.exists());

        upload.discard().await;
        assert!(!path.exists());

        tokio::fs::remove_dir_all(store.root()).await.unwrap();
    }

    #[test]
    fn resolve_rejects_traversal() {
        let store = temp_store();

        assert!(store.resolve("../etc/passwd").is_err());
        assert!(store.resolve("a/b.zip").is_err());
        assert!(store.resolve("..").is_err());
        assert!(store.resolve("").is_err());
        assert!(store.resolve("file-123.zip").is_ok());
    }

    #[tokio::test]
    async fn open_missing_file_is_not_found() {
        let store = temp_store();
        store.ensure_root().await.unwrap();

        let err = store.open("file-nope.zip").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));

        tokio::fs::remove_dir_all(store.root()).await.unwrap();
    }
}
