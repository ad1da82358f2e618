//! Image uploads stored on local disk.
//!
//! Files land in `<upload dir>/<collection>/<uuid>.<ext>` and are served back
//! under `/uploads/...` by the static file service.

use std::path::{Path, PathBuf};

use axum::body::Bytes;
use thiserror::Error;
use uuid::Uuid;

use crate::config::UploadConfig;

/// Most files accepted by one multi-file upload.
pub const MAX_FILES: usize = 10;

/// Accepted image types: content type and the extension stored on disk.
const IMAGE_TYPES: &[(&str, &str)] = &[
    ("image/jpeg", "jpg"),
    ("image/png", "png"),
    ("image/gif", "gif"),
    ("image/webp", "webp"),
];

/// Errors that can occur while accepting an upload.
#[derive(Debug, Error)]
pub enum UploadError {
    #[error("file exceeds the {limit} byte limit")]
    TooLarge { limit: usize },

    #[error("only jpeg, png, gif and webp images are accepted")]
    UnsupportedType,

    #[error("invalid upload collection '{0}'")]
    InvalidCollection(String),

    #[error("no file was uploaded")]
    MissingFile,

    #[error("at most {max} files can be uploaded at once")]
    TooManyFiles { max: usize },

    #[error("could not store file: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid multipart body: {0}")]
    Multipart(String),
}

/// One file taken from a multipart body.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

/// Writes uploads to disk and builds their public URLs.
#[derive(Debug, Clone)]
pub struct UploadStore {
    dir: PathBuf,
    base_url: String,
    max_bytes: usize,
}

impl UploadStore {
    #[must_use]
    pub fn new(config: &UploadConfig, base_url: &str) -> Self {
        Self {
            dir: config.dir.clone(),
            base_url: base_url.trim_end_matches('/').to_owned(),
            max_bytes: config.max_bytes,
        }
    }

    /// Root directory served under `/uploads`.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Per-file size limit in bytes.
    #[must_use]
    pub const fn max_bytes(&self) -> usize {
        self.max_bytes
    }

    /// Body limit for a request carrying up to `files` files.
    #[must_use]
    pub const fn body_limit(&self, files: usize) -> usize {
        // Room for multipart boundaries and part headers.
        self.max_bytes.saturating_mul(files).saturating_add(64 * 1024)
    }

    /// Validate and store one file, returning its public URL.
    ///
    /// # Errors
    ///
    /// Returns `UploadError` if the collection name, size or type is rejected
    /// or the file cannot be written.
    pub async fn save(&self, collection: &str, file: &UploadedFile) -> Result<String, UploadError> {
        self.write(collection, file).await.map(|(_, url)| url)
    }

    /// Write one file, returning its path on disk and its public URL.
    async fn write(
        &self,
        collection: &str,
        file: &UploadedFile,
    ) -> Result<(PathBuf, String), UploadError> {
        check_collection(collection)?;
        if file.bytes.is_empty() {
            return Err(UploadError::MissingFile);
        }
        if file.bytes.len() > self.max_bytes {
            return Err(UploadError::TooLarge {
                limit: self.max_bytes,
            });
        }
        let extension = image_extension(file.content_type.as_deref(), file.file_name.as_deref())?;

        let dir = self.dir.join(collection);
        tokio::fs::create_dir_all(&dir).await?;

        let name = format!("{}.{extension}", Uuid::new_v4());
        let path = dir.join(&name);
        tokio::fs::write(&path, &file.bytes).await?;

        tracing::debug!(collection, file = %name, bytes = file.bytes.len(), "Stored upload");
        Ok((path, format!("{}/uploads/{collection}/{name}", self.base_url)))
    }

    /// Store several files, all-or-nothing.
    ///
    /// Files already written are removed again when a later one fails.
    ///
    /// # Errors
    ///
    /// Returns `UploadError::MissingFile` for an empty batch,
    /// `UploadError::TooManyFiles` above [`MAX_FILES`], or the first error of
    /// any single file.
    pub async fn save_all(
        &self,
        collection: &str,
        files: &[UploadedFile],
    ) -> Result<Vec<String>, UploadError> {
        if files.is_empty() {
            return Err(UploadError::MissingFile);
        }
        if files.len() > MAX_FILES {
            return Err(UploadError::TooManyFiles { max: MAX_FILES });
        }
        for file in files {
            image_extension(file.content_type.as_deref(), file.file_name.as_deref())?;
            if file.bytes.len() > self.max_bytes {
                return Err(UploadError::TooLarge {
                    limit: self.max_bytes,
                });
            }
        }

        let mut written = Vec::with_capacity(files.len());
        for file in files {
            match self.write(collection, file).await {
                Ok(stored) => written.push(stored),
                Err(err) => {
                    for (path, _) in &written {
                        if let Err(cleanup) = tokio::fs::remove_file(path).await {
                            tracing::warn!(path = %path.display(), error = %cleanup, "Failed to remove partial upload");
                        }
                    }
                    return Err(err);
                }
            }
        }
        Ok(written.into_iter().map(|(_, url)| url).collect())
    }
}

/// Collection names become directory names: letters, digits, `-` and `_`.
fn check_collection(collection: &str) -> Result<(), UploadError> {
    let valid = !collection.is_empty()
        && collection.len() <= 50
        && collection
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(())
    } else {
        Err(UploadError::InvalidCollection(collection.to_owned()))
    }
}

/// Extension for an accepted image, by content type or else by file name.
fn image_extension(
    content_type: Option<&str>,
    file_name: Option<&str>,
) -> Result<&'static str, UploadError> {
    if let Some(content_type) = content_type
        && let Some((_, ext)) = IMAGE_TYPES.iter().find(|(ct, _)| *ct == content_type)
    {
        return Ok(ext);
    }

    let ext = file_name
        .and_then(|name| Path::new(name).extension())
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("jpg" | "jpeg") => Ok("jpg"),
        Some("png") => Ok("png"),
        Some("gif") => Ok("gif"),
        Some("webp") => Ok("webp"),
        _ => Err(UploadError::UnsupportedType),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn store(dir: &Path) -> UploadStore {
        UploadStore::new(
            &UploadConfig {
                dir: dir.to_path_buf(),
                max_bytes: 16,
            },
            "http://localhost:8889/",
        )
    }

    fn png(bytes: &'static [u8]) -> UploadedFile {
        UploadedFile {
            file_name: Some("logo.png".into()),
            content_type: Some("image/png".into()),
            bytes: Bytes::from_static(bytes),
        }
    }

    #[test]
    fn test_check_collection() {
        assert!(check_collection("products").is_ok());
        assert!(check_collection("brand-logos_2").is_ok());
        assert!(check_collection("").is_err());
        assert!(check_collection("../etc").is_err());
        assert!(check_collection("a/b").is_err());
    }

    #[test]
    fn test_image_extension() {
        assert_eq!(image_extension(Some("image/jpeg"), None).unwrap(), "jpg");
        assert_eq!(
            image_extension(Some("application/octet-stream"), Some("Cover.JPEG")).unwrap(),
            "jpg"
        );
        assert!(matches!(
            image_extension(Some("text/plain"), Some("notes.txt")),
            Err(UploadError::UnsupportedType)
        ));
    }

    #[tokio::test]
    async fn test_save_writes_file_and_returns_url() {
        let dir = std::env::temp_dir().join(format!("sd-uploads-{}", Uuid::new_v4()));
        let store = store(&dir);

        let url = store.save("brands", &png(b"\x89PNG....")).await.unwrap();
        assert!(url.starts_with("http://localhost:8889/uploads/brands/"));
        assert!(url.ends_with(".png"));

        let name = url.rsplit('/').next().unwrap();
        let stored = tokio::fs::read(dir.join("brands").join(name)).await.unwrap();
        assert_eq!(stored, b"\x89PNG....");

        tokio::fs::remove_dir_all(&dir).await.unwrap();
    }

    #[tokio::test]
    async fn test_save_rejects_oversized_file() {
        let dir = std::env::temp_dir().join(format!("sd-uploads-{}", Uuid::new_v4()));
        let store = store(&dir);

        let err = store
            .save("brands", &png(b"0123456789abcdefXYZ"))
            .await
            .unwrap_err();
        assert!(matches!(err, UploadError::TooLarge { limit: 16 }));
        assert!(!dir.exists());
    }

    #[tokio::test]
    async fn test_save_all_limits() {
        let dir = std::env::temp_dir().join(format!("sd-uploads-{}", Uuid::new_v4()));
        let store = store(&dir);

        assert!(matches!(
            store.save_all("products", &[]).await,
            Err(UploadError::MissingFile)
        ));
        let many = vec![png(b"x"); MAX_FILES + 1];
        assert!(matches!(
            store.save_all("products", &many).await,
            Err(UploadError::TooManyFiles { max: MAX_FILES })
        ));
    }

    #[tokio::test]
    async fn test_save_all_removes_written_files_on_failure() {
        let dir = std::env::temp_dir().join(format!("sd-uploads-{}", Uuid::new_v4()));
        let store = store(&dir);

        let batch = [png(b"first"), png(b"second"), png(b"")];
        let err = store.save_all("products", &batch).await.unwrap_err();
        assert!(matches!(err, UploadError::MissingFile));

        let mut entries = tokio::fs::read_dir(dir.join("products")).await.unwrap();
        assert!(entries.next_entry().await.unwrap().is_none());

        let urls = store.save_all("products", &batch[..2]).await.unwrap();
        assert_eq!(urls.len(), 2);

        tokio::fs::remove_dir_all(&dir).await.unwrap();
    }
}
