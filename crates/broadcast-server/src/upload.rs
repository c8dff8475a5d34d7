//! Attachment storage.
//!
//! Every upload lands at `<dir>/<stem><ext>`, so a new upload overwrites the
//! previous one. Only the original extension survives from the client's file
//! name.

use std::path::{Path, PathBuf};

use broadcast_core::MediaDescriptor;
use tracing::{debug, error};

use crate::errors::ApiError;
use crate::form::UploadedFile;

const FALLBACK_MIME: &str = "application/octet-stream";

/// Writes uploaded attachments into a single slot on disk.
#[derive(Clone, Debug)]
pub struct UploadStore {
    dir: PathBuf,
    stem: String,
}

impl UploadStore {
    /// Store uploads in `dir` under the file stem `stem`.
    pub fn new(dir: impl Into<PathBuf>, stem: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            stem: stem.into(),
        }
    }

    /// Upload directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Where an upload with the given client file name would be written.
    pub fn target_path(&self, file_name: Option<&str>) -> PathBuf {
        let ext = file_name
            .and_then(|name| Path::new(name).extension())
            .and_then(|ext| ext.to_str())
            .map(|ext| format!(".{ext}"))
            .unwrap_or_default();
        self.dir.join(format!("{}{ext}", self.stem))
    }

    /// Write `file` to its slot and describe it for the transport.
    pub async fn store(&self, file: UploadedFile) -> Result<MediaDescriptor, ApiError> {
        let path = self.target_path(file.file_name.as_deref());
        let mime_type = resolve_mime(file.content_type.as_deref(), file.file_name.as_deref());

        tokio::fs::create_dir_all(&self.dir).await.map_err(|e| {
            error!(path = %self.dir.display(), error = %e, "cannot create upload directory");
            ApiError::Internal("Error storing attachment".into())
        })?;
        tokio::fs::write(&path, &file.bytes).await.map_err(|e| {
            error!(path = %path.display(), error = %e, "cannot write upload");
            ApiError::Internal("Error storing attachment".into())
        })?;

        debug!(path = %path.display(), bytes = file.bytes.len(), mime = %mime_type, "upload stored");
        Ok(MediaDescriptor::image(path, mime_type))
    }
}

/// Declared content type, else a guess from the file name, else octet-stream.
fn resolve_mime(declared: Option<&str>, file_name: Option<&str>) -> String {
    if let Some(ct) = declared.map(str::trim).filter(|ct| !ct.is_empty()) {
        return ct.to_owned();
    }
    file_name
        .and_then(|name| mime_guess::from_path(name).first_raw())
        .unwrap_or(FALLBACK_MIME)
        .to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Bytes;
    use broadcast_core::MediaKind;

    fn file(name: Option<&str>, ct: Option<&str>, data: &'static [u8]) -> UploadedFile {
        UploadedFile {
            file_name: name.map(Into::into),
            content_type: ct.map(Into::into),
            bytes: Bytes::from_static(data),
        }
    }

    #[test]
    fn target_keeps_only_extension() {
        let store = UploadStore::new("/srv/uploads", "gato");
        assert_eq!(
            store.target_path(Some("holiday photo.JPG")),
            PathBuf::from("/srv/uploads/gato.JPG")
        );
        assert_eq!(
            store.target_path(Some("../../etc/passwd.png")),
            PathBuf::from("/srv/uploads/gato.png")
        );
        assert_eq!(store.target_path(Some("noext")), PathBuf::from("/srv/uploads/gato"));
        assert_eq!(store.target_path(None), PathBuf::from("/srv/uploads/gato"));
    }

    #[test]
    fn mime_resolution_order() {
        assert_eq!(resolve_mime(Some("image/webp"), Some("a.png")), "image/webp");
        assert_eq!(resolve_mime(None, Some("a.png")), "image/png");
        assert_eq!(resolve_mime(Some(""), Some("a.jpg")), "image/jpeg");
        assert_eq!(resolve_mime(None, Some("a.unknownext")), FALLBACK_MIME);
        assert_eq!(resolve_mime(None, None), FALLBACK_MIME);
    }

    #[tokio::test]
    async fn store_writes_and_describes() {
        let tmp = tempfile::tempdir().unwrap();
        let store = UploadStore::new(tmp.path().join("nested"), "upload");

        let media = store
            .store(file(Some("cat.png"), None, b"PNGDATA"))
            .await
            .unwrap();

        assert_eq!(media.kind, MediaKind::Image);
        assert_eq!(media.mime_type, "image/png");
        assert_eq!(media.path, tmp.path().join("nested/upload.png"));
        assert_eq!(std::fs::read(&media.path).unwrap(), b"PNGDATA");
    }

    #[tokio::test]
    async fn second_upload_overwrites_slot() {
        let tmp = tempfile::tempdir().unwrap();
        let store = UploadStore::new(tmp.path(), "upload");

        let first = store.store(file(Some("a.png"), None, b"one")).await.unwrap();
        let second = store.store(file(Some("b.png"), None, b"two")).await.unwrap();

        assert_eq!(first.path, second.path);
        assert_eq!(std::fs::read(&second.path).unwrap(), b"two");
    }

    #[tokio::test]
    async fn unwritable_dir_is_internal_error() {
        let tmp = tempfile::tempdir().unwrap();
        let blocker = tmp.path().join("blocker");
        std::fs::write(&blocker, b"not a dir").unwrap();
        let store = UploadStore::new(&blocker, "upload");

        let err = store.store(file(Some("a.png"), None, b"x")).await.unwrap_err();
        assert!(matches!(err, ApiError::Internal(_)));
    }
}
