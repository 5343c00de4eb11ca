//! Image attachments chosen by the operator

use bytes::Bytes;
use std::path::Path;

use crate::error::{Error, Result};

/// An image file ready to be sent as a multipart part
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageAttachment {
    pub file_name: String,
    pub mime: String,
    pub bytes: Bytes,
}

impl ImageAttachment {
    /// Build an attachment from in-memory data. The MIME type is guessed from
    /// the file name and must be an image type.
    pub fn new(file_name: impl Into<String>, bytes: impl Into<Bytes>) -> Result<Self> {
        let file_name = file_name.into();
        let mime = mime_guess::from_path(&file_name)
            .first()
            .filter(|m| m.type_() == mime_guess::mime::IMAGE)
            .ok_or_else(|| Error::InvalidImage {
                path: file_name.clone(),
                reason: "not an image file type".to_string(),
            })?;

        Ok(Self {
            file_name,
            mime: mime.essence_str().to_string(),
            bytes: bytes.into(),
        })
    }

    /// Read an image from disk.
    pub async fn from_path(path: &Path) -> Result<Self> {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| Error::InvalidImage {
                path: path.display().to_string(),
                reason: "path has no file name".to_string(),
            })?;

        let data = tokio::fs::read(path).await?;
        if data.is_empty() {
            return Err(Error::InvalidImage {
                path: path.display().to_string(),
                reason: "file is empty".to_string(),
            });
        }

        tracing::debug!(path = %path.display(), size = data.len(), "loaded image");
        Self::new(file_name, data)
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}
