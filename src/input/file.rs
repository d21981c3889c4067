//! Image file handles and the decoder that turns them into data URLs.

use crate::error::Result;
use crate::image::{DataUrl, ImageFormat};
use async_trait::async_trait;
use std::path::PathBuf;

/// MIME type used when nothing better is known, matching what browsers emit
/// for untyped blobs.
const FALLBACK_MIME: &str = "application/octet-stream";

/// Where the bytes of an [`ImageFile`] live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileContents {
    /// On disk; read when decoded.
    Path(PathBuf),
    /// Already in memory (e.g. clipboard data).
    Bytes(Vec<u8>),
}

/// A binary file handed to one of the input channels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageFile {
    /// Display name, shown by the file picker.
    pub name: String,
    /// Declared MIME type, if the source supplied one.
    pub mime_type: Option<String>,
    /// The file's bytes.
    pub contents: FileContents,
}

impl ImageFile {
    /// A file on disk. The MIME type is guessed from the extension.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let mime_type = path
            .extension()
            .and_then(|e| e.to_str())
            .and_then(ImageFormat::from_extension)
            .map(|f| f.mime_type().to_string());

        Self {
            name,
            mime_type,
            contents: FileContents::Path(path),
        }
    }

    /// An in-memory file.
    pub fn from_bytes(name: impl Into<String>, mime_type: Option<String>, data: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime_type,
            contents: FileContents::Bytes(data),
        }
    }

    /// Returns true if the declared MIME type is `image/*`.
    pub fn is_image(&self) -> bool {
        self.mime_type
            .as_deref()
            .is_some_and(|m| m.starts_with("image/"))
    }

}

/// Asynchronously turns a file into an inline data URL.
#[async_trait]
pub trait FileDecoder: Send + Sync {
    /// Reads and encodes `file`.
    async fn decode(&self, file: &ImageFile) -> Result<DataUrl>;
}

/// Default decoder: reads the bytes and base64-encodes them.
///
/// The declared MIME type wins; otherwise it is sniffed from magic bytes.
/// An empty file encodes to a data URL with an empty payload.
#[derive(Debug, Clone, Copy, Default)]
pub struct Base64FileDecoder;

#[async_trait]
impl FileDecoder for Base64FileDecoder {
    async fn decode(&self, file: &ImageFile) -> Result<DataUrl> {
        let data = match &file.contents {
            FileContents::Path(path) => tokio::fs::read(path).await?,
            FileContents::Bytes(bytes) => bytes.clone(),
        };

        let mime = file
            .mime_type
            .as_deref()
            .filter(|m| !m.is_empty())
            .or_else(|| ImageFormat::from_magic_bytes(&data).map(|f| f.mime_type()))
            .unwrap_or(FALLBACK_MIME);

        Ok(DataUrl::from_bytes(mime, &data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RemixError;

    const PNG_BYTES: [u8; 12] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0];

    #[test]
    fn test_from_path_guesses_mime() {
        let file = ImageFile::from_path("/tmp/photos/cat.JPG");
        assert_eq!(file.name, "cat.JPG");
        assert_eq!(file.mime_type.as_deref(), Some("image/jpeg"));
        assert!(file.is_image());

        let file = ImageFile::from_path("notes.txt");
        assert!(file.mime_type.is_none());
        assert!(!file.is_image());
    }

    #[tokio::test]
    async fn test_decode_file_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pixel.png");
        std::fs::write(&path, PNG_BYTES).unwrap();

        let data = Base64FileDecoder
            .decode(&ImageFile::from_path(&path))
            .await
            .unwrap();
        assert_eq!(data.mime_type(), "image/png");
        assert_eq!(data.decode().unwrap(), PNG_BYTES);
    }

    #[tokio::test]
    async fn test_decode_sniffs_untyped_bytes() {
        let file = ImageFile::from_bytes("clip", None, PNG_BYTES.to_vec());
        let data = Base64FileDecoder.decode(&file).await.unwrap();
        assert_eq!(data.mime_type(), "image/png");

        let file = ImageFile::from_bytes("blob", None, b"plain old text".to_vec());
        let data = Base64FileDecoder.decode(&file).await.unwrap();
        assert_eq!(data.mime_type(), "application/octet-stream");
    }

    #[tokio::test]
    async fn test_decode_missing_file_fails() {
        let file = ImageFile::from_path("/definitely/not/here.png");
        let err = Base64FileDecoder.decode(&file).await.unwrap_err();
        assert!(matches!(err, RemixError::Io(_)));
    }

    #[tokio::test]
    async fn test_decode_empty_file() {
        let file = ImageFile::from_bytes("empty.png", Some("image/png".into()), Vec::new());
        let data = Base64FileDecoder.decode(&file).await.unwrap();
        assert_eq!(data.as_str(), "data:image/png;base64,");
        assert!(data.decode().unwrap().is_empty());
    }
}
