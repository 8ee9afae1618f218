//! Raw file handles, media kinds and the inline-data payload format.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use base64::{engine::general_purpose::STANDARD, Engine};
use image::ImageFormat;

use crate::error::{AssetError, Result};

/// Output type of the raster compressor
pub const JPEG: &str = "image/jpeg";
pub const PNG: &str = "image/png";

const DATA_SCHEME: &str = "data:";
const BASE64_MARKER: &str = ";base64,";

/// Broad category of an incoming file, decided by its media type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    /// Non-image categories: PDF and office documents
    Document,
}

impl MediaKind {
    pub fn of(media_type: &str) -> Self {
        if media_type.trim().to_ascii_lowercase().starts_with("image/") {
            MediaKind::Image
        } else {
            MediaKind::Document
        }
    }
}

/// Whether the raster codec can decode this media type. Vector formats
/// (SVG) and codecs built without a decoder (HEIC, AVIF) cannot be
/// recompressed.
pub fn is_decodable_raster(media_type: &str) -> bool {
    ImageFormat::from_mime_type(media_type.trim().to_ascii_lowercase())
        .is_some_and(|format| format.reading_enabled())
}

/// Guess a media type from a file extension.
///
/// Covers the raster formats and office documents the editors accept;
/// anything else is `application/octet-stream`.
pub fn media_type_for_path(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "jpg" | "jpeg" => JPEG,
        "png" => PNG,
        "webp" => "image/webp",
        "gif" => "image/gif",
        "bmp" => "image/bmp",
        "tif" | "tiff" => "image/tiff",
        "svg" => "image/svg+xml",
        "heic" => "image/heic",
        "pdf" => "application/pdf",
        "doc" => "application/msword",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "xls" => "application/vnd.ms-excel",
        "xlsx" => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        "ppt" => "application/vnd.ms-powerpoint",
        "pptx" => "application/vnd.openxmlformats-officedocument.presentationml.presentation",
        _ => "application/octet-stream",
    }
}

#[derive(Clone)]
enum ByteSource {
    Memory(Arc<[u8]>),
    /// Read lazily on first encode
    File(PathBuf),
}

/// A newly chosen local file that has not been encoded yet
#[derive(Clone)]
pub struct RawHandle {
    name: String,
    media_type: String,
    byte_length: u64,
    source: ByteSource,
}

impl RawHandle {
    pub fn from_bytes(
        name: impl Into<String>,
        media_type: impl Into<String>,
        bytes: impl Into<Vec<u8>>,
    ) -> Self {
        let bytes: Vec<u8> = bytes.into();
        let bytes: Arc<[u8]> = bytes.into();
        Self {
            name: name.into(),
            media_type: media_type.into(),
            byte_length: bytes.len() as u64,
            source: ByteSource::Memory(bytes),
        }
    }

    /// Handle for a file on disk. Only metadata is read here; the content
    /// is read when the file is encoded.
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());

        let meta = tokio::fs::metadata(path)
            .await
            .map_err(|e| AssetError::read(&name, e))?;
        if !meta.is_file() {
            return Err(AssetError::read(&name, "not a regular file"));
        }

        Ok(Self {
            name,
            media_type: media_type_for_path(path).to_string(),
            byte_length: meta.len(),
            source: ByteSource::File(path.to_path_buf()),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn media_type(&self) -> &str {
        &self.media_type
    }

    pub fn byte_length(&self) -> u64 {
        self.byte_length
    }

    pub fn kind(&self) -> MediaKind {
        MediaKind::of(&self.media_type)
    }

    /// Read the full byte content.
    ///
    /// A file whose size changed since it was picked is a read failure.
    pub async fn read(&self) -> Result<Arc<[u8]>> {
        match &self.source {
            ByteSource::Memory(bytes) => Ok(bytes.clone()),
            ByteSource::File(path) => {
                let bytes = tokio::fs::read(path)
                    .await
                    .map_err(|e| AssetError::read(&self.name, e))?;
                if bytes.len() as u64 != self.byte_length {
                    return Err(AssetError::read(
                        &self.name,
                        format!(
                            "expected {} bytes, read {}",
                            self.byte_length,
                            bytes.len()
                        ),
                    ));
                }
                Ok(bytes.into())
            }
        }
    }
}

impl fmt::Debug for RawHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let source = match &self.source {
            ByteSource::Memory(_) => "memory".to_string(),
            ByteSource::File(path) => path.display().to_string(),
        };
        f.debug_struct("RawHandle")
            .field("name", &self.name)
            .field("media_type", &self.media_type)
            .field("byte_length", &self.byte_length)
            .field("source", &source)
            .finish()
    }
}

/// Self-describing transportable payload.
///
/// Its canonical form is a single `data:<type>;base64,<content>` string so
/// it can live in the same record field as a remote URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedAsset {
    media_type: String,
    bytes: Vec<u8>,
}

impl EncodedAsset {
    pub fn new(media_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            media_type: media_type.into(),
            bytes,
        }
    }

    pub fn media_type(&self) -> &str {
        &self.media_type
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn to_data_uri(&self) -> String {
        format!(
            "{}{}{}{}",
            DATA_SCHEME,
            self.media_type,
            BASE64_MARKER,
            STANDARD.encode(&self.bytes)
        )
    }

    /// Parse the canonical string form. Returns `None` for remote URLs and
    /// anything else that is not a base64 data string.
    pub fn from_data_uri(value: &str) -> Option<Self> {
        let rest = value.strip_prefix(DATA_SCHEME)?;
        let (media_type, payload) = rest.split_once(BASE64_MARKER)?;
        let bytes = STANDARD.decode(payload.trim()).ok()?;
        Some(Self::new(media_type, bytes))
    }
}

impl fmt::Display for EncodedAsset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_data_uri())
    }
}
