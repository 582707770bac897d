//! Core types for image editing and generation.

use crate::encode;
use crate::error::{Result, RetouchError};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Soft size guidance for uploaded images. Larger files are warned about
/// but not rejected.
pub const SOFT_SIZE_LIMIT_BYTES: usize = 10 * 1024 * 1024;

/// Supported image formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    /// PNG format (lossless).
    #[default]
    Png,
    /// JPEG format (lossy).
    Jpeg,
    /// WebP format (modern, efficient).
    WebP,
}

impl ImageFormat {
    /// Returns the file extension for this format.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
            Self::WebP => "webp",
        }
    }

    /// Returns the MIME type for this format.
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::WebP => "image/webp",
        }
    }

    /// Attempts to detect format from file extension.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "png" => Some(Self::Png),
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "webp" => Some(Self::WebP),
            _ => None,
        }
    }

    /// Attempts to detect format from a MIME type string.
    pub fn from_mime(mime: &str) -> Option<Self> {
        match mime {
            "image/png" => Some(Self::Png),
            "image/jpeg" | "image/jpg" => Some(Self::Jpeg),
            "image/webp" => Some(Self::WebP),
            _ => None,
        }
    }

    /// Detects image format from magic bytes.
    pub fn from_magic_bytes(data: &[u8]) -> Option<Self> {
        if data.len() < 12 {
            return None;
        }

        // PNG: 89 50 4E 47 0D 0A 1A 0A
        if data.starts_with(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]) {
            return Some(Self::Png);
        }

        // JPEG: FF D8 FF
        if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
            return Some(Self::Jpeg);
        }

        // WebP: RIFF....WEBP
        if data.starts_with(b"RIFF") && &data[8..12] == b"WEBP" {
            return Some(Self::WebP);
        }

        None
    }
}

/// A user-selected source image for the editing flow.
///
/// Replaced wholesale when a new file is selected; dropped with the owning
/// session.
#[derive(Debug, Clone)]
pub struct SelectedFile {
    /// Raw file bytes.
    pub data: Vec<u8>,
    /// Detected image format.
    pub format: ImageFormat,
    /// Display name (file name or path).
    pub name: String,
}

impl SelectedFile {
    /// Loads a file from disk, detecting its format.
    ///
    /// Only PNG, JPEG and WebP are accepted, matching the upload filter.
    /// Files over [`SOFT_SIZE_LIMIT_BYTES`] are accepted with a warning.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read(path)?;

        let format = path
            .extension()
            .and_then(|e| e.to_str())
            .and_then(ImageFormat::from_extension)
            .or_else(|| ImageFormat::from_magic_bytes(&data))
            .ok_or_else(|| {
                RetouchError::InvalidRequest(format!(
                    "{} is not a PNG, JPEG or WebP image",
                    path.display()
                ))
            })?;

        if data.len() > SOFT_SIZE_LIMIT_BYTES {
            tracing::warn!(
                size_bytes = data.len(),
                "image exceeds the 10MB guidance; sending anyway"
            );
        }

        Ok(Self {
            data,
            format,
            name: path.display().to_string(),
        })
    }
}

/// A request to edit an image with a natural-language instruction.
///
/// Built immediately before dispatch; never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EditRequest {
    /// Base64-encoded source image, no data-URL prefix.
    pub image_b64: String,
    /// MIME type of the source image.
    pub mime_type: String,
    /// The edit instruction.
    pub instruction: String,
}

impl EditRequest {
    /// Builds a request from a selected file and an instruction.
    pub fn from_file(file: &SelectedFile, instruction: impl Into<String>) -> Self {
        Self {
            image_b64: encode::to_base64(&file.data),
            mime_type: file.format.mime_type().to_string(),
            instruction: instruction.into(),
        }
    }
}

/// A request to generate an image from a text prompt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateRequest {
    /// The prompt describing the desired image.
    pub instruction: String,
}

impl GenerateRequest {
    /// Creates a new request with the given prompt.
    pub fn new(instruction: impl Into<String>) -> Self {
        Self {
            instruction: instruction.into(),
        }
    }
}

/// Metadata about how an artifact was produced.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ArtifactMetadata {
    /// Model that produced the image.
    pub model: Option<String>,
    /// Wall-clock duration of the external call in milliseconds.
    pub duration_ms: Option<u64>,
}

/// An image returned by the external service.
#[derive(Debug, Clone)]
#[must_use = "returned image should be saved or displayed"]
pub struct ImageArtifact {
    /// Raw image bytes.
    pub data: Vec<u8>,
    /// Image format.
    pub format: ImageFormat,
    /// Production metadata.
    pub metadata: ArtifactMetadata,
}

impl ImageArtifact {
    /// Creates a new artifact.
    pub fn new(data: Vec<u8>, format: ImageFormat, metadata: ArtifactMetadata) -> Self {
        Self {
            data,
            format,
            metadata,
        }
    }

    /// Creates an artifact, detecting the format from magic bytes.
    pub fn from_bytes(data: Vec<u8>, metadata: ArtifactMetadata) -> Result<Self> {
        let format = ImageFormat::from_magic_bytes(&data)
            .ok_or_else(|| RetouchError::Decode("unknown image format".into()))?;
        Ok(Self::new(data, format, metadata))
    }

    /// Returns the size of the image data in bytes.
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// Saves the image to the specified path.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        std::fs::write(path, &self.data)?;
        Ok(())
    }

    /// Returns the image as a `data:` URL for display.
    pub fn to_data_url(&self) -> String {
        encode::to_data_url(self.format.mime_type(), &self.data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const PNG_MAGIC: [u8; 12] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0];
    const JPEG_MAGIC: [u8; 12] = [0xFF, 0xD8, 0xFF, 0xE0, 0, 0, 0, 0, 0, 0, 0, 0];
    const WEBP_MAGIC: [u8; 12] = *b"RIFF\x00\x00\x00\x00WEBP";

    #[test]
    fn test_format_from_magic_bytes() {
        assert_eq!(
            ImageFormat::from_magic_bytes(&PNG_MAGIC),
            Some(ImageFormat::Png)
        );
        assert_eq!(
            ImageFormat::from_magic_bytes(&JPEG_MAGIC),
            Some(ImageFormat::Jpeg)
        );
        assert_eq!(
            ImageFormat::from_magic_bytes(&WEBP_MAGIC),
            Some(ImageFormat::WebP)
        );
        assert_eq!(ImageFormat::from_magic_bytes(b"not an image"), None);
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(ImageFormat::from_extension("png"), Some(ImageFormat::Png));
        assert_eq!(ImageFormat::from_extension("JPG"), Some(ImageFormat::Jpeg));
        assert_eq!(ImageFormat::from_extension("webp"), Some(ImageFormat::WebP));
        assert_eq!(ImageFormat::from_extension("gif"), None);
    }

    #[test]
    fn test_format_from_mime() {
        assert_eq!(ImageFormat::from_mime("image/png"), Some(ImageFormat::Png));
        assert_eq!(
            ImageFormat::from_mime("image/jpeg"),
            Some(ImageFormat::Jpeg)
        );
        assert_eq!(ImageFormat::from_mime("image/gif"), None);
    }

    #[test]
    fn test_selected_file_from_path() {
        let mut file = tempfile::Builder::new()
            .suffix(".png")
            .tempfile()
            .unwrap();
        file.write_all(&PNG_MAGIC).unwrap();

        let selected = SelectedFile::from_path(file.path()).unwrap();
        assert_eq!(selected.format, ImageFormat::Png);
        assert_eq!(selected.data, PNG_MAGIC);
    }

    #[test]
    fn test_selected_file_rejects_unknown_format() {
        let mut file = tempfile::Builder::new()
            .suffix(".txt")
            .tempfile()
            .unwrap();
        file.write_all(b"just some text here").unwrap();

        let err = SelectedFile::from_path(file.path()).unwrap_err();
        assert!(matches!(err, RetouchError::InvalidRequest(_)));
    }

    #[test]
    fn test_edit_request_from_file() {
        let file = SelectedFile {
            data: PNG_MAGIC.to_vec(),
            format: ImageFormat::Png,
            name: "test.png".into(),
        };
        let request = EditRequest::from_file(&file, "add a sunset");

        assert_eq!(request.mime_type, "image/png");
        assert_eq!(request.instruction, "add a sunset");
        assert!(!request.image_b64.contains(','));
        assert!(!request.image_b64.starts_with("data:"));
    }

    #[test]
    fn test_artifact_data_url() {
        let artifact = ImageArtifact::from_bytes(PNG_MAGIC.to_vec(), ArtifactMetadata::default())
            .unwrap();
        assert_eq!(artifact.format, ImageFormat::Png);
        assert!(artifact.to_data_url().starts_with("data:image/png;base64,"));
    }

    #[test]
    fn test_artifact_from_unknown_bytes_fails() {
        let err = ImageArtifact::from_bytes(vec![0u8; 16], ArtifactMetadata::default())
            .unwrap_err();
        assert!(matches!(err, RetouchError::Decode(_)));
    }
}
