//! File-to-base64 conversion and data URL handling.
//!
//! The external APIs exchange images as bare base64 payloads; the display
//! side wants `data:` URLs. This module converts between raw bytes and both
//! representations.

use crate::error::{Result, RetouchError};
use base64::Engine;
use std::path::Path;

/// Encodes raw bytes as standard base64 with padding.
pub fn to_base64(data: &[u8]) -> String {
    base64::engine::general_purpose::STANDARD.encode(data)
}

/// Decodes a standard base64 payload back to raw bytes.
pub fn from_base64(payload: &str) -> Result<Vec<u8>> {
    base64::engine::general_purpose::STANDARD
        .decode(payload)
        .map_err(|e| RetouchError::Decode(e.to_string()))
}

/// Reads a file and resolves to its bare base64 representation.
///
/// The result carries no `data:` prefix and no comma. The read is
/// single-shot: it either completes or fails with [`RetouchError::Read`].
/// No size or type validation happens here; that is the caller's job.
pub async fn file_to_base64(path: impl AsRef<Path>) -> Result<String> {
    let data = tokio::fs::read(path).await?;
    Ok(to_base64(&data))
}

/// Renders bytes as a `data:<mime>;base64,<payload>` URL for display.
pub fn to_data_url(mime_type: &str, data: &[u8]) -> String {
    format!("data:{};base64,{}", mime_type, to_base64(data))
}

/// Extracts the base64 payload from a data URL.
///
/// Fails with [`RetouchError::Extraction`] when the input has no
/// comma-delimited segment or the segment is empty.
pub fn data_url_payload(data_url: &str) -> Result<&str> {
    let payload = data_url
        .split_once(',')
        .map(|(_, payload)| payload)
        .ok_or_else(|| {
            RetouchError::Extraction("data URL has no comma-delimited segment".into())
        })?;
    if payload.is_empty() {
        return Err(RetouchError::Extraction("data URL payload is empty".into()));
    }
    Ok(payload)
}
