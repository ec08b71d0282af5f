use std::fs;
use std::path::Path;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;

use crate::error::{GenerationError, GenerationResult};

/// Base64 text of an image plus its MIME type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage {
    pub b64: String,
    pub mime: String,
}

impl EncodedImage {
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self {
            b64: BASE64.encode(bytes),
            mime: sniff_mime(bytes).unwrap_or("image/png").to_string(),
        }
    }

    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime, self.b64)
    }

    pub fn decode(&self) -> GenerationResult<Vec<u8>> {
        BASE64
            .decode(self.b64.as_bytes())
            .map_err(|err| GenerationError::InvalidResponse {
                provider: "base64".to_string(),
                detail: err.to_string(),
            })
    }

    pub fn extension(&self) -> &'static str {
        extension_for_mime(&self.mime)
    }
}

/// Reads and encodes a user-supplied image file.
pub fn encode_image_file(path: &Path) -> GenerationResult<EncodedImage> {
    let bytes = fs::read(path).map_err(|source| GenerationError::ImageRead {
        path: path.to_path_buf(),
        source,
    })?;
    let mut encoded = EncodedImage::from_bytes(&bytes);
    if sniff_mime(&bytes).is_none() {
        if let Some(mime) = mime_for_path(path) {
            encoded.mime = mime.to_string();
        }
    }
    Ok(encoded)
}

pub fn sniff_mime(bytes: &[u8]) -> Option<&'static str> {
    let format = image::guess_format(bytes).ok()?;
    Some(format.to_mime_type())
}

pub fn mime_for_path(path: &Path) -> Option<&'static str> {
    let ext = path
        .extension()
        .and_then(|value| value.to_str())
        .map(|value| value.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "webp" => Some("image/webp"),
        "gif" => Some("image/gif"),
        _ => None,
    }
}

pub fn extension_for_mime(mime: &str) -> &'static str {
    match mime.trim().to_ascii_lowercase().as_str() {
        "image/jpeg" | "image/jpg" => "jpg",
        "image/webp" => "webp",
        "image/gif" => "gif",
        _ => "png",
    }
}
