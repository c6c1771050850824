//! Image formats accepted for upload and their data URI encoding

use std::fmt;
use std::str::FromStr;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Message shown when an upload is not one of the accepted formats
pub const UNSUPPORTED_IMAGE_MESSAGE: &str =
    "Please upload a valid image file (PNG, JPG, JPEG, or WEBP)";

/// PNG signature
const PNG_MAGIC: &[u8] = b"\x89PNG\r\n\x1a\n";

/// JPEG start-of-image marker
const JPEG_MAGIC: &[u8] = &[0xFF, 0xD8, 0xFF];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ImageError {
    #[error("{}", UNSUPPORTED_IMAGE_MESSAGE)]
    UnsupportedFormat,
    #[error("File contents do not match a {0} image")]
    ContentMismatch(ImageFormat),
    #[error("Invalid data URL: {0}")]
    InvalidDataUrl(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    Png,
    Jpeg,
    Webp,
}

impl ImageFormat {
    pub fn mime_type(&self) -> &'static str {
        match self {
            ImageFormat::Png => "image/png",
            ImageFormat::Jpeg => "image/jpeg",
            ImageFormat::Webp => "image/webp",
        }
    }

    /// Resolve a declared MIME type. `image/jpg` is accepted as an alias.
    pub fn from_mime_type(mime: &str) -> Option<Self> {
        match mime.trim().to_ascii_lowercase().as_str() {
            "image/png" => Some(ImageFormat::Png),
            "image/jpeg" | "image/jpg" => Some(ImageFormat::Jpeg),
            "image/webp" => Some(ImageFormat::Webp),
            _ => None,
        }
    }

    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "png" => Some(ImageFormat::Png),
            "jpg" | "jpeg" => Some(ImageFormat::Jpeg),
            "webp" => Some(ImageFormat::Webp),
            _ => None,
        }
    }

    /// Detect the format from the leading bytes of the file
    pub fn sniff(bytes: &[u8]) -> Option<Self> {
        if bytes.starts_with(PNG_MAGIC) {
            Some(ImageFormat::Png)
        } else if bytes.starts_with(JPEG_MAGIC) {
            Some(ImageFormat::Jpeg)
        } else if bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
            Some(ImageFormat::Webp)
        } else {
            None
        }
    }
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ImageFormat::Png => "PNG",
            ImageFormat::Jpeg => "JPEG",
            ImageFormat::Webp => "WEBP",
        };
        f.write_str(name)
    }
}

/// Work out the format of an upload from its declared MIME type, falling back
/// to the file extension, and check that the bytes agree.
pub fn validate_upload(
    file_name: &str,
    declared_mime: Option<&str>,
    bytes: &[u8],
) -> Result<ImageFormat, ImageError> {
    let declared = match declared_mime.filter(|m| !m.trim().is_empty()) {
        Some(mime) => ImageFormat::from_mime_type(mime),
        None => file_name
            .rsplit_once('.')
            .and_then(|(_, ext)| ImageFormat::from_extension(ext)),
    };
    let format = declared.ok_or(ImageError::UnsupportedFormat)?;

    match ImageFormat::sniff(bytes) {
        Some(actual) if actual == format => Ok(format),
        _ => Err(ImageError::ContentMismatch(format)),
    }
}

/// A `data:<mime>;base64,<payload>` URI holding an accepted image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageDataUrl {
    format: ImageFormat,
    payload: String,
}

impl ImageDataUrl {
    pub fn from_bytes(format: ImageFormat, bytes: &[u8]) -> Self {
        Self {
            format,
            payload: STANDARD.encode(bytes),
        }
    }

    pub fn format(&self) -> ImageFormat {
        self.format
    }

    pub fn mime_type(&self) -> &'static str {
        self.format.mime_type()
    }

    /// Decode the base64 payload back into raw image bytes
    pub fn decode(&self) -> Result<Vec<u8>, ImageError> {
        STANDARD
            .decode(&self.payload)
            .map_err(|e| ImageError::InvalidDataUrl(e.to_string()))
    }
}

impl fmt::Display for ImageDataUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "data:{};base64,{}", self.format.mime_type(), self.payload)
    }
}

impl FromStr for ImageDataUrl {
    type Err = ImageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let rest = s
            .strip_prefix("data:")
            .ok_or_else(|| ImageError::InvalidDataUrl("missing data: prefix".to_string()))?;
        let (header, payload) = rest
            .split_once(',')
            .ok_or_else(|| ImageError::InvalidDataUrl("missing payload separator".to_string()))?;
        let mime = header
            .strip_suffix(";base64")
            .ok_or_else(|| ImageError::InvalidDataUrl("payload is not base64".to_string()))?;
        let format = ImageFormat::from_mime_type(mime).ok_or(ImageError::UnsupportedFormat)?;

        let url = Self {
            format,
            payload: payload.to_string(),
        };
        url.decode()?;
        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_BYTES: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR";
    const JPEG_BYTES: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10];
    const WEBP_BYTES: &[u8] = b"RIFF\x24\0\0\0WEBPVP8 ";

    #[test]
    fn test_sniff() {
        assert_eq!(ImageFormat::sniff(PNG_BYTES), Some(ImageFormat::Png));
        assert_eq!(ImageFormat::sniff(JPEG_BYTES), Some(ImageFormat::Jpeg));
        assert_eq!(ImageFormat::sniff(WEBP_BYTES), Some(ImageFormat::Webp));
        assert_eq!(ImageFormat::sniff(b"GIF89a"), None);
        assert_eq!(ImageFormat::sniff(b"RIFF"), None);
        assert_eq!(ImageFormat::sniff(b""), None);
    }

    #[test]
    fn test_mime_aliases() {
        assert_eq!(ImageFormat::from_mime_type("image/jpg"), Some(ImageFormat::Jpeg));
        assert_eq!(ImageFormat::from_mime_type("IMAGE/PNG"), Some(ImageFormat::Png));
        assert_eq!(ImageFormat::from_mime_type("image/gif"), None);
        assert_eq!(ImageFormat::from_extension("JPEG"), Some(ImageFormat::Jpeg));
        assert_eq!(ImageFormat::from_extension("bmp"), None);
    }

    #[test]
    fn test_validate_upload() {
        assert_eq!(
            validate_upload("cat.png", Some("image/png"), PNG_BYTES),
            Ok(ImageFormat::Png)
        );
        // No declared type: fall back to the extension
        assert_eq!(validate_upload("cat.JPG", None, JPEG_BYTES), Ok(ImageFormat::Jpeg));
        assert_eq!(
            validate_upload("cat.gif", Some("image/gif"), b"GIF89a"),
            Err(ImageError::UnsupportedFormat)
        );
        assert_eq!(validate_upload("README", None, PNG_BYTES), Err(ImageError::UnsupportedFormat));
        assert_eq!(
            validate_upload("fake.png", Some("image/png"), b"<html>"),
            Err(ImageError::ContentMismatch(ImageFormat::Png))
        );
    }

    #[test]
    fn test_data_url_roundtrip() {
        let url = ImageDataUrl::from_bytes(ImageFormat::Webp, WEBP_BYTES);
        let text = url.to_string();
        assert!(text.starts_with("data:image/webp;base64,"));

        let parsed: ImageDataUrl = text.parse().unwrap();
        assert_eq!(parsed.mime_type(), "image/webp");
        assert_eq!(parsed.decode().unwrap(), WEBP_BYTES);
    }

    #[test]
    fn test_data_url_rejects_malformed() {
        assert!(matches!(
            "image/png;base64,AAAA".parse::<ImageDataUrl>(),
            Err(ImageError::InvalidDataUrl(_))
        ));
        assert!(matches!(
            "data:image/png,AAAA".parse::<ImageDataUrl>(),
            Err(ImageError::InvalidDataUrl(_))
        ));
        assert!(matches!(
            "data:image/png;base64,not base64!".parse::<ImageDataUrl>(),
            Err(ImageError::InvalidDataUrl(_))
        ));
        assert_eq!(
            "data:image/gif;base64,R0lG".parse::<ImageDataUrl>(),
            Err(ImageError::UnsupportedFormat)
        );
    }

    #[test]
    fn test_unsupported_message() {
        assert_eq!(ImageError::UnsupportedFormat.to_string(), UNSUPPORTED_IMAGE_MESSAGE);
    }
}
