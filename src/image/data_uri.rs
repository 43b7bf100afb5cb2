//! Self-contained `data:<mime>;base64,<payload>` images.

use crate::error::{ChefError, Result};
use crate::image::types::ImageFormat;
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

const SCHEME: &str = "data:";
const BASE64_MARKER: &str = ";base64,";

/// An image carried as a data URI: a MIME type plus a base64 payload.
///
/// This is the only representation of an image in a session; there is no
/// separate storage or identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DataUri {
    mime_type: String,
    data: String,
}

impl DataUri {
    /// Wraps an already base64-encoded payload.
    pub fn new(mime_type: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            mime_type: mime_type.into(),
            data: data.into(),
        }
    }

    /// Encodes raw bytes.
    pub fn from_bytes(mime_type: impl Into<String>, bytes: &[u8]) -> Self {
        Self::new(
            mime_type,
            base64::engine::general_purpose::STANDARD.encode(bytes),
        )
    }

    /// Encodes raw image bytes, sniffing the MIME type from magic bytes.
    /// Unknown formats are labelled PNG.
    pub fn from_image_bytes(bytes: &[u8]) -> Self {
        let format = ImageFormat::from_magic_bytes(bytes).unwrap_or_default();
        Self::from_bytes(format.mime_type(), bytes)
    }

    /// Parses `data:<mime>;base64,<payload>`.
    pub fn parse(input: &str) -> Result<Self> {
        let rest = input
            .trim()
            .strip_prefix(SCHEME)
            .ok_or_else(|| ChefError::InvalidDataUri("missing 'data:' prefix".into()))?;

        let (mime_type, payload) = rest
            .split_once(BASE64_MARKER)
            .ok_or_else(|| ChefError::InvalidDataUri("missing ';base64,' marker".into()))?;

        if mime_type.is_empty() {
            return Err(ChefError::InvalidDataUri("empty MIME type".into()));
        }

        let data: String = payload.chars().filter(|c| !c.is_ascii_whitespace()).collect();
        if data.is_empty() {
            return Err(ChefError::InvalidDataUri("empty payload".into()));
        }

        Ok(Self::new(mime_type, data))
    }

    /// The MIME type, e.g. `image/png`.
    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    /// The base64 payload, without the `data:` header.
    pub fn data(&self) -> &str {
        &self.data
    }

    /// Decodes the payload, tolerating missing padding.
    pub fn decode(&self) -> Result<Vec<u8>> {
        use base64::engine::general_purpose::{STANDARD, STANDARD_NO_PAD};

        STANDARD
            .decode(&self.data)
            .or_else(|_| STANDARD_NO_PAD.decode(&self.data))
            .map_err(|e| ChefError::Decode(e.to_string()))
    }

    /// The image format named by the MIME type, if recognised.
    pub fn format(&self) -> Option<ImageFormat> {
        ImageFormat::from_mime_type(&self.mime_type)
    }

    /// File extension for saving; `png` when the MIME type is unknown.
    pub fn file_extension(&self) -> &'static str {
        self.format().unwrap_or_default().extension()
    }

    /// Writes the decoded bytes to `path`.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        std::fs::write(path, self.decode()?)?;
        Ok(())
    }
}

impl fmt::Display for DataUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{SCHEME}{}{BASE64_MARKER}{}", self.mime_type, self.data)
    }
}

impl FromStr for DataUri {
    type Err = ChefError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for DataUri {
    type Error = ChefError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<DataUri> for String {
    fn from(uri: DataUri) -> Self {
        uri.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_BYTES: [u8; 12] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 1, 2, 3, 4];

    #[test]
    fn test_parse_splits_mime_and_payload() {
        let uri = DataUri::parse("data:image/jpeg;base64,/9j/4AAQ").unwrap();
        assert_eq!(uri.mime_type(), "image/jpeg");
        assert_eq!(uri.data(), "/9j/4AAQ");
        assert_eq!(uri.format(), Some(ImageFormat::Jpeg));
        assert_eq!(uri.to_string(), "data:image/jpeg;base64,/9j/4AAQ");
    }

    #[test]
    fn test_parse_rejects_malformed_input() {
        for bad in [
            "",
            "image/png;base64,AAAA",
            "data:image/png,AAAA",
            "data:;base64,AAAA",
            "data:image/png;base64,",
            "https://example.com/cake.png",
        ] {
            assert!(
                matches!(DataUri::parse(bad), Err(ChefError::InvalidDataUri(_))),
                "accepted {bad:?}"
            );
        }
    }

    #[test]
    fn test_from_image_bytes_sniffs_format() {
        let uri = DataUri::from_image_bytes(&PNG_BYTES);
        assert_eq!(uri.mime_type(), "image/png");
        assert_eq!(uri.decode().unwrap(), PNG_BYTES);
    }

    #[test]
    fn test_decode_tolerates_missing_padding_and_whitespace() {
        let uri = DataUri::parse("data:image/png;base64,aGVs\nbG8").unwrap();
        assert_eq!(uri.decode().unwrap(), b"hello");
    }

    #[test]
    fn test_decode_rejects_garbage() {
        let uri = DataUri::new("image/png", "!!!not base64!!!");
        assert!(matches!(uri.decode(), Err(ChefError::Decode(_))));
    }

    #[test]
    fn test_unknown_mime_saves_as_png() {
        let uri = DataUri::new("image/heic", "AAAA");
        assert_eq!(uri.format(), None);
        assert_eq!(uri.file_extension(), "png");
    }

    #[test]
    fn test_serde_as_plain_string() {
        let uri = DataUri::new("image/png", "AAAA");
        let json = serde_json::to_string(&uri).unwrap();
        assert_eq!(json, "\"data:image/png;base64,AAAA\"");

        let back: DataUri = serde_json::from_str(&json).unwrap();
        assert_eq!(back, uri);
        assert!(serde_json::from_str::<DataUri>("\"nope\"").is_err());
    }

    #[test]
    fn test_save_writes_decoded_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dish.png");
        DataUri::from_bytes("image/png", &PNG_BYTES).save(&path).unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), PNG_BYTES);
    }
}
