use std::fmt;
use std::io::Cursor;
use std::str::FromStr;

use bytes::Bytes;
use image::{ImageFormat, RgbImage};
use serde::{Deserialize, Serialize};

/// Image formats the pipeline accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum MimeType {
    #[serde(rename = "image/jpeg")]
    Jpeg,
    #[serde(rename = "image/png")]
    Png,
}

impl MimeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MimeType::Jpeg => "image/jpeg",
            MimeType::Png => "image/png",
        }
    }

    pub fn image_format(&self) -> ImageFormat {
        match self {
            MimeType::Jpeg => ImageFormat::Jpeg,
            MimeType::Png => ImageFormat::Png,
        }
    }

    /// Guess from a file extension (`jpg`, `jpeg`, `png`).
    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension.to_ascii_lowercase().as_str() {
            "jpg" | "jpeg" => Some(MimeType::Jpeg),
            "png" => Some(MimeType::Png),
            _ => None,
        }
    }
}

impl fmt::Display for MimeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MimeType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        let essence = normalized.split(';').next().unwrap_or_default().trim();
        match essence {
            "image/jpeg" | "image/jpg" | "image/pjpeg" | "jpeg" | "jpg" => Ok(MimeType::Jpeg),
            "image/png" | "png" => Ok(MimeType::Png),
            other => Err(other.to_string()),
        }
    }
}

/// An uploaded image as received from the caller.
#[derive(Debug, Clone)]
pub struct ImageInput {
    pub bytes: Bytes,
    /// Declared content type, e.g. `image/png`.
    pub mime_type: String,
}

impl ImageInput {
    pub fn new(bytes: impl Into<Bytes>, mime_type: impl Into<String>) -> Self {
        Self {
            bytes: bytes.into(),
            mime_type: mime_type.into(),
        }
    }
}

/// Decoded RGB pixels, already sized for the classifier when it needs a fixed
/// input.
#[derive(Debug, Clone, PartialEq)]
pub struct Bitmap {
    pixels: RgbImage,
}

impl Bitmap {
    pub fn new(pixels: RgbImage) -> Self {
        Self { pixels }
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn pixels(&self) -> &RgbImage {
        &self.pixels
    }

    /// Re-encode as PNG for collaborators that take encoded images.
    pub fn to_png(&self) -> Result<Vec<u8>, image::ImageError> {
        let mut buf = Cursor::new(Vec::new());
        self.pixels.write_to(&mut buf, ImageFormat::Png)?;
        Ok(buf.into_inner())
    }
}

/// Encoded image sent alongside a prompt to a multimodal model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageAttachment {
    pub mime_type: MimeType,
    pub data: Bytes,
}
