use std::collections::BTreeSet;

use image::imageops::FilterType;
use tracing::instrument;

use crate::domain::{
    common::{PipelineConfig, entities::app_errors::InvalidImageError},
    image::entities::{Bitmap, MimeType},
};

/// Validates uploads and turns them into classifier-ready bitmaps.
#[derive(Debug, Clone)]
pub struct ImageDecoder {
    max_bytes: usize,
    allowed: BTreeSet<MimeType>,
    target_size: Option<u32>,
}

impl ImageDecoder {
    pub fn new(max_bytes: usize, allowed: BTreeSet<MimeType>, target_size: Option<u32>) -> Self {
        Self {
            max_bytes,
            allowed,
            target_size,
        }
    }

    pub fn from_config(config: &PipelineConfig) -> Self {
        Self::new(
            config.max_image_bytes,
            config.allowed_mime_types.clone(),
            config.classifier_input_size,
        )
    }

    /// Check size and declared type, decode, and fit to the classifier input
    /// size. Resizing scales the shorter side to the target and center-crops
    /// the longer one, so the aspect ratio is preserved.
    #[instrument(skip(self, bytes), fields(size = bytes.len()))]
    pub fn decode(&self, bytes: &[u8], mime_type: &str) -> Result<Bitmap, InvalidImageError> {
        if bytes.is_empty() {
            return Err(InvalidImageError::Empty);
        }

        if bytes.len() > self.max_bytes {
            return Err(InvalidImageError::TooLarge {
                size: bytes.len(),
                max: self.max_bytes,
            });
        }

        let mime = mime_type
            .parse::<MimeType>()
            .ok()
            .filter(|m| self.allowed.contains(m))
            .ok_or_else(|| InvalidImageError::UnsupportedMimeType(mime_type.to_string()))?;

        let decoded = image::load_from_memory_with_format(bytes, mime.image_format())
            .map_err(|e| InvalidImageError::Decode(e.to_string()))?;

        if decoded.width() == 0 || decoded.height() == 0 {
            return Err(InvalidImageError::Decode("image has no pixels".to_string()));
        }

        let fitted = match self.target_size {
            Some(size) => decoded.resize_to_fill(size, size, FilterType::CatmullRom),
            None => decoded,
        };

        tracing::debug!(
            width = fitted.width(),
            height = fitted.height(),
            mime = %mime,
            "image decoded"
        );

        Ok(Bitmap::new(fitted.to_rgb8()))
    }
}
