use crate::domain::{common::ModelSettings, image::entities::ImageAttachment};

/// Everything the generative model receives for one call. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    prompt: String,
    image: Option<ImageAttachment>,
    settings: ModelSettings,
}

impl GenerationRequest {
    pub(crate) fn new(
        prompt: String,
        image: Option<ImageAttachment>,
        settings: ModelSettings,
    ) -> Self {
        Self {
            prompt,
            image,
            settings,
        }
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn image(&self) -> Option<&ImageAttachment> {
        self.image.as_ref()
    }

    pub fn settings(&self) -> ModelSettings {
        self.settings
    }
}
