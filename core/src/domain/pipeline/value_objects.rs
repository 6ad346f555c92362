use crate::domain::image::entities::ImageInput;

#[derive(Debug, Clone)]
pub enum RecipeInput {
    Image(ImageInput),
    Text(String),
}

/// One submission: an image or a dish description, plus optional dietary
/// preferences.
#[derive(Debug, Clone)]
pub struct RecipeRequest {
    pub input: RecipeInput,
    pub preferences: Option<String>,
}

impl RecipeRequest {
    pub fn image(input: ImageInput) -> Self {
        Self {
            input: RecipeInput::Image(input),
            preferences: None,
        }
    }

    pub fn text(description: impl Into<String>) -> Self {
        Self {
            input: RecipeInput::Text(description.into()),
            preferences: None,
        }
    }

    pub fn with_preferences(mut self, preferences: impl Into<String>) -> Self {
        self.preferences = Some(preferences.into());
        self
    }
}
