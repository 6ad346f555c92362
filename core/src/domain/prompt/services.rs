use std::fmt::Write as _;

use crate::domain::{
    classification::entities::ClassificationResult,
    common::{ModelSettings, PipelineConfig, entities::app_errors::EmptyInputError},
    image::entities::ImageAttachment,
    prompt::entities::GenerationRequest,
};

/// Section layout the model is asked to follow. `RecipeParser` recognizes the
/// same headers.
const FORMAT_INSTRUCTIONS: &str = "\
Reply using exactly the structure below. Put every section header on its own line \
and do not write anything before the title line.

Title: <recipe title>
Description: <one or two sentences introducing the dish>
Prep Time: <duration>
Cook Time: <duration>
Servings: <number of servings>
Difficulty: <Easy, Medium or Hard>

Ingredients:
- <quantity> <unit> <ingredient>
(one ingredient per line)

Instructions:
1. <step>
(one numbered step per line, in the order they are performed)

Tips:
- <tip>
(optional)
";

/// Maximum number of alternative dishes mentioned for uncertain labels.
const MAX_ALTERNATIVES: usize = 2;

/// Builds generation requests. Output depends only on the inputs: no clock,
/// no randomness.
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    settings: ModelSettings,
    low_confidence_threshold: f32,
}

impl PromptBuilder {
    pub fn new(settings: ModelSettings, low_confidence_threshold: f32) -> Self {
        Self {
            settings,
            low_confidence_threshold,
        }
    }

    pub fn from_config(config: &PipelineConfig) -> Self {
        Self::new(config.generation, config.low_confidence_threshold)
    }

    pub fn build_from_label(
        &self,
        label: &str,
        confidence: f32,
    ) -> Result<GenerationRequest, EmptyInputError> {
        let label = non_blank(label)?;
        let details = self.identification(label, confidence, &[]);
        Ok(self.request(label, &details, None))
    }

    pub fn build_from_text(&self, freeform_text: &str) -> Result<GenerationRequest, EmptyInputError> {
        self.build_from_description(freeform_text, None)
    }

    /// Prompt for a free-form dish description, with optional dietary
    /// preferences.
    pub fn build_from_description(
        &self,
        freeform_text: &str,
        preferences: Option<&str>,
    ) -> Result<GenerationRequest, EmptyInputError> {
        let text = non_blank(freeform_text)?;
        let mut details = String::new();
        push_preferences(&mut details, preferences);

        Ok(self.request(text, &details, None))
    }

    /// Prompt for the best label of a classification. Uncertain results also
    /// name the runner-up dishes.
    pub fn build_from_classification(
        &self,
        classification: &ClassificationResult,
        preferences: Option<&str>,
        image: Option<ImageAttachment>,
    ) -> Result<GenerationRequest, EmptyInputError> {
        let top = classification.top();
        let label = non_blank(&top.label)?;
        let alternatives: Vec<&str> = classification
            .alternatives()
            .iter()
            .map(|l| l.label.trim())
            .filter(|l| !l.is_empty())
            .take(MAX_ALTERNATIVES)
            .collect();

        let mut details = self.identification(label, top.confidence, &alternatives);
        if let Some(description) = top
            .description
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty())
        {
            let _ = write!(details, " {description}");
        }
        push_preferences(&mut details, preferences);

        Ok(self.request(label, &details, image))
    }

    fn identification(&self, label: &str, confidence: f32, alternatives: &[&str]) -> String {
        let mut details = format!("The image shows {label}.");
        if confidence < self.low_confidence_threshold && !alternatives.is_empty() {
            let _ = write!(details, " It might also be {}.", alternatives.join(" or "));
        }
        details
    }

    fn request(
        &self,
        subject: &str,
        details: &str,
        image: Option<ImageAttachment>,
    ) -> GenerationRequest {
        let mut prompt = format!("Create a detailed recipe for {subject}.");
        if !details.is_empty() {
            prompt.push(' ');
            prompt.push_str(details.trim_start());
        }
        prompt.push_str("\n\n");
        prompt.push_str(FORMAT_INSTRUCTIONS);

        GenerationRequest::new(prompt, image, self.settings)
    }
}

fn non_blank(value: &str) -> Result<&str, EmptyInputError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(EmptyInputError)
    } else {
        Ok(trimmed)
    }
}

fn push_preferences(details: &mut String, preferences: Option<&str>) {
    if let Some(prefs) = preferences.map(str::trim).filter(|p| !p.is_empty()) {
        let _ = write!(
            details,
            " Please consider these dietary preferences: {prefs}."
        );
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;

    use super::*;
    use crate::domain::{classification::entities::FoodLabel, image::entities::MimeType};

    fn builder() -> PromptBuilder {
        PromptBuilder::from_config(&PipelineConfig::default())
    }

    #[test]
    fn test_label_prompt_is_byte_identical() {
        let a = builder().build_from_label("pizza", 0.9).unwrap();
        let b = builder().build_from_label("pizza", 0.9).unwrap();
        assert_eq!(a.prompt().as_bytes(), b.prompt().as_bytes());
        assert_eq!(a, b);
    }

    #[test]
    fn test_label_prompt_contains_section_contract() {
        let request = builder().build_from_label("pizza", 0.9).unwrap();
        let prompt = request.prompt();
        assert!(prompt.starts_with("Create a detailed recipe for pizza. The image shows pizza."));
        assert!(prompt.contains("\nTitle: "));
        assert!(prompt.contains("\nIngredients:\n"));
        assert!(prompt.contains("\nInstructions:\n1. "));
        assert!(request.image().is_none());
    }

    #[test]
    fn test_blank_inputs_are_rejected() {
        assert_eq!(builder().build_from_label("   ", 0.9), Err(EmptyInputError));
        assert_eq!(builder().build_from_text(""), Err(EmptyInputError));
        assert_eq!(builder().build_from_text(" \n\t "), Err(EmptyInputError));
    }

    #[test]
    fn test_text_prompt_trims_input() {
        let request = builder()
            .build_from_text("  creamy mushroom risotto \n")
            .unwrap();
        assert!(
            request
                .prompt()
                .starts_with("Create a detailed recipe for creamy mushroom risotto.\n\n")
        );
    }

    #[test]
    fn test_preferences_are_appended() {
        let request = builder()
            .build_from_description("vegetarian lasagna", Some("Gluten-free, low-carb"))
            .unwrap();
        assert!(request.prompt().starts_with(
            "Create a detailed recipe for vegetarian lasagna. \
             Please consider these dietary preferences: Gluten-free, low-carb."
        ));
    }

    #[test]
    fn test_low_confidence_mentions_alternatives() {
        let classification = ClassificationResult::new(vec![
            FoodLabel::new("pizza", 0.5),
            FoodLabel::new("flatbread", 0.3),
            FoodLabel::new("quiche", 0.15),
            FoodLabel::new("salad", 0.05),
        ])
        .unwrap();

        let request = builder()
            .build_from_classification(&classification, None, None)
            .unwrap();
        assert!(request.prompt().starts_with(
            "Create a detailed recipe for pizza. The image shows pizza. \
             It might also be flatbread or quiche.\n\n"
        ));
    }

    #[test]
    fn test_confident_label_skips_alternatives_and_adds_description() {
        let classification = ClassificationResult::new(vec![
            FoodLabel::new("sushi", 0.92).with_description("Rolls of vinegared rice and raw fish."),
            FoodLabel::new("onigiri", 0.05),
        ])
        .unwrap();

        let request = builder()
            .build_from_classification(&classification, Some("no shellfish"), None)
            .unwrap();
        assert!(request.prompt().starts_with(
            "Create a detailed recipe for sushi. The image shows sushi. \
             Rolls of vinegared rice and raw fish. \
             Please consider these dietary preferences: no shellfish.\n\n"
        ));
    }

    #[test]
    fn test_attachment_and_settings_are_carried() {
        let classification =
            ClassificationResult::new(vec![FoodLabel::new("burger", 0.99)]).unwrap();
        let attachment = ImageAttachment {
            mime_type: MimeType::Png,
            data: Bytes::from_static(b"png"),
        };
        let request = builder()
            .build_from_classification(&classification, None, Some(attachment.clone()))
            .unwrap();
        assert_eq!(request.image(), Some(&attachment));
        assert_eq!(request.settings(), ModelSettings::default());
    }
}
