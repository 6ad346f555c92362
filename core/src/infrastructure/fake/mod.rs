//! Deterministic in-process collaborators for offline runs and tests.

use crate::domain::{
    classification::{
        entities::{ClassificationResult, FoodLabel},
        ports::FoodClassifier,
    },
    common::{
        FoodClassCatalogue,
        entities::app_errors::{ClassificationError, GenerationError},
    },
    image::entities::Bitmap,
    prompt::entities::GenerationRequest,
    recipe::ports::{RawGenerationOutput, RecipeGenerator},
};

/// Confidences handed out by [`FakeFoodClassifier::from_catalogue`], in order.
const CANNED_CONFIDENCES: &[f32] = &[0.7, 0.2, 0.1];

pub const DEFAULT_RECIPE: &str = "\
Title: Margherita Pizza
Description: A thin, crisp pizza topped with tomato, mozzarella and basil.
Prep Time: 20 minutes
Cook Time: 10 minutes
Servings: 2
Difficulty: Easy

Ingredients:
- 250g bread flour
- 160 ml warm water
- 1 tsp dried yeast
- 1/2 tsp salt
- 100g mozzarella
- 3 tbsp tomato sauce
- a handful of basil leaves

Instructions:
1. Mix the flour, water, yeast and salt into a soft dough.
2. Knead for 10 minutes and leave to rise for 1 hour.
3. Stretch the dough, spread the sauce and add the mozzarella.
4. Bake at 250°C for 10 minutes and finish with basil.

Tips:
- Preheat the oven with a baking stone for best results.
";

/// Always returns the same labels, whatever the bitmap.
#[derive(Debug, Clone)]
pub struct FakeFoodClassifier {
    labels: Vec<FoodLabel>,
}

impl FakeFoodClassifier {
    pub fn new(labels: Vec<FoodLabel>) -> Self {
        Self { labels }
    }

    /// The first catalogue classes with descending confidences.
    pub fn from_catalogue(catalogue: &FoodClassCatalogue) -> Self {
        let labels = catalogue
            .classes
            .iter()
            .zip(CANNED_CONFIDENCES)
            .map(|(class, confidence)| {
                let label = FoodLabel::new(class.clone(), *confidence);
                match catalogue.description(class) {
                    Some(description) => label.with_description(description),
                    None => label,
                }
            })
            .collect();
        Self { labels }
    }
}

impl Default for FakeFoodClassifier {
    fn default() -> Self {
        Self::from_catalogue(&FoodClassCatalogue::default())
    }
}

impl FoodClassifier for FakeFoodClassifier {
    async fn classify(&self, _bitmap: &Bitmap) -> Result<ClassificationResult, ClassificationError> {
        ClassificationResult::new(self.labels.clone())
    }
}

/// Answers with canned text chosen by prompt substring (first match wins),
/// falling back to a default.
#[derive(Debug, Clone)]
pub struct FakeRecipeGenerator {
    responses: Vec<(String, String)>,
    default_response: Option<String>,
}

impl Default for FakeRecipeGenerator {
    fn default() -> Self {
        Self {
            responses: Vec::new(),
            default_response: Some(DEFAULT_RECIPE.to_string()),
        }
    }
}

impl FakeRecipeGenerator {
    /// A generator with no responses at all.
    pub fn new() -> Self {
        Self {
            responses: Vec::new(),
            default_response: None,
        }
    }

    pub fn with_response(mut self, prompt_contains: &str, response: &str) -> Self {
        self.responses
            .push((prompt_contains.to_lowercase(), response.to_string()));
        self
    }

    pub fn with_default_response(mut self, response: &str) -> Self {
        self.default_response = Some(response.to_string());
        self
    }

    fn respond(&self, prompt: &str) -> Option<&str> {
        let prompt = prompt.to_lowercase();
        self.responses
            .iter()
            .find(|(needle, _)| prompt.contains(needle.as_str()))
            .map(|(_, response)| response.as_str())
            .or(self.default_response.as_deref())
    }
}

impl RecipeGenerator for FakeRecipeGenerator {
    async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<RawGenerationOutput, GenerationError> {
        self.respond(request.prompt())
            .map(RawGenerationOutput::new)
            .ok_or_else(|| {
                GenerationError::Rejected("no canned response matches the prompt".to_string())
            })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn test_catalogue_labels_are_ranked() {
        let catalogue = FoodClassCatalogue {
            classes: vec!["ramen".into(), "pho".into(), "udon".into(), "soba".into()],
            descriptions: HashMap::from([("ramen".to_string(), "Noodle soup.".to_string())]),
        };
        let classifier = FakeFoodClassifier::from_catalogue(&catalogue);
        let labels: Vec<_> = classifier.labels.iter().map(|l| l.label.as_str()).collect();
        assert_eq!(labels, vec!["ramen", "pho", "udon"]);
        assert_eq!(classifier.labels[0].description.as_deref(), Some("Noodle soup."));
    }

    #[test]
    fn test_responses_match_case_insensitively() {
        let generator = FakeRecipeGenerator::new()
            .with_response("Sushi", "Title: Sushi")
            .with_default_response("Title: Anything");
        assert_eq!(generator.respond("a recipe for SUSHI"), Some("Title: Sushi"));
        assert_eq!(generator.respond("a recipe for pasta"), Some("Title: Anything"));
        assert_eq!(FakeRecipeGenerator::new().respond("pasta"), None);
    }
}
