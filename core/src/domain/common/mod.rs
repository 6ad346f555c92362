use std::collections::BTreeSet;
use std::time::Duration;

use crate::domain::image::entities::MimeType;

pub mod entities;

/// Default catalogue used when no food class file is configured.
pub const DEFAULT_FOOD_CLASSES: &[&str] = &["pizza", "pasta", "sushi", "burger", "salad"];

#[derive(Clone, Debug)]
pub struct RecipeLensConfig {
    pub pipeline: PipelineConfig,
    pub llm: LLMConfig,
}

#[derive(Clone, Debug)]
pub struct LLMConfig {
    pub gemini_api_key: String,
    pub gemini_model: String,
    pub gemini_vision_model: String,
    pub request_timeout: Duration,
    pub food_classes: FoodClassCatalogue,
}

/// Labels the classifier may choose from, with optional per-label descriptions.
#[derive(Clone, Debug, PartialEq)]
pub struct FoodClassCatalogue {
    pub classes: Vec<String>,
    pub descriptions: std::collections::HashMap<String, String>,
}

impl Default for FoodClassCatalogue {
    fn default() -> Self {
        Self {
            classes: DEFAULT_FOOD_CLASSES.iter().map(|c| c.to_string()).collect(),
            descriptions: Default::default(),
        }
    }
}

impl FoodClassCatalogue {
    pub fn description(&self, label: &str) -> Option<&str> {
        self.descriptions.get(label).map(String::as_str)
    }
}

/// Sampling parameters forwarded to the generative model.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ModelSettings {
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            temperature: 0.4,
            max_tokens: 2048,
        }
    }
}

/// Process-wide pipeline settings. Built once and shared read-only by every
/// execution.
#[derive(Clone, Debug)]
pub struct PipelineConfig {
    pub generation_timeout: Duration,
    pub classification_timeout: Duration,
    pub max_generation_retries: u32,
    pub max_classification_retries: u32,
    pub retry_backoff: Duration,
    pub max_image_bytes: usize,
    pub allowed_mime_types: BTreeSet<MimeType>,
    pub classifier_input_size: Option<u32>,
    pub top_k: usize,
    pub low_confidence_threshold: f32,
    pub attach_image_to_generation: bool,
    pub generation: ModelSettings,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            generation_timeout: Duration::from_secs(60),
            classification_timeout: Duration::from_secs(30),
            max_generation_retries: 2,
            max_classification_retries: 2,
            retry_backoff: Duration::from_millis(500),
            max_image_bytes: 5 * 1024 * 1024,
            allowed_mime_types: BTreeSet::from([MimeType::Jpeg, MimeType::Png]),
            classifier_input_size: Some(224),
            top_k: 3,
            low_confidence_threshold: 0.8,
            attach_image_to_generation: false,
            generation: ModelSettings::default(),
        }
    }
}
