pub mod openapi;

use std::{collections::HashMap, path::Path};

use serde::Deserialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::{
    domain::{
        common::{FoodClassCatalogue, RecipeLensConfig},
        pipeline::RecipePipeline,
    },
    infrastructure::{
        fake::{FakeFoodClassifier, FakeRecipeGenerator},
        llm::GeminiLLMClient,
    },
};

pub type GeminiRecipePipeline = RecipePipeline<GeminiLLMClient, GeminiLLMClient>;
pub type OfflineRecipePipeline = RecipePipeline<FakeFoodClassifier, FakeRecipeGenerator>;

/// Pipeline backed by Gemini for both classification and generation. One
/// HTTP client is shared by the two roles.
pub fn create_service(config: RecipeLensConfig) -> GeminiRecipePipeline {
    let client = GeminiLLMClient::from_config(&config.llm, config.pipeline.top_k);
    RecipePipeline::new(config.pipeline, client.clone(), client)
}

/// Pipeline backed by the canned in-process collaborators.
pub fn create_offline_service(config: RecipeLensConfig) -> OfflineRecipePipeline {
    let classifier = FakeFoodClassifier::from_catalogue(&config.llm.food_classes);
    RecipePipeline::new(config.pipeline, classifier, FakeRecipeGenerator::default())
}

#[derive(Debug, Error)]
pub enum CatalogueError {
    #[error("cannot read food class file: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid food class file: {0}")]
    Json(#[from] serde_json::Error),

    #[error("food class file lists no classes")]
    Empty,
}

#[derive(Debug, Deserialize)]
struct FoodClassFile {
    classes: Vec<String>,
    #[serde(default)]
    class_descriptions: HashMap<String, String>,
}

/// Parse a `{ "classes": [...], "class_descriptions": {...} }` document.
pub fn parse_food_classes(json: &str) -> Result<FoodClassCatalogue, CatalogueError> {
    let file: FoodClassFile = serde_json::from_str(json)?;
    let classes: Vec<String> = file
        .classes
        .into_iter()
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
        .collect();

    if classes.is_empty() {
        return Err(CatalogueError::Empty);
    }

    Ok(FoodClassCatalogue {
        classes,
        descriptions: file.class_descriptions,
    })
}

pub fn load_food_classes(path: &Path) -> Result<FoodClassCatalogue, CatalogueError> {
    let json = std::fs::read_to_string(path)?;
    parse_food_classes(&json)
}

/// The catalogue at `path`, or the built-in one when no path is given or the
/// file cannot be used.
pub fn food_classes_or_default(path: Option<&Path>) -> FoodClassCatalogue {
    let Some(path) = path else {
        return FoodClassCatalogue::default();
    };

    match load_food_classes(path) {
        Ok(catalogue) => {
            info!(path = %path.display(), classes = catalogue.classes.len(), "loaded food classes");
            catalogue
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "using default food classes");
            FoodClassCatalogue::default()
        }
    }
}
