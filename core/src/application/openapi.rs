use utoipa::OpenApi;

use crate::domain::{
    classification::{ClassificationResult, FoodLabel},
    recipe::{Ingredient, Quantity, Recipe, RecipeOrigin},
};

/// OpenAPI components for the values the pipeline hands back to callers.
#[derive(OpenApi)]
#[openapi(
    info(title = "RecipeLens"),
    components(schemas(Recipe, Ingredient, Quantity, RecipeOrigin, FoodLabel, ClassificationResult))
)]
pub struct RecipeLensApiDoc;
