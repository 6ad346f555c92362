use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A numeric amount, or a range such as `2-3`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Quantity {
    pub value: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upper: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Ingredient {
    /// The ingredient line as the model wrote it, bullets removed.
    pub text: String,
    pub quantity: Option<Quantity>,
    pub unit: Option<String>,
    pub name: String,
}

impl Ingredient {
    /// An ingredient whose amount could not be read. The whole line becomes
    /// the name.
    pub fn unparsed(text: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            name: text.clone(),
            text,
            quantity: None,
            unit: None,
        }
    }
}

/// How the dish was identified.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum RecipeOrigin {
    Classified {
        label: String,
        confidence: f32,
        alternatives: Vec<String>,
    },
    Described {
        text: String,
    },
}

/// A complete recipe. Title, ingredients and instructions are always
/// populated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Recipe {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub ingredients: Vec<Ingredient>,
    pub instructions: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prep_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cook_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub servings: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tips: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<RecipeOrigin>,
}

impl Recipe {
    pub fn with_origin(self, origin: RecipeOrigin) -> Self {
        Self {
            origin: Some(origin),
            ..self
        }
    }
}
