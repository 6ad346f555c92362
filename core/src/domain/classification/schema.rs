use serde::Deserialize;
use serde_json::json;

/// Returns the JSON schema for zero-shot classification responses
pub fn get_classification_schema(classes: &[String]) -> serde_json::Value {
    json!({
        "type": "object",
        "properties": {
            "predictions": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "label": { "type": "string", "enum": classes },
                        "confidence": { "type": "number" }
                    },
                    "required": ["label", "confidence"]
                }
            }
        },
        "required": ["predictions"]
    })
}

#[derive(Debug, Deserialize)]
pub struct ClassificationResponse {
    pub predictions: Vec<Prediction>,
}

#[derive(Debug, Deserialize)]
pub struct Prediction {
    pub label: String,
    pub confidence: f32,
}
