use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::common::entities::app_errors::ClassificationError;

/// One candidate identity for the pictured dish.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct FoodLabel {
    pub label: String,
    pub confidence: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl FoodLabel {
    pub fn new(label: impl Into<String>, confidence: f32) -> Self {
        Self {
            label: label.into(),
            confidence,
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Candidate labels ordered by descending confidence. Never empty.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct ClassificationResult {
    labels: Vec<FoodLabel>,
}

impl ClassificationResult {
    /// Orders the labels by confidence. Fails on an empty list, a blank label
    /// or a confidence outside `[0, 1]`.
    pub fn new(mut labels: Vec<FoodLabel>) -> Result<Self, ClassificationError> {
        if labels.is_empty() {
            return Err(ClassificationError::MalformedResponse(
                "classifier returned no labels".to_string(),
            ));
        }

        if let Some(bad) = labels
            .iter()
            .find(|l| !(0.0..=1.0).contains(&l.confidence) || l.label.trim().is_empty())
        {
            return Err(ClassificationError::MalformedResponse(format!(
                "invalid label {:?} with confidence {}",
                bad.label, bad.confidence
            )));
        }

        // stable sort keeps classifier order between equal scores
        labels.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));

        Ok(Self { labels })
    }

    pub fn top(&self) -> &FoodLabel {
        &self.labels[0]
    }

    /// Every label after the top one, best first.
    pub fn alternatives(&self) -> &[FoodLabel] {
        &self.labels[1..]
    }

    pub fn labels(&self) -> &[FoodLabel] {
        &self.labels
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Keep the `k` most confident labels (at least one is always kept).
    pub fn truncate(mut self, k: usize) -> Self {
        self.labels.truncate(k.max(1));
        self
    }
}
