use std::future::Future;
use std::time::Duration;

use crate::domain::{
    common::entities::app_errors::GenerationError, prompt::entities::GenerationRequest,
};

/// Unparsed model answer.
#[derive(Debug, Clone, PartialEq)]
pub struct RawGenerationOutput {
    pub text: String,
    pub latency: Duration,
    /// The model stopped because it hit the token limit.
    pub truncated: bool,
}

impl RawGenerationOutput {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            latency: Duration::ZERO,
            truncated: false,
        }
    }
}

/// Generative model that writes the recipe text.
///
/// Shared by concurrent pipeline executions; implementations hold only
/// immutable state and a thread-safe client handle.
#[cfg_attr(test, mockall::automock)]
pub trait RecipeGenerator: Send + Sync {
    fn generate(
        &self,
        request: &GenerationRequest,
    ) -> impl Future<Output = Result<RawGenerationOutput, GenerationError>> + Send;
}
