use std::time::Duration;

use serde::Serialize;
use thiserror::Error;

use crate::domain::pipeline::state::Stage;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidImageError {
    #[error("image is empty")]
    Empty,

    #[error("image is {size} bytes, the maximum is {max}")]
    TooLarge { size: usize, max: usize },

    #[error("unsupported image type: {0}")]
    UnsupportedMimeType(String),

    #[error("could not decode image: {0}")]
    Decode(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("no food label or description was provided")]
pub struct EmptyInputError;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClassificationError {
    #[error("classifier did not answer within {0:?}")]
    Timeout(Duration),

    #[error("classifier is rate limiting requests")]
    RateLimited { retry_after: Option<Duration> },

    #[error("classifier unavailable: {0}")]
    Unavailable(String),

    #[error("classifier rejected the request: {0}")]
    Rejected(String),

    #[error("classifier returned an unusable response: {0}")]
    MalformedResponse(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerationError {
    #[error("generator did not answer within {0:?}")]
    Timeout(Duration),

    #[error("generator is rate limiting requests")]
    RateLimited { retry_after: Option<Duration> },

    #[error("generator unavailable: {0}")]
    Unavailable(String),

    #[error("generator rejected the request: {0}")]
    Rejected(String),

    #[error("generator returned an unusable response: {0}")]
    MalformedResponse(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MalformedRecipeError {
    #[error("model output is empty")]
    EmptyOutput,

    #[error("recipe has no title")]
    MissingTitle,

    #[error("recipe has no ingredients")]
    MissingIngredients,

    #[error("recipe has no instructions")]
    MissingInstructions,
}

/// Failure of an external call that may or may not succeed when repeated.
pub trait Transience {
    fn is_transient(&self) -> bool;

    /// The error recorded when the caller gave up waiting.
    fn timed_out(after: Duration) -> Self;

    /// A delay requested by the collaborator before the next attempt.
    fn retry_after(&self) -> Option<Duration> {
        None
    }
}

impl Transience for ClassificationError {
    fn is_transient(&self) -> bool {
        matches!(
            self,
            ClassificationError::Timeout(_)
                | ClassificationError::RateLimited { .. }
                | ClassificationError::Unavailable(_)
        )
    }

    fn timed_out(after: Duration) -> Self {
        ClassificationError::Timeout(after)
    }

    fn retry_after(&self) -> Option<Duration> {
        match self {
            ClassificationError::RateLimited { retry_after } => *retry_after,
            _ => None,
        }
    }
}

impl Transience for GenerationError {
    fn is_transient(&self) -> bool {
        matches!(
            self,
            GenerationError::Timeout(_)
                | GenerationError::RateLimited { .. }
                | GenerationError::Unavailable(_)
        )
    }

    fn timed_out(after: Duration) -> Self {
        GenerationError::Timeout(after)
    }

    fn retry_after(&self) -> Option<Duration> {
        match self {
            GenerationError::RateLimited { retry_after } => *retry_after,
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidImage,
    EmptyInput,
    Classification,
    Generation,
    MalformedRecipe,
    Cancelled,
}

/// Any error a pipeline stage can raise, carried unchanged to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StageError {
    #[error(transparent)]
    InvalidImage(#[from] InvalidImageError),

    #[error(transparent)]
    EmptyInput(#[from] EmptyInputError),

    #[error(transparent)]
    Classification(#[from] ClassificationError),

    #[error(transparent)]
    Generation(#[from] GenerationError),

    #[error(transparent)]
    MalformedRecipe(#[from] MalformedRecipeError),

    #[error("request was cancelled")]
    Cancelled,
}

impl StageError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            StageError::InvalidImage(_) => ErrorKind::InvalidImage,
            StageError::EmptyInput(_) => ErrorKind::EmptyInput,
            StageError::Classification(_) => ErrorKind::Classification,
            StageError::Generation(_) => ErrorKind::Generation,
            StageError::MalformedRecipe(_) => ErrorKind::MalformedRecipe,
            StageError::Cancelled => ErrorKind::Cancelled,
        }
    }

    pub fn is_transient(&self) -> bool {
        match self {
            StageError::Classification(e) => e.is_transient(),
            StageError::Generation(e) => e.is_transient(),
            _ => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{stage} failed: {cause}")]
pub struct PipelineError {
    pub kind: ErrorKind,
    pub stage: Stage,
    pub cause: StageError,
    /// Calls made to the failing stage, retries included.
    pub attempts: u32,
}

impl PipelineError {
    pub fn new(stage: Stage, cause: impl Into<StageError>, attempts: u32) -> Self {
        let cause = cause.into();
        Self {
            kind: cause.kind(),
            stage,
            cause,
            attempts,
        }
    }

    pub fn cancelled(stage: Stage) -> Self {
        Self::new(stage, StageError::Cancelled, 0)
    }

    /// Message suitable for showing to the person who submitted the request.
    pub fn user_message(&self) -> String {
        match &self.cause {
            StageError::InvalidImage(e) => {
                format!("The uploaded image could not be used ({e}). Please upload a JPEG or PNG photo.")
            }
            StageError::EmptyInput(_) => {
                "Please describe a dish or upload a photo of one.".to_string()
            }
            StageError::Classification(e) if e.is_transient() => {
                "We could not identify the dish right now. Please try again in a moment.".to_string()
            }
            StageError::Classification(_) => {
                "We could not identify the dish in this photo.".to_string()
            }
            StageError::Generation(e) if e.is_transient() => {
                "The recipe service is busy. Please try again in a moment.".to_string()
            }
            StageError::Generation(_) => "We couldn't generate a recipe at this time.".to_string(),
            StageError::MalformedRecipe(e) => {
                format!("The generated recipe was incomplete ({e}). Please try again.")
            }
            StageError::Cancelled => "The request was cancelled.".to_string(),
        }
    }
}
