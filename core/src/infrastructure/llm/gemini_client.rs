use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use base64::{Engine as _, engine::general_purpose};
use reqwest::{Client, StatusCode, header::RETRY_AFTER};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::domain::{
    classification::{
        entities::{ClassificationResult, FoodLabel},
        ports::FoodClassifier,
        schema::{ClassificationResponse, get_classification_schema},
    },
    common::{
        FoodClassCatalogue, LLMConfig,
        entities::app_errors::{ClassificationError, GenerationError},
    },
    image::entities::{Bitmap, MimeType},
    prompt::entities::GenerationRequest,
    recipe::ports::{RawGenerationOutput, RecipeGenerator},
};

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Gemini `generateContent` client. Cloning is cheap and every clone shares
/// the same connection pool.
#[derive(Debug, Clone)]
pub struct GeminiLLMClient {
    api_key: String,
    model_name: String,
    vision_model_name: String,
    base_url: String,
    request_timeout: Duration,
    food_classes: Arc<FoodClassCatalogue>,
    top_k: usize,
    client: Client,
}

#[derive(Debug, Serialize)]
struct GeminiRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Part {
    Text { text: String },
    InlineData { inline_data: InlineData },
}

#[derive(Debug, Serialize)]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Default, Serialize)]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_schema: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<ContentResponse>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ContentResponse {
    #[serde(default)]
    parts: Vec<PartResponse>,
}

#[derive(Debug, Deserialize)]
struct PartResponse {
    text: Option<String>,
}

#[derive(Debug)]
struct GeminiReply {
    text: String,
    truncated: bool,
}

/// Failure of one Gemini call, before it is attributed to a stage.
#[derive(Debug, Clone, PartialEq, Eq)]
enum CallError {
    Timeout(Duration),
    RateLimited(Option<Duration>),
    Unavailable(String),
    Rejected(String),
    Malformed(String),
}

impl From<CallError> for GenerationError {
    fn from(e: CallError) -> Self {
        match e {
            CallError::Timeout(after) => GenerationError::Timeout(after),
            CallError::RateLimited(retry_after) => GenerationError::RateLimited { retry_after },
            CallError::Unavailable(msg) => GenerationError::Unavailable(msg),
            CallError::Rejected(msg) => GenerationError::Rejected(msg),
            CallError::Malformed(msg) => GenerationError::MalformedResponse(msg),
        }
    }
}

impl From<CallError> for ClassificationError {
    fn from(e: CallError) -> Self {
        match e {
            CallError::Timeout(after) => ClassificationError::Timeout(after),
            CallError::RateLimited(retry_after) => ClassificationError::RateLimited { retry_after },
            CallError::Unavailable(msg) => ClassificationError::Unavailable(msg),
            CallError::Rejected(msg) => ClassificationError::Rejected(msg),
            CallError::Malformed(msg) => ClassificationError::MalformedResponse(msg),
        }
    }
}

impl GeminiLLMClient {
    pub fn new(api_key: String, model_name: String) -> Self {
        Self {
            api_key,
            vision_model_name: model_name.clone(),
            model_name,
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout: Duration::from_secs(60),
            food_classes: Arc::new(FoodClassCatalogue::default()),
            top_k: 3,
            client: Client::new(),
        }
    }

    pub fn from_config(config: &LLMConfig, top_k: usize) -> Self {
        Self {
            vision_model_name: config.gemini_vision_model.clone(),
            request_timeout: config.request_timeout,
            food_classes: Arc::new(config.food_classes.clone()),
            top_k,
            ..Self::new(config.gemini_api_key.clone(), config.gemini_model.clone())
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    async fn call_gemini_api(
        &self,
        model: &str,
        request: GeminiRequest,
    ) -> Result<GeminiReply, CallError> {
        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url, model, self.api_key
        );

        let response = self
            .client
            .post(&url)
            .timeout(self.request_timeout)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Gemini API request failed: {}", e);
                transport_error(&e, self.request_timeout)
            })?;

        let status = response.status();
        if !status.is_success() {
            let retry_after = response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse::<u64>().ok())
                .map(Duration::from_secs);
            let error_text = response.text().await.unwrap_or_default();
            tracing::error!("Gemini API error: {} - {}", status, error_text);
            return Err(status_error(
                status,
                error_text,
                retry_after,
                self.request_timeout,
            ));
        }

        let gemini_response: GeminiResponse = response.json().await.map_err(|e| {
            tracing::error!("Failed to parse Gemini response: {}", e);
            if e.is_timeout() {
                CallError::Timeout(self.request_timeout)
            } else {
                CallError::Malformed(format!("failed to parse response: {e}"))
            }
        })?;

        first_candidate(gemini_response)
    }

    fn classification_prompt(&self) -> String {
        format!(
            "Identify the dish in this photo. Choose labels only from this list: {}. \
             Return at most {} predictions, most likely first, each with a confidence \
             between 0 and 1. The confidences must not add up to more than 1.",
            self.food_classes.classes.join(", "),
            self.top_k.max(1)
        )
    }
}

fn transport_error(e: &reqwest::Error, timeout: Duration) -> CallError {
    if e.is_timeout() {
        CallError::Timeout(timeout)
    } else if e.is_builder() {
        CallError::Rejected(format!("invalid request: {e}"))
    } else {
        CallError::Unavailable(e.to_string())
    }
}

fn status_error(
    status: StatusCode,
    body: String,
    retry_after: Option<Duration>,
    timeout: Duration,
) -> CallError {
    let message = format!("{status}: {body}");
    match status.as_u16() {
        429 => CallError::RateLimited(retry_after),
        408 => CallError::Timeout(timeout),
        500 | 502 | 503 | 504 => CallError::Unavailable(message),
        _ => CallError::Rejected(message),
    }
}

fn first_candidate(response: GeminiResponse) -> Result<GeminiReply, CallError> {
    let candidate = response
        .candidates
        .into_iter()
        .next()
        .ok_or_else(|| CallError::Malformed("no candidates in response".to_string()))?;

    let text: String = candidate
        .content
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();

    if text.trim().is_empty() {
        return Err(CallError::Malformed(format!(
            "candidate has no text (finish reason {})",
            candidate.finish_reason.as_deref().unwrap_or("unknown")
        )));
    }

    Ok(GeminiReply {
        text,
        truncated: candidate.finish_reason.as_deref() == Some("MAX_TOKENS"),
    })
}

/// Clamp confidences, attach catalogue descriptions and keep the best `top_k`.
fn to_classification(
    response: ClassificationResponse,
    catalogue: &FoodClassCatalogue,
    top_k: usize,
) -> Result<ClassificationResult, ClassificationError> {
    let labels = response
        .predictions
        .into_iter()
        .map(|p| {
            let label = p.label.trim().to_string();
            let food = FoodLabel::new(label.clone(), p.confidence.clamp(0.0, 1.0));
            match catalogue.description(&label) {
                Some(description) => food.with_description(description),
                None => food,
            }
        })
        .collect();

    Ok(ClassificationResult::new(labels)?.truncate(top_k))
}

impl RecipeGenerator for GeminiLLMClient {
    #[instrument(skip_all, fields(model = %self.model_name, image = request.image().is_some()))]
    async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<RawGenerationOutput, GenerationError> {
        let mut parts = vec![Part::Text {
            text: request.prompt().to_string(),
        }];
        if let Some(image) = request.image() {
            parts.push(Part::InlineData {
                inline_data: InlineData {
                    mime_type: image.mime_type.as_str().to_string(),
                    data: general_purpose::STANDARD.encode(&image.data),
                },
            });
        }

        let settings = request.settings();
        let body = GeminiRequest {
            contents: vec![Content { parts }],
            generation_config: Some(GenerationConfig {
                temperature: Some(settings.temperature),
                max_output_tokens: Some(settings.max_tokens),
                ..Default::default()
            }),
        };

        let model = if request.image().is_some() {
            &self.vision_model_name
        } else {
            &self.model_name
        };

        let started = Instant::now();
        let reply = self.call_gemini_api(model, body).await?;
        let latency = started.elapsed();

        tracing::debug!(
            latency_ms = latency.as_millis() as u64,
            truncated = reply.truncated,
            "Gemini generation finished"
        );

        Ok(RawGenerationOutput {
            text: reply.text,
            latency,
            truncated: reply.truncated,
        })
    }
}

impl FoodClassifier for GeminiLLMClient {
    #[instrument(skip_all, fields(model = %self.vision_model_name, classes = self.food_classes.classes.len()))]
    async fn classify(&self, bitmap: &Bitmap) -> Result<ClassificationResult, ClassificationError> {
        let png = bitmap
            .to_png()
            .map_err(|e| ClassificationError::Rejected(format!("could not encode image: {e}")))?;

        let body = GeminiRequest {
            contents: vec![Content {
                parts: vec![
                    Part::Text {
                        text: self.classification_prompt(),
                    },
                    Part::InlineData {
                        inline_data: InlineData {
                            mime_type: MimeType::Png.as_str().to_string(),
                            data: general_purpose::STANDARD.encode(&png),
                        },
                    },
                ],
            }],
            generation_config: Some(GenerationConfig {
                temperature: Some(0.0),
                response_mime_type: Some("application/json".to_string()),
                response_schema: Some(get_classification_schema(&self.food_classes.classes)),
                ..Default::default()
            }),
        };

        let reply = self.call_gemini_api(&self.vision_model_name, body).await?;
        let response: ClassificationResponse = serde_json::from_str(&reply.text)
            .map_err(|e| ClassificationError::MalformedResponse(e.to_string()))?;

        to_classification(response, &self.food_classes, self.top_k)
    }
}
