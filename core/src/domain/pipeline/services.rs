use std::future::Future;

use tokio::sync::watch;
use tracing::{debug, error, info, instrument};

use crate::domain::{
    classification::{entities::ClassificationResult, ports::FoodClassifier},
    common::{PipelineConfig, entities::app_errors::PipelineError},
    image::{
        entities::{Bitmap, ImageAttachment, ImageInput, MimeType},
        services::ImageDecoder,
    },
    pipeline::{
        retry::RetryPolicy,
        state::{PipelineState, Stage},
        value_objects::{RecipeInput, RecipeRequest},
    },
    prompt::{entities::GenerationRequest, services::PromptBuilder},
    recipe::{
        entities::{Recipe, RecipeOrigin},
        parser::RecipeParser,
        ports::{RawGenerationOutput, RecipeGenerator},
    },
};

/// Sequences decoding, classification, prompting, generation and parsing for
/// one request at a time. A single instance is shared by concurrent
/// executions; it holds only immutable configuration and the collaborators.
#[derive(Debug)]
pub struct RecipePipeline<C, G>
where
    C: FoodClassifier,
    G: RecipeGenerator,
{
    config: PipelineConfig,
    classifier: C,
    generator: G,
    decoder: ImageDecoder,
    prompts: PromptBuilder,
    parser: RecipeParser,
}

/// What a dish prompt is built from.
enum Subject {
    Classified(ClassificationResult),
    Described(String),
}

/// Execution step together with the value handed to it by the previous one.
enum Step {
    Received(RecipeRequest),
    Decoding {
        image: ImageInput,
        preferences: Option<String>,
    },
    Classifying {
        bitmap: Bitmap,
        attachment: Option<ImageAttachment>,
        preferences: Option<String>,
    },
    Prompting {
        subject: Subject,
        attachment: Option<ImageAttachment>,
        preferences: Option<String>,
    },
    Generating {
        request: GenerationRequest,
        origin: RecipeOrigin,
    },
    Parsing {
        output: RawGenerationOutput,
        origin: RecipeOrigin,
    },
    Completed(Recipe),
}

impl Step {
    fn state(&self) -> PipelineState {
        match self {
            Step::Received(_) => PipelineState::Received,
            Step::Decoding { .. } => PipelineState::Decoding,
            Step::Classifying { .. } => PipelineState::Classifying,
            Step::Prompting { .. } => PipelineState::Prompting,
            Step::Generating { .. } => PipelineState::Generating,
            Step::Parsing { .. } => PipelineState::Parsing,
            Step::Completed(_) => PipelineState::Completed,
        }
    }
}

impl<C, G> RecipePipeline<C, G>
where
    C: FoodClassifier,
    G: RecipeGenerator,
{
    pub fn new(config: PipelineConfig, classifier: C, generator: G) -> Self {
        Self {
            decoder: ImageDecoder::from_config(&config),
            prompts: PromptBuilder::from_config(&config),
            parser: RecipeParser::new(),
            config,
            classifier,
            generator,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub async fn run_from_image(&self, input: ImageInput) -> Result<Recipe, PipelineError> {
        self.run(RecipeRequest::image(input)).await
    }

    pub async fn run_from_text(
        &self,
        description: impl Into<String>,
    ) -> Result<Recipe, PipelineError> {
        self.run(RecipeRequest::text(description)).await
    }

    pub async fn run(&self, request: RecipeRequest) -> Result<Recipe, PipelineError> {
        let (state, _) = watch::channel(PipelineState::Received);
        self.run_observed(request, &state).await
    }

    /// Like [`run`](Self::run), but gives up as soon as `shutdown` resolves.
    /// The in-flight external call is dropped and the error names the stage
    /// that was running.
    pub async fn run_until<F>(
        &self,
        request: RecipeRequest,
        shutdown: F,
    ) -> Result<Recipe, PipelineError>
    where
        F: Future<Output = ()>,
    {
        let (state, observer) = watch::channel(PipelineState::Received);

        tokio::select! {
            result = self.run_observed(request, &state) => result,
            () = shutdown => {
                let stage = observer.borrow().stage().unwrap_or(Stage::Received);
                info!(%stage, "pipeline cancelled");
                Err(PipelineError::cancelled(stage))
            }
        }
    }

    /// Run one request, publishing every state transition to `state`.
    #[instrument(skip_all, fields(input = input_kind(&request)))]
    pub async fn run_observed(
        &self,
        request: RecipeRequest,
        state: &watch::Sender<PipelineState>,
    ) -> Result<Recipe, PipelineError> {
        let mut step = Step::Received(request);

        loop {
            let current = step.state();
            state.send_replace(current);
            debug!(state = ?current, "pipeline transition");

            step = match step {
                Step::Completed(recipe) => {
                    info!(title = %recipe.title, "recipe generated");
                    return Ok(recipe);
                }
                step => match self.advance(step).await {
                    Ok(next) => next,
                    Err(err) => {
                        state.send_replace(PipelineState::Failed(err.kind));
                        error!(
                            stage = %err.stage,
                            attempts = err.attempts,
                            error = %err.cause,
                            "pipeline failed"
                        );
                        return Err(err);
                    }
                },
            };
        }
    }

    async fn advance(&self, step: Step) -> Result<Step, PipelineError> {
        let next = match step {
            Step::Received(RecipeRequest { input, preferences }) => match input {
                RecipeInput::Image(image) => Step::Decoding { image, preferences },
                RecipeInput::Text(text) => Step::Prompting {
                    subject: Subject::Described(text),
                    attachment: None,
                    preferences,
                },
            },

            Step::Decoding { image, preferences } => {
                let bitmap = self
                    .decoder
                    .decode(&image.bytes, &image.mime_type)
                    .map_err(|e| PipelineError::new(Stage::Decoding, e, 1))?;

                let attachment = self
                    .config
                    .attach_image_to_generation
                    .then(|| image.mime_type.parse::<MimeType>().ok())
                    .flatten()
                    .map(|mime_type| ImageAttachment {
                        mime_type,
                        data: image.bytes,
                    });

                Step::Classifying {
                    bitmap,
                    attachment,
                    preferences,
                }
            }

            Step::Classifying {
                bitmap,
                attachment,
                preferences,
            } => {
                let classification = self.classify(&bitmap).await?;
                Step::Prompting {
                    subject: Subject::Classified(classification),
                    attachment,
                    preferences,
                }
            }

            Step::Prompting {
                subject,
                attachment,
                preferences,
            } => {
                let preferences = preferences.as_deref();
                let (request, origin) = match subject {
                    Subject::Classified(classification) => {
                        let request = self.prompts.build_from_classification(
                            &classification,
                            preferences,
                            attachment,
                        );
                        (request, classified_origin(&classification))
                    }
                    Subject::Described(text) => {
                        let request = self.prompts.build_from_description(&text, preferences);
                        let origin = RecipeOrigin::Described {
                            text: text.trim().to_string(),
                        };
                        (request, origin)
                    }
                };
                let request = request.map_err(|e| PipelineError::new(Stage::Prompting, e, 1))?;

                Step::Generating { request, origin }
            }

            Step::Generating { request, origin } => {
                let output = self.generate(&request).await?;
                Step::Parsing { output, origin }
            }

            Step::Parsing { output, origin } => {
                let recipe = self
                    .parser
                    .parse(&output)
                    .map_err(|e| PipelineError::new(Stage::Parsing, e, 1))?;
                Step::Completed(recipe.with_origin(origin))
            }

            Step::Completed(recipe) => Step::Completed(recipe),
        };

        Ok(next)
    }

    async fn classify(&self, bitmap: &Bitmap) -> Result<ClassificationResult, PipelineError> {
        let policy = RetryPolicy {
            timeout: self.config.classification_timeout,
            max_retries: self.config.max_classification_retries,
            base_backoff: self.config.retry_backoff,
        };

        let (result, attempts) = policy
            .run(Stage::Classifying, || self.classifier.classify(bitmap))
            .await
            .map_err(|(e, attempts)| PipelineError::new(Stage::Classifying, e, attempts))?;

        let result = result.truncate(self.config.top_k);
        let top = result.top();
        info!(
            label = %top.label,
            confidence = top.confidence,
            candidates = result.len(),
            attempts,
            "dish classified"
        );

        Ok(result)
    }

    async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<RawGenerationOutput, PipelineError> {
        let policy = RetryPolicy {
            timeout: self.config.generation_timeout,
            max_retries: self.config.max_generation_retries,
            base_backoff: self.config.retry_backoff,
        };

        let (output, attempts) = policy
            .run(Stage::Generating, || self.generator.generate(request))
            .await
            .map_err(|(e, attempts)| PipelineError::new(Stage::Generating, e, attempts))?;

        info!(
            latency_ms = output.latency.as_millis() as u64,
            truncated = output.truncated,
            chars = output.text.len(),
            attempts,
            "recipe text generated"
        );

        Ok(output)
    }
}

fn classified_origin(classification: &ClassificationResult) -> RecipeOrigin {
    let top = classification.top();
    RecipeOrigin::Classified {
        label: top.label.clone(),
        confidence: top.confidence,
        alternatives: classification
            .alternatives()
            .iter()
            .map(|l| l.label.clone())
            .collect(),
    }
}

fn input_kind(request: &RecipeRequest) -> &'static str {
    match request.input {
        RecipeInput::Image(_) => "image",
        RecipeInput::Text(_) => "text",
    }
}
