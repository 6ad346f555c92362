use std::path::PathBuf;

use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};
use recipelens_core::domain::image::entities::MimeType;

#[derive(Debug, Clone, Parser)]
#[command(
    name = "recipelens",
    version,
    about = "Turn a photo of a dish, or a description of one, into a recipe"
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Collaborators used for classification and generation.
    #[arg(long, env = "RECIPELENS_PROVIDER", value_enum, default_value_t = Provider::Gemini, global = true)]
    pub provider: Provider,

    /// How the recipe is printed on stdout.
    #[arg(long, env = "RECIPELENS_FORMAT", value_enum, default_value_t = OutputFormat::Markdown, global = true)]
    pub format: OutputFormat,

    #[command(flatten)]
    pub log: LogArgs,

    #[command(flatten)]
    pub llm: LlmArgs,

    #[command(flatten)]
    pub pipeline: PipelineArgs,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Generate a recipe from a JPEG or PNG photo.
    Image {
        path: PathBuf,

        /// Declared content type; inferred from the file extension when omitted.
        #[arg(long)]
        mime_type: Option<String>,

        /// Dietary preferences, e.g. "vegetarian, no nuts".
        #[arg(long)]
        preferences: Option<String>,
    },

    /// Generate a recipe from a dish name or description.
    Text {
        description: String,

        #[arg(long)]
        preferences: Option<String>,
    },

    /// Print the OpenAPI schema of the recipe output as JSON.
    Schema,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Provider {
    Gemini,
    /// Canned offline responses.
    Fake,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Markdown,
}

#[derive(Debug, Clone, ClapArgs)]
pub struct LogArgs {
    /// Emit logs as JSON lines.
    #[arg(long, env = "RECIPELENS_LOG_JSON", global = true)]
    pub log_json: bool,

    #[arg(long, env = "RUST_LOG", default_value = "info", global = true)]
    pub log_filter: String,
}

#[derive(Debug, Clone, ClapArgs)]
pub struct LlmArgs {
    #[arg(long, env = "GEMINI_API_KEY", default_value = "", hide_env_values = true, global = true)]
    pub gemini_api_key: String,

    #[arg(long, env = "GEMINI_MODEL", default_value = "gemini-2.0-flash", global = true)]
    pub gemini_model: String,

    /// Model used for classification and image-bearing prompts. Defaults to
    /// the generation model.
    #[arg(long, env = "GEMINI_VISION_MODEL", global = true)]
    pub gemini_vision_model: Option<String>,

    #[arg(long, env = "GEMINI_REQUEST_TIMEOUT_SECONDS", default_value_t = 60, global = true)]
    pub request_timeout_seconds: u64,

    /// JSON file with `classes` and optional `class_descriptions`.
    #[arg(long, env = "FOOD_CLASSES_PATH", global = true)]
    pub food_classes: Option<PathBuf>,
}

#[derive(Debug, Clone, ClapArgs)]
pub struct PipelineArgs {
    #[arg(long, env = "GENERATION_TIMEOUT_SECONDS", default_value_t = 60, global = true)]
    pub generation_timeout_seconds: u64,

    #[arg(long, env = "CLASSIFICATION_TIMEOUT_SECONDS", default_value_t = 30, global = true)]
    pub classification_timeout_seconds: u64,

    #[arg(long, env = "MAX_GENERATION_RETRIES", default_value_t = 2, global = true)]
    pub max_generation_retries: u32,

    #[arg(long, env = "MAX_CLASSIFICATION_RETRIES", default_value_t = 2, global = true)]
    pub max_classification_retries: u32,

    #[arg(long, env = "RETRY_BACKOFF_MS", default_value_t = 500, global = true)]
    pub retry_backoff_ms: u64,

    #[arg(long, env = "MAX_IMAGE_BYTES", default_value_t = 5 * 1024 * 1024, global = true)]
    pub max_image_bytes: usize,

    #[arg(
        long,
        env = "ALLOWED_MIME_TYPES",
        value_delimiter = ',',
        default_value = "image/jpeg,image/png",
        global = true
    )]
    pub allowed_mime_types: Vec<MimeType>,

    /// Square classifier input size in pixels; 0 keeps the original size.
    #[arg(long, env = "CLASSIFIER_INPUT_SIZE", default_value_t = 224, global = true)]
    pub classifier_input_size: u32,

    #[arg(long, env = "TOP_K", default_value_t = 3, global = true)]
    pub top_k: usize,

    #[arg(long, env = "LOW_CONFIDENCE_THRESHOLD", default_value_t = 0.8, global = true)]
    pub low_confidence_threshold: f32,

    /// Send the uploaded photo along with the recipe prompt.
    #[arg(long, env = "ATTACH_IMAGE_TO_GENERATION", global = true)]
    pub attach_image: bool,

    #[arg(long, env = "GENERATION_TEMPERATURE", default_value_t = 0.4, global = true)]
    pub temperature: f32,

    #[arg(long, env = "GENERATION_MAX_TOKENS", default_value_t = 2048, global = true)]
    pub max_tokens: u32,
}
