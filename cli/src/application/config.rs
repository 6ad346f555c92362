use std::{collections::BTreeSet, time::Duration};

use recipelens_core::{
    application::food_classes_or_default,
    domain::common::{LLMConfig, ModelSettings, PipelineConfig, RecipeLensConfig},
};

use crate::args::{Args, LlmArgs, PipelineArgs};

impl From<Args> for RecipeLensConfig {
    fn from(args: Args) -> Self {
        Self {
            pipeline: PipelineConfig::from(args.pipeline),
            llm: LLMConfig::from(args.llm),
        }
    }
}

impl From<PipelineArgs> for PipelineConfig {
    fn from(args: PipelineArgs) -> Self {
        Self {
            generation_timeout: Duration::from_secs(args.generation_timeout_seconds),
            classification_timeout: Duration::from_secs(args.classification_timeout_seconds),
            max_generation_retries: args.max_generation_retries,
            max_classification_retries: args.max_classification_retries,
            retry_backoff: Duration::from_millis(args.retry_backoff_ms),
            max_image_bytes: args.max_image_bytes,
            allowed_mime_types: args.allowed_mime_types.into_iter().collect::<BTreeSet<_>>(),
            classifier_input_size: Some(args.classifier_input_size).filter(|size| *size > 0),
            top_k: args.top_k.max(1),
            low_confidence_threshold: args.low_confidence_threshold,
            attach_image_to_generation: args.attach_image,
            generation: ModelSettings {
                temperature: args.temperature,
                max_tokens: args.max_tokens,
            },
        }
    }
}

impl From<LlmArgs> for LLMConfig {
    fn from(args: LlmArgs) -> Self {
        Self {
            gemini_vision_model: args
                .gemini_vision_model
                .unwrap_or_else(|| args.gemini_model.clone()),
            gemini_api_key: args.gemini_api_key,
            gemini_model: args.gemini_model,
            request_timeout: Duration::from_secs(args.request_timeout_seconds),
            food_classes: food_classes_or_default(args.food_classes.as_deref()),
        }
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;
    use recipelens_core::domain::{common::FoodClassCatalogue, image::entities::MimeType};

    use super::*;

    #[test]
    fn test_defaults_match_pipeline_defaults() {
        let args = Args::try_parse_from(["recipelens", "text", "pizza"]).unwrap();
        let config = RecipeLensConfig::from(args);
        let defaults = PipelineConfig::default();

        assert_eq!(config.pipeline.generation_timeout, defaults.generation_timeout);
        assert_eq!(
            config.pipeline.classification_timeout,
            defaults.classification_timeout
        );
        assert_eq!(
            config.pipeline.max_generation_retries,
            defaults.max_generation_retries
        );
        assert_eq!(config.pipeline.max_image_bytes, defaults.max_image_bytes);
        assert_eq!(config.pipeline.allowed_mime_types, defaults.allowed_mime_types);
        assert_eq!(config.pipeline.classifier_input_size, Some(224));
        assert_eq!(config.pipeline.generation, defaults.generation);
        assert_eq!(config.llm.gemini_vision_model, config.llm.gemini_model);
        assert_eq!(config.llm.food_classes, FoodClassCatalogue::default());
    }

    #[test]
    fn test_flags_override_defaults() {
        let args = Args::try_parse_from([
            "recipelens",
            "--max-generation-retries",
            "5",
            "--allowed-mime-types",
            "image/png",
            "--classifier-input-size",
            "0",
            "--attach-image",
            "text",
            "pizza",
            "--gemini-vision-model",
            "gemini-pro-vision",
        ])
        .unwrap();
        let config = RecipeLensConfig::from(args);

        assert_eq!(config.pipeline.max_generation_retries, 5);
        assert_eq!(
            config.pipeline.allowed_mime_types,
            BTreeSet::from([MimeType::Png])
        );
        assert_eq!(config.pipeline.classifier_input_size, None);
        assert!(config.pipeline.attach_image_to_generation);
        assert_eq!(config.llm.gemini_vision_model, "gemini-pro-vision");
    }
}
