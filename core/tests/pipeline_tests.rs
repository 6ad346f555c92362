use std::{
    io::Cursor,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use image::{ImageFormat, Rgb, RgbImage};
use recipelens_core::{
    application::create_offline_service,
    domain::{
        classification::entities::FoodLabel,
        common::{
            FoodClassCatalogue, LLMConfig, PipelineConfig, RecipeLensConfig,
            entities::app_errors::{ErrorKind, GenerationError, InvalidImageError, StageError},
        },
        image::entities::ImageInput,
        pipeline::{RecipePipeline, RecipeRequest, Stage},
        prompt::entities::GenerationRequest,
        recipe::{RawGenerationOutput, RecipeGenerator, RecipeOrigin},
    },
    infrastructure::fake::{DEFAULT_RECIPE, FakeFoodClassifier, FakeRecipeGenerator},
};

fn photo(format: ImageFormat) -> Vec<u8> {
    let img = RgbImage::from_fn(64, 48, |x, y| Rgb([(x * 4) as u8, (y * 5) as u8, 90]));
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, format).unwrap();
    buf.into_inner()
}

fn offline_config(pipeline: PipelineConfig) -> RecipeLensConfig {
    RecipeLensConfig {
        pipeline,
        llm: LLMConfig {
            gemini_api_key: String::new(),
            gemini_model: "gemini-2.0-flash".to_string(),
            gemini_vision_model: "gemini-2.0-flash".to_string(),
            request_timeout: Duration::from_secs(60),
            food_classes: FoodClassCatalogue::default(),
        },
    }
}

#[tokio::test]
async fn text_request_produces_complete_recipe() {
    let pipeline = create_offline_service(offline_config(PipelineConfig::default()));

    let recipe = pipeline
        .run(RecipeRequest::text("margherita pizza").with_preferences("vegetarian"))
        .await
        .unwrap();

    assert_eq!(recipe.title, "Margherita Pizza");
    assert_eq!(recipe.ingredients.len(), 7);
    assert_eq!(recipe.instructions.len(), 4);
    assert_eq!(recipe.servings.as_deref(), Some("2"));

    let basil = recipe.ingredients.last().unwrap();
    assert_eq!(basil.name, "a handful of basil leaves");
    assert!(basil.quantity.is_none());

    let flour = &recipe.ingredients[0];
    assert_eq!(flour.quantity.map(|q| q.value), Some(250.0));
    assert_eq!(flour.unit.as_deref(), Some("g"));
}

#[tokio::test]
async fn jpeg_photo_is_classified_then_generated() {
    let pipeline = create_offline_service(offline_config(PipelineConfig::default()));

    let recipe = pipeline
        .run_from_image(ImageInput::new(photo(ImageFormat::Jpeg), "image/jpeg"))
        .await
        .unwrap();

    assert_eq!(
        recipe.origin,
        Some(RecipeOrigin::Classified {
            label: "pizza".to_string(),
            confidence: 0.7,
            alternatives: vec!["pasta".to_string(), "sushi".to_string()],
        })
    );
    assert!(recipe.to_markdown().contains("\n## Ingredients\n"));
}

#[tokio::test]
async fn recipe_serializes_to_labelled_fields() {
    let pipeline = create_offline_service(offline_config(PipelineConfig::default()));
    let recipe = pipeline.run_from_text("pizza").await.unwrap();

    let value = serde_json::to_value(&recipe).unwrap();
    assert_eq!(value["title"], "Margherita Pizza");
    assert_eq!(value["origin"]["source"], "described");
    assert!(value["ingredients"].as_array().is_some_and(|i| i.len() == 7));
    assert!(value["instructions"][0].is_string());
}

#[tokio::test]
async fn unsupported_and_oversized_images_are_rejected() {
    let pipeline = create_offline_service(offline_config(PipelineConfig {
        max_image_bytes: 64,
        ..PipelineConfig::default()
    }));

    let err = pipeline
        .run_from_image(ImageInput::new(vec![1u8; 32], "image/gif"))
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvalidImage);
    assert_eq!(
        err.cause,
        StageError::InvalidImage(InvalidImageError::UnsupportedMimeType("image/gif".into()))
    );

    let err = pipeline
        .run_from_image(ImageInput::new(photo(ImageFormat::Png), "image/png"))
        .await
        .unwrap_err();
    assert!(matches!(
        err.cause,
        StageError::InvalidImage(InvalidImageError::TooLarge { max: 64, .. })
    ));
}

#[tokio::test]
async fn corrupt_image_fails_decoding() {
    let pipeline = create_offline_service(offline_config(PipelineConfig::default()));

    let err = pipeline
        .run_from_image(ImageInput::new(b"\x89PNG not really".to_vec(), "image/png"))
        .await
        .unwrap_err();

    assert_eq!(err.stage, Stage::Decoding);
    assert!(matches!(
        err.cause,
        StageError::InvalidImage(InvalidImageError::Decode(_))
    ));
}

#[tokio::test]
async fn concurrent_requests_share_one_pipeline() {
    let generator = FakeRecipeGenerator::default().with_response(
        "sushi",
        "Title: Salmon Nigiri\nIngredients:\n- 300g sushi rice\n- 200g salmon\nInstructions:\n1. Shape the rice\n2. Top with salmon\n",
    );
    let pipeline = Arc::new(RecipePipeline::new(
        PipelineConfig::default(),
        FakeFoodClassifier::new(vec![FoodLabel::new("sushi", 0.9)]),
        generator,
    ));

    let mut handles = Vec::new();
    for i in 0..8 {
        let pipeline = pipeline.clone();
        handles.push(tokio::spawn(async move {
            if i % 2 == 0 {
                pipeline
                    .run_from_image(ImageInput::new(photo(ImageFormat::Png), "image/png"))
                    .await
            } else {
                pipeline.run_from_text("lasagna").await
            }
        }));
    }

    for (i, handle) in handles.into_iter().enumerate() {
        let recipe = handle.await.unwrap().unwrap();
        let expected = if i % 2 == 0 { "Salmon Nigiri" } else { "Margherita Pizza" };
        assert_eq!(recipe.title, expected);
    }
}

/// Fails with `Unavailable` until `failures` calls have been made.
struct FlakyGenerator {
    calls: AtomicUsize,
    failures: usize,
}

impl RecipeGenerator for FlakyGenerator {
    async fn generate(
        &self,
        _request: &GenerationRequest,
    ) -> Result<RawGenerationOutput, GenerationError> {
        if self.calls.fetch_add(1, Ordering::SeqCst) < self.failures {
            Err(GenerationError::Unavailable("503 Service Unavailable".into()))
        } else {
            Ok(RawGenerationOutput::new(DEFAULT_RECIPE))
        }
    }
}

#[tokio::test(start_paused = true)]
async fn unavailable_generator_recovers_within_retry_limit() {
    let pipeline = RecipePipeline::new(
        PipelineConfig::default(),
        FakeFoodClassifier::default(),
        FlakyGenerator {
            calls: AtomicUsize::new(0),
            failures: 2,
        },
    );

    let recipe = pipeline.run_from_text("pizza").await.unwrap();
    assert_eq!(recipe.title, "Margherita Pizza");
}

#[tokio::test(start_paused = true)]
async fn retry_limit_is_configurable() {
    let pipeline = RecipePipeline::new(
        PipelineConfig {
            max_generation_retries: 0,
            ..PipelineConfig::default()
        },
        FakeFoodClassifier::default(),
        FlakyGenerator {
            calls: AtomicUsize::new(0),
            failures: 1,
        },
    );

    let err = pipeline.run_from_text("pizza").await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Generation);
    assert_eq!(err.attempts, 1);
    assert_eq!(
        err.user_message(),
        "The recipe service is busy. Please try again in a moment."
    );
}

struct StalledGenerator;

impl RecipeGenerator for StalledGenerator {
    async fn generate(
        &self,
        _request: &GenerationRequest,
    ) -> Result<RawGenerationOutput, GenerationError> {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Ok(RawGenerationOutput::new(DEFAULT_RECIPE))
    }
}

#[tokio::test(start_paused = true)]
async fn shutdown_interrupts_generation() {
    let pipeline = RecipePipeline::new(
        PipelineConfig::default(),
        FakeFoodClassifier::default(),
        StalledGenerator,
    );

    let request = RecipeRequest::image(ImageInput::new(photo(ImageFormat::Png), "image/png"));
    let err = tokio::time::timeout(
        Duration::from_secs(10),
        pipeline.run_until(request, tokio::time::sleep(Duration::from_secs(2))),
    )
    .await
    .expect("run_until should return once shutdown fires")
    .unwrap_err();

    assert_eq!(err.kind, ErrorKind::Cancelled);
    assert_eq!(err.stage, Stage::Generating);
    assert_eq!(err.user_message(), "The request was cancelled.");
}
