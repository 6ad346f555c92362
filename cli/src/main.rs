use std::process::ExitCode;

use anyhow::{Result, bail};
use clap::Parser;
use recipelens_core::{
    application::{create_offline_service, create_service, openapi::RecipeLensApiDoc},
    domain::{
        classification::ports::FoodClassifier,
        common::{RecipeLensConfig, entities::app_errors::PipelineError},
        pipeline::{RecipePipeline, RecipeRequest},
        recipe::{Recipe, RecipeGenerator},
    },
};
use tracing::{info, warn};
use utoipa::OpenApi;

use crate::{
    application::{input::build_request, logging::init_tracing, render::render},
    args::{Args, Command, Provider},
};

mod application;
mod args;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    dotenv::dotenv().ok();

    let args = Args::parse();
    init_tracing(&args.log)?;

    if matches!(args.command, Command::Schema) {
        println!("{}", RecipeLensApiDoc::openapi().to_pretty_json()?);
        return Ok(ExitCode::SUCCESS);
    }

    let request = build_request(&args.command).await?;
    let (provider, format) = (args.provider, args.format);
    let config = RecipeLensConfig::from(args);

    info!(?provider, "starting recipe generation");
    let outcome = match provider {
        Provider::Gemini => {
            if config.llm.gemini_api_key.trim().is_empty() {
                bail!("GEMINI_API_KEY is required for the gemini provider (or use --provider fake)");
            }
            execute(create_service(config), request).await
        }
        Provider::Fake => execute(create_offline_service(config), request).await,
    };

    match outcome {
        Ok(recipe) => {
            println!("{}", render(&recipe, format)?);
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => {
            eprintln!("{}", err.user_message());
            Ok(ExitCode::FAILURE)
        }
    }
}

async fn execute<C, G>(
    pipeline: RecipePipeline<C, G>,
    request: RecipeRequest,
) -> Result<Recipe, PipelineError>
where
    C: FoodClassifier,
    G: RecipeGenerator,
{
    pipeline.run_until(request, shutdown_signal()).await
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "cannot listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
}
