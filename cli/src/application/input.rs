use std::path::Path;

use anyhow::{Context, Result, anyhow, bail};
use recipelens_core::domain::{
    image::entities::{ImageInput, MimeType},
    pipeline::RecipeRequest,
};

use crate::args::Command;

pub async fn build_request(command: &Command) -> Result<RecipeRequest> {
    let request = match command {
        Command::Image {
            path,
            mime_type,
            preferences,
        } => {
            let mime_type = match mime_type {
                Some(mime_type) => mime_type.clone(),
                None => infer_mime_type(path)?.to_string(),
            };
            let bytes = tokio::fs::read(path)
                .await
                .with_context(|| format!("failed to read image {}", path.display()))?;

            tracing::debug!(path = %path.display(), size = bytes.len(), %mime_type, "image loaded");
            with_preferences(
                RecipeRequest::image(ImageInput::new(bytes, mime_type)),
                preferences,
            )
        }
        Command::Text {
            description,
            preferences,
        } => with_preferences(RecipeRequest::text(description.clone()), preferences),
        Command::Schema => bail!("the schema command does not take a recipe request"),
    };

    Ok(request)
}

fn with_preferences(request: RecipeRequest, preferences: &Option<String>) -> RecipeRequest {
    match preferences {
        Some(preferences) => request.with_preferences(preferences.clone()),
        None => request,
    }
}

pub fn infer_mime_type(path: &Path) -> Result<MimeType> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .and_then(MimeType::from_extension)
        .ok_or_else(|| {
            anyhow!(
                "cannot infer the image type of {}; pass --mime-type",
                path.display()
            )
        })
}
