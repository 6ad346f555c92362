use anyhow::Result;
use recipelens_core::domain::recipe::Recipe;

use crate::args::OutputFormat;

pub fn render(recipe: &Recipe, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(recipe)?),
        OutputFormat::Markdown => Ok(recipe.to_markdown()),
    }
}
