use std::sync::LazyLock;

use regex::Regex;
use tracing::instrument;

use crate::domain::{
    common::entities::app_errors::MalformedRecipeError,
    recipe::{
        entities::{Ingredient, Recipe},
        ports::RawGenerationOutput,
        quantity::parse_ingredient,
    },
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Title,
    Description,
    Ingredients,
    Instructions,
    Tips,
    PrepTime,
    CookTime,
    Servings,
    Difficulty,
    /// A heading we do not extract, e.g. "Nutrition".
    Other,
}

/// Known headers, optionally followed by a parenthetical ("Ingredients (serves 4)"),
/// a colon and an inline value.
/// "prep time" is listed before "preparation" so the longer header wins.
static HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^(?P<name>recipe title|recipe name|title|description|introduction|ingredients|prep(?:aration)? time|cook(?:ing)? time|total time|instructions|directions|method|preparation|steps|tips|notes|servings|serves|yield|difficulty(?: level)?)\s*(?:\([^)]*\))?\s*(?P<colon>[:：])?\s*(?P<rest>.*)$",
    )
    .expect("static regex")
});

static NUMBERED_STEP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:step\s*)?\d+\s*(?:[.):]|-\s)\s*(?P<rest>(?:\D.*)?)$")
        .expect("static regex")
});

/// A short "<Words>:" line with nothing after the colon, e.g. "Nutrition:".
static LABEL_HEADING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\p{L}[\p{L} &/'()\-]{0,40}[:：]$").expect("static regex")
});

static LIST_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+[.)]\s+").expect("static regex"));

const BULLETS: &[char] = &['-', '*', '•', '·', '‣', '◦', '+', '–'];

/// Turns model output into a validated [`Recipe`].
///
/// Sections are found by the headers requested in the prompt (`Title:`,
/// `Ingredients:`, `Instructions:` ...). Markdown headings, bold headers,
/// bullets and numbering are tolerated. Output without a title, an ingredient
/// or an instruction is rejected.
#[derive(Debug, Clone, Copy, Default)]
pub struct RecipeParser;

#[derive(Default)]
struct Draft {
    title: Option<String>,
    description: Vec<String>,
    ingredients: Vec<String>,
    instructions: Vec<String>,
    tips: Vec<String>,
    prep_time: Option<String>,
    cook_time: Option<String>,
    servings: Option<String>,
    difficulty: Option<String>,
}

impl RecipeParser {
    pub fn new() -> Self {
        Self
    }

    #[instrument(skip_all, fields(chars = output.text.len(), truncated = output.truncated))]
    pub fn parse(&self, output: &RawGenerationOutput) -> Result<Recipe, MalformedRecipeError> {
        if output.truncated {
            tracing::warn!("model output was truncated, recipe may be incomplete");
        }
        self.parse_text(&output.text)
    }

    pub fn parse_text(&self, text: &str) -> Result<Recipe, MalformedRecipeError> {
        if text.trim().is_empty() {
            return Err(MalformedRecipeError::EmptyOutput);
        }

        let draft = split_sections(text);

        let title = draft
            .title
            .filter(|t| !t.is_empty())
            .ok_or(MalformedRecipeError::MissingTitle)?;

        let ingredients: Vec<Ingredient> = draft
            .ingredients
            .iter()
            .map(|line| parse_ingredient(line))
            .collect();
        if ingredients.is_empty() {
            return Err(MalformedRecipeError::MissingIngredients);
        }

        let instructions = collect_steps(&draft.instructions);
        if instructions.is_empty() {
            return Err(MalformedRecipeError::MissingInstructions);
        }

        let description = Some(draft.description.join(" ")).filter(|d| !d.is_empty());

        Ok(Recipe {
            title,
            description,
            ingredients,
            instructions,
            prep_time: draft.prep_time,
            cook_time: draft.cook_time,
            servings: draft.servings,
            difficulty: draft.difficulty,
            tips: draft.tips,
            origin: None,
        })
    }
}

fn split_sections(text: &str) -> Draft {
    let mut draft = Draft::default();
    let mut current: Option<Section> = None;
    let mut seen_section = false;
    // a plain first line used as title gives way to a heading or `Title:`
    let mut title_guessed = false;

    for raw_line in text.lines() {
        let line = raw_line.trim();
        if line.is_empty() {
            continue;
        }

        let is_heading = line.starts_with('#') || is_bold_line(line);
        let cleaned = strip_markup(line);

        if let Some((section, inline)) = detect_header(&cleaned) {
            if section == Section::Title && title_guessed {
                draft.title = None;
                title_guessed = false;
            }
            seen_section = true;
            current = Some(section);
            if !inline.is_empty() {
                accept(&mut draft, &mut current, section, &inline);
            }
            continue;
        }

        if is_heading {
            if !seen_section && !cleaned.is_empty() && (draft.title.is_none() || title_guessed) {
                draft.title = Some(cleaned);
                title_guessed = false;
                current = None;
            } else {
                current = Some(Section::Other);
            }
            continue;
        }

        // inside ingredients a label is a group heading, handled by `accept`
        if current != Some(Section::Ingredients) && is_label_heading(line) {
            if current == Some(Section::Instructions) && is_group_label(line) {
                tracing::debug!(line = %line, "skipping instruction group heading");
            } else {
                current = Some(Section::Other);
            }
            continue;
        }

        if !seen_section && draft.title.is_none() && !cleaned.is_empty() {
            draft.title = Some(cleaned);
            title_guessed = true;
            continue;
        }

        if let Some(section) = current {
            accept(&mut draft, &mut current, section, line);
        }
    }

    draft
}

/// Store one line of content for `section`. Single-value sections stop
/// accepting lines once filled.
fn accept(draft: &mut Draft, current: &mut Option<Section>, section: Section, line: &str) {
    let value = strip_markup(line);
    match section {
        Section::Title => {
            if draft.title.is_none() && !value.is_empty() {
                draft.title = Some(value);
            }
            *current = None;
        }
        Section::Description => draft.description.push(value),
        Section::Ingredients => {
            let item = strip_list_marker(line);
            if item.is_empty() || is_group_heading(&item) {
                tracing::debug!(line = %line, "skipping ingredient group heading");
            } else {
                draft.ingredients.push(item);
            }
        }
        Section::Instructions => draft.instructions.push(line.to_string()),
        Section::Tips => {
            let tip = strip_list_marker(line);
            if !tip.is_empty() {
                draft.tips.push(tip);
            }
        }
        Section::PrepTime => set_once(&mut draft.prep_time, value, current),
        Section::CookTime => set_once(&mut draft.cook_time, value, current),
        Section::Servings => set_once(&mut draft.servings, value, current),
        Section::Difficulty => set_once(&mut draft.difficulty, value, current),
        Section::Other => {}
    }
}

fn set_once(slot: &mut Option<String>, value: String, current: &mut Option<Section>) {
    if slot.is_none() && !value.is_empty() {
        *slot = Some(value);
    }
    *current = None;
}

/// A header line needs a colon or nothing after the header word.
/// "Steps to follow" is content, "Steps:" is a header.
fn detect_header(cleaned: &str) -> Option<(Section, String)> {
    let caps = HEADER.captures(cleaned)?;
    let rest = caps.name("rest").map_or("", |m| m.as_str()).trim();
    let has_colon = caps.name("colon").is_some();
    if !has_colon && !rest.is_empty() {
        return None;
    }

    let name = caps.name("name")?.as_str().to_lowercase();
    let section = match name.as_str() {
        "title" | "recipe title" | "recipe name" => Section::Title,
        "description" | "introduction" => Section::Description,
        "ingredients" => Section::Ingredients,
        "instructions" | "directions" | "method" | "preparation" | "steps" => {
            Section::Instructions
        }
        "tips" | "notes" => Section::Tips,
        "servings" | "serves" | "yield" => Section::Servings,
        "total time" => Section::Other,
        n if n.starts_with("prep") => Section::PrepTime,
        n if n.starts_with("cook") => Section::CookTime,
        n if n.starts_with("difficulty") => Section::Difficulty,
        _ => return None,
    };

    Some((section, rest.to_string()))
}

/// Drop heading hashes, bold/italic markers and a trailing colon.
fn strip_markup(line: &str) -> String {
    let line = line.trim().trim_start_matches('#').trim();
    let line = line.replace("**", "").replace("__", "");
    line.trim().trim_end_matches([':', '：']).trim().to_string()
}

fn is_bold_line(line: &str) -> bool {
    let inner = line.trim_end_matches(':').trim();
    (inner.starts_with("**") && inner.ends_with("**") && inner.len() > 4)
        || (inner.starts_with("__") && inner.ends_with("__") && inner.len() > 4)
}

/// Remove a leading bullet or list number ("- ", "* ", "1. ", "2) ").
fn strip_list_marker(line: &str) -> String {
    let line = line.trim().trim_start_matches(BULLETS).trim_start();
    let line = LIST_NUMBER.replace(line, "");
    line.replace("**", "").trim().to_string()
}

fn is_label_heading(line: &str) -> bool {
    let line = line.replace("**", "").replace("__", "");
    LABEL_HEADING.is_match(line.trim())
}

/// "For the sauce:" groups steps rather than ending the instructions.
fn is_group_label(line: &str) -> bool {
    line.trim_start_matches(['*', '_'])
        .get(..4)
        .is_some_and(|p| p.eq_ignore_ascii_case("for "))
}

fn is_group_heading(item: &str) -> bool {
    item.ends_with(':') && !item.chars().any(|c| c.is_ascii_digit())
}

/// Numbered lines start new steps. When a block is numbered, unnumbered lines
/// continue the previous step; otherwise every line is a step.
fn collect_steps(lines: &[String]) -> Vec<String> {
    let numbered = lines.iter().any(|l| NUMBERED_STEP.is_match(l.trim()));
    let mut steps: Vec<String> = Vec::new();

    for line in lines {
        let line = line.trim();
        if let Some(caps) = NUMBERED_STEP.captures(line) {
            let step = clean_step(caps.name("rest").map_or("", |m| m.as_str()));
            if !step.is_empty() {
                steps.push(step);
            }
            continue;
        }

        let bulleted = line.starts_with(BULLETS);
        let step = clean_step(line.trim_start_matches(BULLETS));
        if step.is_empty() {
            continue;
        }

        match steps.last_mut() {
            Some(last) if numbered && !bulleted => {
                last.push(' ');
                last.push_str(&step);
            }
            _ => steps.push(step),
        }
    }

    steps
}

fn clean_step(step: &str) -> String {
    step.replace("**", "")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}
