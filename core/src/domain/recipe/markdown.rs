use std::fmt::Write as _;

use crate::domain::recipe::entities::Recipe;

impl Recipe {
    /// Render the recipe as a Markdown document: title heading, description,
    /// a meta line, then ingredient, instruction and tip sections.
    pub fn to_markdown(&self) -> String {
        let mut out = format!("# {}\n\n", self.title);

        if let Some(description) = &self.description {
            let _ = write!(out, "{description}\n\n");
        }

        let meta: Vec<String> = [
            ("Prep Time", &self.prep_time),
            ("Cook Time", &self.cook_time),
            ("Servings", &self.servings),
            ("Difficulty", &self.difficulty),
        ]
        .into_iter()
        .filter_map(|(name, value)| value.as_ref().map(|v| format!("**{name}:** {v}")))
        .collect();
        if !meta.is_empty() {
            let _ = write!(out, "{}\n\n", meta.join(" | "));
        }

        out.push_str("## Ingredients\n\n");
        for ingredient in &self.ingredients {
            let _ = writeln!(out, "- {}", ingredient.text);
        }

        out.push_str("\n## Instructions\n\n");
        for (i, step) in self.instructions.iter().enumerate() {
            let _ = writeln!(out, "{}. {step}", i + 1);
        }

        if !self.tips.is_empty() {
            out.push_str("\n## Tips\n\n");
            for tip in &self.tips {
                let _ = writeln!(out, "- {tip}");
            }
        }

        out
    }
}
