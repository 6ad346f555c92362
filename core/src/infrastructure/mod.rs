pub mod fake;
pub mod llm;
