pub mod classification;
pub mod common;
pub mod image;
pub mod pipeline;
pub mod prompt;
pub mod recipe;
