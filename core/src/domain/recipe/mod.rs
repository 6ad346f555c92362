pub mod entities;
pub mod markdown;
pub mod parser;
pub mod ports;
pub mod quantity;

pub use entities::*;
pub use parser::RecipeParser;
pub use ports::*;
