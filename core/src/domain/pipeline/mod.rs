pub mod retry;
pub mod services;
pub mod state;
pub mod value_objects;

pub use services::RecipePipeline;
pub use state::{PipelineState, Stage};
pub use value_objects::*;
