pub mod entities;
pub mod ports;
pub mod schema;

pub use entities::*;
pub use ports::*;
