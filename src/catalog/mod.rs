pub mod error;
pub mod models;
pub mod registry;

pub use error::*;
pub use models::*;
pub use registry::*;
