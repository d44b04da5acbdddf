pub mod availability;
pub mod error;
pub mod models;
pub mod service;
pub mod status_machine;
pub mod store;

pub use availability::*;
pub use error::*;
pub use models::*;
pub use service::*;
pub use status_machine::*;
pub use store::*;
