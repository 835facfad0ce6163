pub mod errors;
pub mod models;
pub mod repo;
pub mod service;

pub use errors::*;
pub use models::*;
pub use repo::*;
pub use service::*;
