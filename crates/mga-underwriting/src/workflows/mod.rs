pub mod claims;
pub mod endorsements;
mod payload;
mod repository;
pub mod rules;
pub mod transitions;
pub mod underwriting;

pub use payload::{JsonBody, MalformedInput};
pub use repository::RepositoryError;
