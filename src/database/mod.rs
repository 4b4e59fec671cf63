pub mod dynamic;
pub mod models;
pub mod repository;

pub use dynamic::{DynamicMap, DynamicValue, ValueError};
pub use repository::{Collection, FindOptions, MemoryRepository, Repository, RepositoryError};
