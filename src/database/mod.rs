pub mod error;
pub mod manager;
pub mod memory;
pub mod models;
pub mod order;
pub mod postgres;
pub mod repository;
pub mod slug;
pub mod validate;

pub use error::{CancelCause, EntityKind, RepositoryError};
pub use manager::{DatabaseError, DatabaseManager};
pub use memory::MemoryStore;
pub use repository::{ChapterRepository, ListOptions, ProjectRepository, RepositoryResult, UserRepository};
