//! Versioning protocol for scheme documents: append-only storage behind
//! the repository trait, and the service enforcing version monotonicity,
//! provenance carry-over, and the status ladder.

pub mod repository;
pub mod service;
pub mod store;

pub use repository::{Durability, RepositoryError, SchemeRepository};
pub use service::{SchemeService, SchemeServiceError};
pub use store::{JsonFileStore, MemoryStore};
