//! In-process repository implementations.
//!
//! Same contracts as the PostgreSQL adapters, backed by a mutex-guarded map.
//! Used by the HTTP test suite and for embedding the service without a database.

pub mod link_repository;
pub mod token_repository;

pub use link_repository::MemoryLinkRepository;
pub use token_repository::MemoryTokenRepository;
