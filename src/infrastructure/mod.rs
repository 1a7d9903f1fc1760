//! Infrastructure layer for external integrations.
//!
//! This layer implements interfaces defined by the domain layer.
//!
//! # Modules
//!
//! - [`memory`] - In-process repositories for tests and embedding
//! - [`persistence`] - PostgreSQL repository implementations

pub mod memory;
pub mod persistence;
