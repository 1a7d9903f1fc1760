//! Application layer services implementing business logic.
//!
//! This layer orchestrates domain operations by coordinating repository calls,
//! validation, and business rules. Services consume repository traits and provide
//! a clean API for HTTP handlers.
//!
//! # Available Services
//!
//! - [`services::link_service::LinkService`] - Link creation, owner-scoped CRUD and visit counting
//! - [`services::redirect_service::RedirectService`] - Public short code resolution
//! - [`services::auth_service::AuthService`] - API token authentication

pub mod services;
