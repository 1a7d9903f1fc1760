//! Business logic services for the application layer.

pub mod auth_service;
pub mod link_service;
pub mod redirect_service;

pub use auth_service::AuthService;
pub use link_service::LinkService;
pub use redirect_service::{RedirectOutcome, RedirectService};
