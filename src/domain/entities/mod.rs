//! Core domain entities representing the business data model.
//!
//! Entities are plain data structures without persistence concerns.
//!
//! # Entity Types
//!
//! - [`Link`] - A shortened URL mapping with its owner and click counter
//! - [`OwnerId`] - The principal a link belongs to
//!
//! # Design Pattern
//!
//! Separate structs are used for creation and mutation:
//! - `NewLink` - For creating a link together with its owner association
//! - `LinkChange` / `LinkField` - Closed set of typed updates

pub mod link;
pub mod owner;

pub use link::{Link, LinkChange, LinkField, NewLink};
pub use owner::OwnerId;
