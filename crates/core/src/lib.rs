//! `drumyard-core`: domain foundation building blocks.
//!
//! Identifiers and the domain error model shared by every other crate.
//! Contains **no** infrastructure concerns.

pub mod entity;
pub mod error;
pub mod id;

pub use entity::Entity;
pub use error::DomainError;
pub use id::{DrumId, GridId};
