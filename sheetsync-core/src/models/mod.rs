//! Domain models for SheetSync.
//!
//! ## Submodules
//!
//! - [`entity`] - Entity kinds and the [`Entity`] wrapper
//! - [`tool`] - Flat tool listings
//! - [`pattern`] - Sectioned pattern listings with links

mod entity;
mod pattern;
mod tool;

pub use entity::{Entity, EntityKind};
pub use pattern::{PatternEntity, PatternLink};
pub use tool::ToolEntity;
