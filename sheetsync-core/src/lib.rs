// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # `SheetSync` Core
//!
//! Core types and row transformation for the `SheetSync` client.
//!
//! This crate has no I/O. It provides:
//!
//! - Domain models ([`ToolEntity`], [`PatternEntity`], [`Entity`])
//! - Column layouts for each sheet ([`schema`])
//! - Row transformation, including hyperlink formula parsing ([`transform`])
//!
//! ## Key Types
//!
//! - [`EntityKind`] - Which sheet an operation targets
//! - [`RowTransformer`] - Raw rows to entities
//! - [`PatternLink`] - A titled link parsed from a link cell

pub mod error;
pub mod models;
pub mod schema;
pub mod transform;

pub use error::CoreError;

pub use models::{Entity, EntityKind, PatternEntity, PatternLink, ToolEntity};

pub use transform::{
    format_row, normalize_cell, parse_hyperlink_formula, parse_link_cell, RowTransformer, Rows,
};
