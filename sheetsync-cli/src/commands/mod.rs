//! CLI command implementations.

pub mod cache;
pub mod check;
pub mod config;
pub mod fetch;
pub mod submit;
