//! Foundation Layer - shared types for the graft workspace
//!
//! This crate provides the building blocks every other graft crate leans on:
//! - The error taxonomy (`GraftError`) with source locations for diagnostics
//! - Dotted module-name helpers (join, split, prefix tests, path mapping)
//! - A small INI document model used for `setup.cfg` and `.conf` files

pub mod error;
pub mod ini;
pub mod module_name;

// Re-export commonly used types for convenience
pub use error::*;
pub use ini::IniDocument;
