//! Dependency resolution and import rewriting engine
//!
//! Copies a subset of a library's modules into a consuming project under
//! `<base>.<library>`, pulling in everything the requested primitives depend
//! on and rewriting imports so the copy resolves in its new home.
//!
//! The pipeline runs strictly downstream:
//!
//! 1. [`index::ModuleIndex`] maps every source file to a dotted module name
//! 2. [`parser::ImportParser`] and [`resolver::ModuleResolver`] turn import
//!    lines into module references
//! 3. [`graph::DependencyGraph`] records who imports whom
//! 4. [`primitives::PrimitiveRequest`] and [`closure::compute_closure`] pick
//!    the modules to copy
//! 5. [`rewriter::ImportRewriter`] and [`copier::ModuleCopier`] write the
//!    relocated files
//! 6. [`entrypoints::EntrypointAdjuster`] registers relocated plugins
//!
//! [`update::Updater`] drives a whole run.

pub mod closure;
pub mod constants;
pub mod copier;
pub mod entrypoints;
pub mod graph;
pub mod index;
pub mod parser;
pub mod primitives;
pub mod resolver;
pub mod rewriter;
pub mod store;
pub mod update;

pub use closure::compute_closure;
pub use copier::{CopyOutcome, CopyPlan, ModuleCopier};
pub use entrypoints::{EntrypointAdjuster, EntrypointReport};
pub use graph::DependencyGraph;
pub use index::{ModuleIndex, ModuleRecord, RootModuleMap};
pub use parser::{ImportParser, ImportStatement, ParsedLine, TrailingComment};
pub use primitives::{PrimitiveCategory, PrimitiveRequest};
pub use resolver::ModuleResolver;
pub use rewriter::ImportRewriter;
pub use store::{DestinationTree, FileStore, LocalFileStore, SharedModuleOracle};
pub use update::{UpdateOptions, UpdateReport, Updater};
