//! Module path resolution
//!
//! Maps the dotted reference of an import onto the module that actually
//! provides it. Imports frequently name something inside a module
//! (`from taskflow.utils import misc` imports a module, while
//! `from taskflow.utils.misc import wraps` imports a function), so the
//! resolver drops trailing segments until a real file matches.

use crate::index::{ModuleIndex, ModuleRecord};
use crate::parser::ImportStatement;
use graft_foundation::module_name::{join_mod, split_mod};
use graft_foundation::{GraftError, GraftResult, Location};

pub struct ModuleResolver<'a> {
    index: &'a ModuleIndex,
}

impl<'a> ModuleResolver<'a> {
    pub fn new(index: &'a ModuleIndex) -> Self {
        Self { index }
    }

    /// The leaf file named by `<library>.<segments>`, if any
    pub fn module_path<S: AsRef<str>>(&self, segments: &[S]) -> Option<&'a ModuleRecord> {
        if segments.is_empty() {
            return None;
        }
        self.index.module(&join_mod(segments))
    }

    /// Resolve `prefix` + `name` to the module providing it
    ///
    /// A package matching the full reference wins. Otherwise trailing
    /// segments are dropped until a leaf module or package matches; a match
    /// shorter than `prefix` means the import cannot be traced to a file.
    pub fn resolve(&self, prefix: &str, name: &str, location: &Location) -> GraftResult<String> {
        let prefix_len = split_mod(prefix).len();
        let mut segments = split_mod(prefix);
        segments.extend(split_mod(name));
        let importing = join_mod(&segments);

        if self.index.package(&importing).is_some() {
            return Ok(importing);
        }

        let mut end = segments.len();
        while end > 0 {
            let candidate = &segments[..end];
            let candidate_name = join_mod(candidate);
            if self.module_path(candidate).is_some() || self.index.package(&candidate_name).is_some()
            {
                if end < prefix_len {
                    break;
                }
                return Ok(candidate_name);
            }
            end -= 1;
        }

        Err(GraftError::module_not_found(
            join_mod([self.index.library(), importing.as_str()]),
            location.clone(),
        ))
    }

    /// Resolve every name a statement imports, deduplicated in order
    pub fn resolve_statement(
        &self,
        statement: &ImportStatement,
        location: &Location,
    ) -> GraftResult<Vec<String>> {
        let names = statement.names();
        if names.is_empty() {
            return Err(GraftError::malformed_import(
                "no imported names",
                location.clone(),
            ));
        }

        let mut resolved: Vec<String> = Vec::with_capacity(names.len());
        for name in names {
            let module = self.resolve(&statement.prefix, name, location)?;
            if !resolved.contains(&module) {
                resolved.push(module);
            }
        }
        Ok(resolved)
    }
}
