//! Copy planning and execution

use crate::constants::GENERATED_HEADER;
use crate::index::{ModuleIndex, ModuleRecord};
use crate::rewriter::ImportRewriter;
use crate::store::{FileStore, SharedModuleOracle};
use graft_foundation::module_name::{is_dotted_prefix, join_mod, mod_to_path};
use graft_foundation::{GraftError, GraftResult, Location};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Modules to copy, plus the shared modules the consumer already provides
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CopyPlan {
    /// Sorted, deduplicated
    pub modules: Vec<String>,
    /// Library module → consumer module used in its place
    pub shared: BTreeMap<String, String>,
    /// Shared-namespace modules the consumer lacks (copied with the rest)
    pub missing_shared: Vec<String>,
}

impl CopyPlan {
    pub fn new<I: IntoIterator<Item = String>>(modules: I) -> Self {
        let mut modules: Vec<String> = modules.into_iter().collect();
        modules.sort();
        modules.dedup();
        Self {
            modules,
            ..Self::default()
        }
    }

    /// Take modules under `shared_namespace` that the consumer already has
    /// out of the copy list
    pub fn partition(&mut self, shared_namespace: &str, oracle: &dyn SharedModuleOracle) {
        let mut kept = Vec::with_capacity(self.modules.len());
        for module in std::mem::take(&mut self.modules) {
            if !is_dotted_prefix(shared_namespace, &module) {
                kept.push(module);
                continue;
            }
            match oracle.locate(&module) {
                Some(target) => {
                    self.shared.insert(module, target);
                }
                None => {
                    self.missing_shared.push(module.clone());
                    kept.push(module);
                }
            }
        }
        self.modules = kept;
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

/// Files touched by a copy
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CopyOutcome {
    pub written: Vec<PathBuf>,
    /// Destination files that already existed
    pub skipped: Vec<PathBuf>,
    /// Placeholder initializers created for new directories
    pub placeholders: Vec<PathBuf>,
}

impl CopyOutcome {
    fn merge(&mut self, other: CopyOutcome) {
        self.written.extend(other.written);
        self.skipped.extend(other.skipped);
        self.placeholders.extend(other.placeholders);
    }
}

/// Copies modules into `<dest_dir>/<base>` through an [`ImportRewriter`]
pub struct ModuleCopier<'a> {
    store: &'a dyn FileStore,
    index: &'a ModuleIndex,
    rewriter: &'a ImportRewriter<'a>,
    dest_dir: &'a Path,
    base: &'a str,
}

impl<'a> ModuleCopier<'a> {
    pub fn new(
        store: &'a dyn FileStore,
        index: &'a ModuleIndex,
        rewriter: &'a ImportRewriter<'a>,
        dest_dir: &'a Path,
        base: &'a str,
    ) -> Self {
        Self {
            store,
            index,
            rewriter,
            dest_dir,
            base,
        }
    }

    /// Destination path of a source record
    pub fn destination_of(&self, record: &ModuleRecord) -> PathBuf {
        self.dest_dir
            .join(mod_to_path(self.base))
            .join(&record.relative_path)
    }

    /// Copy the library initializer, then every planned module
    pub fn copy_all(&self, plan: &CopyPlan) -> GraftResult<CopyOutcome> {
        let mut outcome = CopyOutcome::default();
        if let Some(initializer) = self.index.library_initializer() {
            outcome.merge(self.copy_file(initializer)?);
        }
        for module in &plan.modules {
            outcome.merge(self.copy_module(module)?);
        }

        info!(
            written = outcome.written.len(),
            skipped = outcome.skipped.len(),
            "Copied modules into '{}'",
            self.dest_dir.join(mod_to_path(self.base)).display()
        );
        Ok(outcome)
    }

    /// Copy a module's package initializer and/or leaf file
    pub fn copy_module(&self, module: &str) -> GraftResult<CopyOutcome> {
        let mut outcome = CopyOutcome::default();
        let package = self.index.package(module);
        let leaf = self.index.module(module);
        if package.is_none() && leaf.is_none() {
            return Err(GraftError::module_not_found(
                join_mod([self.index.library(), module]),
                Location::Unknown,
            ));
        }

        for record in package.into_iter().chain(leaf) {
            outcome.merge(self.copy_file(record)?);
        }
        Ok(outcome)
    }

    /// Rewrite one file into the destination unless it is already there
    ///
    /// A destination holding only a placeholder initializer is replaced.
    pub fn copy_file(&self, record: &ModuleRecord) -> GraftResult<CopyOutcome> {
        let mut outcome = CopyOutcome::default();
        let dest = self.destination_of(record);

        let existing = if self.store.exists(&dest) {
            let content = self.store.read_to_string(&dest)?;
            if content != GENERATED_HEADER {
                debug!(path = %dest.display(), "Destination exists, skipping");
                outcome.skipped.push(dest);
                return Ok(outcome);
            }
            Some(content)
        } else {
            None
        };

        let source = self.store.read_to_string(&record.path)?;
        let rewritten = self.rewriter.rewrite(&source, &record.relative_path)?;

        if existing.as_deref() == Some(rewritten.as_str()) {
            outcome.skipped.push(dest);
            return Ok(outcome);
        }

        outcome.placeholders =
            self.store
                .ensure_package_dirs(&dest, self.dest_dir, GENERATED_HEADER)?;
        // The destination itself may just have been created as a placeholder
        outcome.placeholders.retain(|p| p != &dest);

        debug!(
            from = %record.relative_path.display(),
            to = %dest.display(),
            "Copying module file"
        );
        self.store.write_file(&dest, &rewritten)?;
        outcome.written.push(dest);
        Ok(outcome)
    }
}
