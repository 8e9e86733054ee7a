//! Update orchestration: index → graph → closure → copy → entry points

use crate::closure::compute_closure;
use crate::copier::{CopyPlan, ModuleCopier};
use crate::entrypoints::{EntrypointAdjuster, EntrypointReport};
use crate::graph::DependencyGraph;
use crate::index::ModuleIndex;
use crate::parser::ImportParser;
use crate::primitives::PrimitiveRequest;
use crate::rewriter::ImportRewriter;
use crate::store::{DestinationTree, FileStore};
use graft_foundation::module_name::{is_valid_module_name, mod_to_path};
use graft_foundation::{GraftError, GraftResult};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Everything one run needs
#[derive(Debug, Clone)]
pub struct UpdateOptions {
    /// Directory containing the library root package
    pub source_dir: PathBuf,
    pub library: String,
    /// Consumer package receiving the copy
    pub base: String,
    pub dest_dir: PathBuf,
    pub shared_namespace: String,
    pub primitives: PrimitiveRequest,
    /// Remove `<dest>/<base>/<library>` before copying
    pub clean: bool,
}

/// Result of a run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateReport {
    /// Modules copied (sorted)
    pub modules: Vec<String>,
    /// Library module → consumer module used in its place
    pub shared: BTreeMap<String, String>,
    /// Shared-namespace modules the consumer lacks
    pub missing_shared: Vec<String>,
    pub written: Vec<PathBuf>,
    pub skipped: Vec<PathBuf>,
    pub entrypoints: EntrypointReport,
    /// Previously vendored tree that was removed
    pub removed: Option<PathBuf>,
}

impl UpdateReport {
    /// Whether the run found anything to copy
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty() && self.shared.is_empty()
    }
}

pub struct Updater<'a> {
    store: &'a dyn FileStore,
}

impl<'a> Updater<'a> {
    pub fn new(store: &'a dyn FileStore) -> Self {
        Self { store }
    }

    pub fn run(&self, options: &UpdateOptions) -> GraftResult<UpdateReport> {
        if !self.store.is_dir(&options.dest_dir) {
            return Err(GraftError::destination_unavailable(format!(
                "A valid destination dir is required, '{}' is not a directory",
                options.dest_dir.display()
            )));
        }
        if !is_valid_module_name(&options.base) {
            return Err(GraftError::invalid_request(format!(
                "Invalid base module '{}'",
                options.base
            )));
        }

        let index = ModuleIndex::build(&options.source_dir, &options.library)?;
        let parser = ImportParser::new(&options.library)?;
        let graph = DependencyGraph::build(&index, &parser, self.store)?;

        let primitives = options.primitives.expand(&index)?;
        debug!(primitives = ?primitives, "Expanded primitives");
        let mut plan = CopyPlan::new(compute_closure(&graph, &index, &primitives));
        if plan.is_empty() {
            info!("Nothing to copy");
            return Ok(UpdateReport::default());
        }

        let mut report = UpdateReport::default();
        let base_dir = options.dest_dir.join(mod_to_path(&options.base));
        if options.clean {
            let old = base_dir.join(mod_to_path(&options.library));
            if self.store.remove_tree(&old)? {
                info!(path = %old.display(), "Removed old {} tree", options.library);
                report.removed = Some(old);
            }
        }

        let oracle = DestinationTree::new(self.store, &options.dest_dir, &options.base);
        plan.partition(&options.shared_namespace, &oracle);
        log_plan(&plan, &base_dir, &options.shared_namespace);

        let rewriter = ImportRewriter::new(
            &parser,
            &index,
            &options.base,
            &options.shared_namespace,
            &plan.shared,
        )?;
        let copier = ModuleCopier::new(
            self.store,
            &index,
            &rewriter,
            &options.dest_dir,
            &options.base,
        );
        let outcome = copier.copy_all(&plan)?;

        let adjuster =
            EntrypointAdjuster::new(self.store, &index, &options.dest_dir, &options.base);
        report.entrypoints = adjuster.adjust(&plan.modules)?;

        report.written = outcome.written;
        report.written.extend(outcome.placeholders);
        report.skipped = outcome.skipped;
        report.modules = plan.modules;
        report.shared = plan.shared;
        report.missing_shared = plan.missing_shared;
        Ok(report)
    }
}

fn log_plan(plan: &CopyPlan, base_dir: &Path, shared_namespace: &str) {
    info!(
        "Copying {} modules into '{}'",
        plan.modules.len(),
        base_dir.display()
    );
    for module in &plan.modules {
        info!("  - {}", module);
    }
    if !plan.shared.is_empty() {
        info!(
            "The following modules will be used from the containing project's '{}'",
            shared_namespace
        );
        for (module, target) in &plan.shared {
            info!("  '{}' -> '{}'", module, target);
        }
    }
    if !plan.missing_shared.is_empty() {
        info!(
            "The following modules will *not* be used from the containing project's '{}'",
            shared_namespace
        );
        for module in &plan.missing_shared {
            info!("  - {}", module);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::LocalFileStore;
    use graft_test_support::fixtures::{consumer_project, taskflow_library};
    use graft_test_support::SourceTree;
    use pretty_assertions::assert_eq;

    fn options(source: &SourceTree, dest: &SourceTree, primitives: &[&str]) -> UpdateOptions {
        UpdateOptions {
            source_dir: source.path().to_path_buf(),
            library: "taskflow".to_string(),
            base: "myproj".to_string(),
            dest_dir: dest.path().to_path_buf(),
            shared_namespace: "openstack.common".to_string(),
            primitives: PrimitiveRequest::parse(primitives).unwrap(),
            clean: false,
        }
    }

    #[test]
    fn test_missing_destination_is_unavailable() {
        let source = taskflow_library();
        let dest = consumer_project("myproj");
        let mut opts = options(&source, &dest, &["task"]);
        opts.dest_dir = dest.join("nope");

        let err = Updater::new(&LocalFileStore).run(&opts).unwrap_err();
        assert!(matches!(err, GraftError::DestinationUnavailable { .. }));
        assert!(err.to_string().contains("A valid destination dir is required"));
    }

    #[test]
    fn test_invalid_base_is_rejected_before_copying() {
        let source = taskflow_library();
        let dest = consumer_project("myproj");
        let mut opts = options(&source, &dest, &["task"]);
        opts.base = "my-proj".to_string();

        let err = Updater::new(&LocalFileStore).run(&opts).unwrap_err();
        assert!(matches!(err, GraftError::InvalidRequest { .. }));
        assert_eq!(dest.files(), vec!["myproj/__init__.py"]);
    }

    #[test]
    fn test_run_reports_copied_modules() {
        let source = taskflow_library();
        let dest = consumer_project("myproj");

        let report = Updater::new(&LocalFileStore)
            .run(&options(&source, &dest, &["task"]))
            .unwrap();
        assert_eq!(
            report.modules,
            vec![
                "exceptions",
                "openstack",
                "openstack.common",
                "openstack.common.uuidutils",
                "task",
                "utils",
                "utils.misc",
                "utils.reflection",
            ]
        );
        assert_eq!(report.written.len(), 9);
        assert!(report.skipped.is_empty());
        assert_eq!(report.entrypoints, EntrypointReport::default());
        assert!(!report.is_empty());
    }

    #[test]
    fn test_clean_removes_previous_tree() {
        let source = taskflow_library();
        let dest = consumer_project("myproj").with_file("myproj/taskflow/stale.py", "old\n");
        let mut opts = options(&source, &dest, &["exceptions"]);
        opts.clean = true;

        let report = Updater::new(&LocalFileStore).run(&opts).unwrap();
        assert_eq!(report.removed, Some(dest.join("myproj/taskflow")));
        assert!(!dest.exists("myproj/taskflow/stale.py"));
        assert!(dest.exists("myproj/taskflow/exceptions.py"));
    }
}
