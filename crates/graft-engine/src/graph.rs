//! Module dependency graph
//!
//! Adjacency lists keep first-discovery order so the closure computed from
//! them is reproducible run after run.

use crate::index::{ModuleIndex, ModuleRecord};
use crate::parser::{ImportParser, ParsedLine};
use crate::resolver::ModuleResolver;
use crate::store::FileStore;
use graft_foundation::{GraftError, GraftResult, Location};
use indexmap::{IndexMap, IndexSet};
use tracing::debug;

/// Module → modules it imports
///
/// The library initializer has no module name of its own; its imports are
/// kept apart in `initializer_dependencies`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencyGraph {
    edges: IndexMap<String, IndexSet<String>>,
    initializer_dependencies: IndexSet<String>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the graph of every indexed module and the library initializer
    ///
    /// Any unresolvable or malformed import aborts the build.
    pub fn build(
        index: &ModuleIndex,
        parser: &ImportParser,
        store: &dyn FileStore,
    ) -> GraftResult<Self> {
        let resolver = ModuleResolver::new(index);
        let mut graph = Self::new();

        for record in index.records() {
            graph.add_module(&record.name);
            for dependency in file_dependencies(record, parser, &resolver, store)? {
                graph.add_dependency(&record.name, &dependency);
            }
        }

        if let Some(initializer) = index.library_initializer() {
            graph.initializer_dependencies =
                file_dependencies(initializer, parser, &resolver, store)?;
        }

        debug!(
            modules = graph.len(),
            edges = graph.edge_count(),
            initializer_imports = graph.initializer_dependencies.len(),
            "Built dependency graph"
        );
        Ok(graph)
    }

    pub fn add_module(&mut self, module: &str) {
        if !self.edges.contains_key(module) {
            self.edges.insert(module.to_string(), IndexSet::new());
        }
    }

    /// Record that `module` imports `dependency`; self references are dropped
    pub fn add_dependency(&mut self, module: &str, dependency: &str) {
        self.add_module(module);
        if module == dependency {
            return;
        }
        if let Some(deps) = self.edges.get_mut(module) {
            deps.insert(dependency.to_string());
        }
    }

    /// Modules the library initializer imports, in discovery order
    pub fn initializer_dependencies(&self) -> &IndexSet<String> {
        &self.initializer_dependencies
    }

    /// Direct dependencies of `module`, in discovery order
    pub fn dependencies(&self, module: &str) -> Option<&IndexSet<String>> {
        self.edges.get(module)
    }

    /// Every module, in insertion order
    pub fn modules(&self) -> impl Iterator<Item = &str> {
        self.edges.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.values().map(IndexSet::len).sum()
    }
}

/// Resolved imports of one source file
fn file_dependencies(
    record: &ModuleRecord,
    parser: &ImportParser,
    resolver: &ModuleResolver,
    store: &dyn FileStore,
) -> GraftResult<IndexSet<String>> {
    let content = store.read_to_string(&record.path)?;
    let mut dependencies = IndexSet::new();

    for (idx, line) in content.lines().enumerate() {
        let location = Location::line(&record.relative_path, idx + 1, line);
        let statement = match parser.parse_line(line) {
            ParsedLine::Matched(statement) => statement,
            ParsedLine::NotAnImport => continue,
            ParsedLine::Malformed(reason) => {
                return Err(GraftError::malformed_import(reason, location));
            }
        };
        dependencies.extend(resolver.resolve_statement(&statement, &location)?);
    }
    Ok(dependencies)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::LocalFileStore;
    use graft_test_support::fixtures::taskflow_library;
    use graft_test_support::SourceTree;
    use pretty_assertions::assert_eq;

    fn deps<'a>(graph: &'a DependencyGraph, module: &str) -> Vec<&'a str> {
        graph
            .dependencies(module)
            .map(|d| d.iter().map(String::as_str).collect())
            .unwrap_or_default()
    }

    fn build(tree: &SourceTree) -> GraftResult<DependencyGraph> {
        let index = ModuleIndex::build(tree.path(), "taskflow")?;
        let parser = ImportParser::new("taskflow")?;
        DependencyGraph::build(&index, &parser, &LocalFileStore)
    }

    #[test]
    fn test_add_dependency_filters_self_edges_and_duplicates() {
        let mut graph = DependencyGraph::new();
        graph.add_dependency("task", "task");
        graph.add_dependency("task", "utils.misc");
        graph.add_dependency("task", "utils.misc");
        assert_eq!(deps(&graph, "task"), vec!["utils.misc"]);
        assert_eq!(graph.edge_count(), 1);
        assert_eq!(graph.len(), 1);
    }

    #[test]
    fn test_build_from_fixture() {
        let tree = taskflow_library();
        let graph = build(&tree).unwrap();

        assert_eq!(deps(&graph, "task"), vec!["utils.misc", "utils.reflection"]);
        assert_eq!(
            deps(&graph, "utils.misc"),
            vec!["exceptions", "openstack.common.uuidutils"]
        );
        assert_eq!(deps(&graph, "engines"), vec!["engines.helpers"]);
        assert_eq!(
            deps(&graph, "persistence.backends.impl_memory"),
            vec!["persistence.backends.base"]
        );
        assert!(deps(&graph, "exceptions").is_empty());
        assert!(graph.modules().any(|m| m == "exceptions"));
    }

    #[test]
    fn test_build_never_records_self_edges() {
        let tree = taskflow_library();
        tree.write(
            "taskflow/utils/reflection.py",
            "from taskflow.utils import reflection\n",
        );
        let graph = build(&tree).unwrap();
        for module in graph.modules() {
            assert!(
                !deps(&graph, module).contains(&module),
                "{} depends on itself",
                module
            );
        }
    }

    #[test]
    fn test_unresolvable_import_carries_location() {
        let tree = taskflow_library();
        tree.write(
            "taskflow/flow.py",
            "import abc\n\nfrom taskflow.nothing import here\n",
        );
        let err = build(&tree).unwrap_err();
        match err {
            GraftError::ModuleNotFound { module, location } => {
                assert_eq!(module, "taskflow.nothing.here");
                assert_eq!(location.line_number(), Some(3));
                assert!(location
                    .file()
                    .is_some_and(|f| f.ends_with("taskflow/flow.py")));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_initializer_imports_are_recorded() {
        let tree = taskflow_library();
        assert!(build(&tree).unwrap().initializer_dependencies().is_empty());

        tree.write(
            "taskflow/__init__.py",
            "from taskflow import task  # noqa\nfrom taskflow.utils import misc\n",
        );
        let graph = build(&tree).unwrap();
        assert_eq!(
            graph
                .initializer_dependencies()
                .iter()
                .map(String::as_str)
                .collect::<Vec<_>>(),
            vec!["task", "utils.misc"]
        );
        assert!(!graph.modules().any(|m| m.is_empty()));
    }

    #[test]
    fn test_initializer_dangling_import_aborts() {
        let tree = taskflow_library();
        tree.write("taskflow/__init__.py", "from taskflow import gone\n");
        let err = build(&tree).unwrap_err();
        match err {
            GraftError::ModuleNotFound { module, location } => {
                assert_eq!(module, "taskflow.gone");
                assert!(location
                    .file()
                    .is_some_and(|f| f.ends_with("taskflow/__init__.py")));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_malformed_import_aborts() {
        let tree = taskflow_library();
        tree.write("taskflow/flow.py", "from taskflow import\n");
        let err = build(&tree).unwrap_err();
        assert!(matches!(err, GraftError::MalformedImport { .. }));
    }
}
