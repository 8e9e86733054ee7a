//! Transitive closure of requested primitives

use crate::graph::DependencyGraph;
use crate::index::ModuleIndex;
use graft_foundation::module_name::is_dotted_prefix;
use indexmap::IndexSet;
use tracing::debug;

/// Every module needed to support `primitives`
///
/// Order: modules discovered by a pre-order depth-first walk (primitives
/// excluded), then the primitives as requested, then whatever the library
/// initializer imports, then package roots that are dotted prefixes of
/// anything selected. The initializer is copied with every run, so its
/// imports are walked too. Package roots are walked as well, repeating until
/// nothing new appears. No module appears twice.
pub fn compute_closure(
    graph: &DependencyGraph,
    index: &ModuleIndex,
    primitives: &[String],
) -> Vec<String> {
    let mut visited: IndexSet<String> = IndexSet::new();
    for primitive in primitives {
        walk(graph, primitive, &mut visited);
    }

    let mut selected: IndexSet<String> = visited
        .into_iter()
        .filter(|module| !primitives.contains(module))
        .collect();
    selected.extend(primitives.iter().cloned());

    if !selected.is_empty() {
        let mut reached = IndexSet::new();
        for module in graph.initializer_dependencies() {
            walk(graph, module, &mut reached);
        }
        selected.extend(reached);
    }

    loop {
        let roots: Vec<String> = index
            .root_modules()
            .keys()
            .filter(|root| {
                !selected.contains(*root)
                    && selected.iter().any(|module| is_dotted_prefix(root, module))
            })
            .cloned()
            .collect();
        if roots.is_empty() {
            break;
        }
        for root in roots {
            let mut reached = IndexSet::new();
            walk(graph, &root, &mut reached);
            selected.insert(root);
            selected.extend(reached);
        }
    }

    debug!(
        primitives = primitives.len(),
        modules = selected.len(),
        "Computed module closure"
    );
    selected.into_iter().collect()
}

/// Pre-order depth-first walk from `start`, appending unseen modules to `visited`
fn walk(graph: &DependencyGraph, start: &str, visited: &mut IndexSet<String>) {
    let mut stack = vec![start.to_string()];
    while let Some(module) = stack.pop() {
        if visited.contains(&module) {
            continue;
        }
        if let Some(dependencies) = graph.dependencies(&module) {
            stack.extend(
                dependencies
                    .iter()
                    .rev()
                    .filter(|dep| !visited.contains(*dep))
                    .cloned(),
            );
        }
        visited.insert(module);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::ImportParser;
    use crate::store::LocalFileStore;
    use graft_test_support::fixtures::taskflow_library;
    use pretty_assertions::assert_eq;

    fn closure_of(request: &[&str]) -> Vec<String> {
        let tree = taskflow_library();
        let index = ModuleIndex::build(tree.path(), "taskflow").unwrap();
        let parser = ImportParser::new("taskflow").unwrap();
        let graph = DependencyGraph::build(&index, &parser, &LocalFileStore).unwrap();
        let primitives: Vec<String> = request.iter().map(|s| s.to_string()).collect();
        compute_closure(&graph, &index, &primitives)
    }

    #[test]
    fn test_walk_is_pre_order() {
        let mut graph = DependencyGraph::new();
        graph.add_dependency("a", "b");
        graph.add_dependency("a", "c");
        graph.add_dependency("b", "d");
        graph.add_dependency("d", "a");
        graph.add_dependency("c", "d");

        let mut visited = IndexSet::new();
        walk(&graph, "a", &mut visited);
        assert_eq!(visited.into_iter().collect::<Vec<_>>(), vec!["a", "b", "d", "c"]);
    }

    #[test]
    fn test_task_closure() {
        assert_eq!(
            closure_of(&["task"]),
            vec![
                "utils.misc",
                "exceptions",
                "openstack.common.uuidutils",
                "utils.reflection",
                "task",
                "openstack",
                "openstack.common",
                "utils",
            ]
        );
    }

    #[test]
    fn test_package_roots_are_walked() {
        // `persistence.backends` is only reached as a package root, and its
        // initializer imports `exceptions`
        let closure = closure_of(&[
            "persistence",
            "persistence.logbook",
            "persistence.backends.impl_memory",
        ]);
        assert!(closure.contains(&"persistence.backends".to_string()));
        assert!(closure.contains(&"exceptions".to_string()));
    }

    #[test]
    fn test_closure_is_deterministic_and_unique() {
        let request = ["engines", "engines.base", "engines.action_engine.engine", "task"];
        let first = closure_of(&request);
        for _ in 0..3 {
            assert_eq!(closure_of(&request), first);
        }
        let unique: IndexSet<&String> = first.iter().collect();
        assert_eq!(unique.len(), first.len());
    }

    #[test]
    fn test_initializer_imports_are_selected() {
        let tree = taskflow_library();
        tree.write("taskflow/__init__.py", "from taskflow import task  # noqa\n");
        let index = ModuleIndex::build(tree.path(), "taskflow").unwrap();
        let parser = ImportParser::new("taskflow").unwrap();
        let graph = DependencyGraph::build(&index, &parser, &LocalFileStore).unwrap();

        let closure = compute_closure(&graph, &index, &["exceptions".to_string()]);
        assert_eq!(closure[0], "exceptions");
        for module in ["task", "utils.misc", "utils.reflection", "utils"] {
            assert!(closure.contains(&module.to_string()), "{} missing", module);
        }
        assert!(compute_closure(&graph, &index, &[]).is_empty());
    }

    #[test]
    fn test_separate_calls_do_not_share_state() {
        let tree = taskflow_library();
        let index = ModuleIndex::build(tree.path(), "taskflow").unwrap();
        let parser = ImportParser::new("taskflow").unwrap();
        let graph = DependencyGraph::build(&index, &parser, &LocalFileStore).unwrap();

        let exceptions = compute_closure(&graph, &index, &["exceptions".to_string()]);
        let task = compute_closure(&graph, &index, &["task".to_string()]);
        let again = compute_closure(&graph, &index, &["exceptions".to_string()]);

        assert_eq!(exceptions, vec!["exceptions"]);
        assert_eq!(again, exceptions);
        assert!(task.contains(&"exceptions".to_string()));
    }
}
