//! Property-based tests for dependency graphs and closures
//!
//! # Coverage
//! - No self edges in a built graph
//! - Closures contain every primitive exactly once
//! - Closures are closed under the dependency relation
//! - Repeated runs, including over a freshly rebuilt index, agree

use graft_engine::{compute_closure, DependencyGraph, ImportParser, LocalFileStore, ModuleIndex};
use graft_test_support::SourceTree;
use proptest::prelude::*;
use std::collections::HashSet;

const MODULES: [&str; 7] = ["m0", "m1", "m2", "m3", "m4", "pkg", "pkg.leaf"];

fn file_of(module: &str) -> &'static str {
    match module {
        "pkg" => "taskflow/pkg/__init__.py",
        "pkg.leaf" => "taskflow/pkg/leaf.py",
        "m0" => "taskflow/m0.py",
        "m1" => "taskflow/m1.py",
        "m2" => "taskflow/m2.py",
        "m3" => "taskflow/m3.py",
        _ => "taskflow/m4.py",
    }
}

fn import_of(module: &str) -> String {
    match module.split_once('.') {
        Some((package, name)) => format!("from taskflow.{} import {}\n", package, name),
        None => format!("from taskflow import {}\n", module),
    }
}

/// Write a library whose import edges are `edges` (indices into `MODULES`)
fn library(edges: &[(usize, usize)]) -> SourceTree {
    let tree = SourceTree::new().with_file("taskflow/__init__.py", "");
    for (idx, module) in MODULES.iter().enumerate() {
        let body: String = edges
            .iter()
            .filter(|(from, _)| *from == idx)
            .map(|(_, to)| import_of(MODULES[*to]))
            .collect();
        tree.write(file_of(module), &format!("{}X = 1\n", body));
    }
    tree
}

fn closure(tree: &SourceTree, primitives: &[String]) -> (DependencyGraph, Vec<String>) {
    let index = ModuleIndex::build(tree.path(), "taskflow").unwrap();
    let parser = ImportParser::new("taskflow").unwrap();
    let graph = DependencyGraph::build(&index, &parser, &LocalFileStore).unwrap();
    let modules = compute_closure(&graph, &index, primitives);
    (graph, modules)
}

fn edges() -> impl Strategy<Value = Vec<(usize, usize)>> {
    proptest::collection::vec((0..MODULES.len(), 0..MODULES.len()), 0..16)
}

fn primitives() -> impl Strategy<Value = Vec<String>> {
    proptest::sample::subsequence(MODULES.to_vec(), 1..4)
        .prop_map(|picked| picked.into_iter().map(String::from).collect())
}

// ============================================================================
// Graph and closure invariants
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    /// Property: a module never depends on itself, even when it imports itself
    #[test]
    fn prop_graph_has_no_self_edges(edges in edges()) {
        let tree = library(&edges);
        let (graph, _) = closure(&tree, &["m0".to_string()]);
        for module in graph.modules() {
            let deps = graph.dependencies(module).unwrap();
            prop_assert!(!deps.contains(module), "{} depends on itself", module);
        }
    }

    /// Property: every primitive is selected exactly once, nothing twice
    #[test]
    fn prop_closure_is_unique_and_covers_primitives(edges in edges(), primitives in primitives()) {
        let tree = library(&edges);
        let (_, modules) = closure(&tree, &primitives);

        let unique: HashSet<&String> = modules.iter().collect();
        prop_assert_eq!(unique.len(), modules.len());
        for primitive in &primitives {
            prop_assert!(modules.contains(primitive));
        }
    }

    /// Property: whatever a selected module imports is selected too
    #[test]
    fn prop_closure_is_closed(edges in edges(), primitives in primitives()) {
        let tree = library(&edges);
        let (graph, modules) = closure(&tree, &primitives);

        for module in &modules {
            if let Some(deps) = graph.dependencies(module) {
                for dep in deps {
                    prop_assert!(modules.contains(dep), "{} -> {} missing", module, dep);
                }
            }
        }
        if modules.iter().any(|m| m == "pkg.leaf") {
            prop_assert!(modules.iter().any(|m| m == "pkg"));
        }
    }

    /// Property: the closure is identical across runs and rebuilt indexes
    #[test]
    fn prop_closure_is_deterministic(edges in edges(), primitives in primitives()) {
        let tree = library(&edges);
        let (_, first) = closure(&tree, &primitives);
        let (_, second) = closure(&tree, &primitives);
        prop_assert_eq!(&first, &second);

        let copy = library(&edges);
        let (_, third) = closure(&copy, &primitives);
        prop_assert_eq!(first, third);
    }
}
