//! Full runs against the miniature taskflow library

use graft_engine::constants::GENERATED_HEADER;
use graft_engine::{LocalFileStore, PrimitiveRequest, UpdateOptions, Updater};
use graft_foundation::GraftError;
use graft_test_support::fixtures::{consumer_project, consumer_with_shared, taskflow_library};
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
fn test_task_pulls_in_utils_and_rewrites_imports() {
    let source = taskflow_library();
    source.write("taskflow/utils/helper.py", "def h():\n    pass\n");
    source.write(
        "taskflow/task.py",
        "from taskflow.utils import helper as h  # keep\n",
    );
    let dest = consumer_project("myproj");

    let report = Updater::new(&LocalFileStore)
        .run(&options(&source, &dest, &["task"]))
        .unwrap();

    assert_eq!(report.modules, vec!["task", "utils", "utils.helper"]);
    assert_eq!(
        dest.read("myproj/taskflow/task.py"),
        format!(
            "{}from myproj.taskflow.utils import helper as h  # keep\n",
            GENERATED_HEADER
        )
    );
    assert_eq!(
        dest.files(),
        vec![
            "myproj/__init__.py",
            "myproj/taskflow/__init__.py",
            "myproj/taskflow/task.py",
            "myproj/taskflow/utils/__init__.py",
            "myproj/taskflow/utils/helper.py",
        ]
    );
}

#[test]
fn test_copied_tree_mirrors_library_layout() {
    let source = taskflow_library();
    let dest = consumer_project("myproj");

    Updater::new(&LocalFileStore)
        .run(&options(&source, &dest, &["task"]))
        .unwrap();

    let misc = dest.read("myproj/taskflow/utils/misc.py");
    assert!(misc.starts_with(GENERATED_HEADER));
    assert!(misc.contains("from myproj.taskflow import exceptions as exc\n"));
    assert!(misc.contains("from myproj.taskflow.openstack.common import uuidutils\n"));
    assert!(misc.contains("possible_topdir, \"myproj\",\n"));
    assert!(!misc.contains("from taskflow"));

    assert_eq!(
        dest.read("myproj/taskflow/openstack/common/__init__.py"),
        GENERATED_HEADER
    );
    assert!(dest.exists("myproj/taskflow/openstack/common/uuidutils.py"));
    assert!(!dest.exists("myproj/taskflow/openstack/common/jsonutils.py"));
    assert!(!dest.exists("myproj/taskflow/flow.py"));
    assert!(!dest.exists("setup.cfg"));
}

#[test]
fn test_shared_modules_collapse_into_consumer_namespace() {
    let source = taskflow_library();
    let dest = consumer_with_shared("myproj", &["openstack.common.uuidutils"]);

    let report = Updater::new(&LocalFileStore)
        .run(&options(&source, &dest, &["task"]))
        .unwrap();

    assert_eq!(
        report.shared.get("openstack.common.uuidutils").map(String::as_str),
        Some("myproj.openstack.common.uuidutils")
    );
    assert_eq!(report.missing_shared, vec!["openstack.common"]);
    assert!(!report.modules.contains(&"openstack.common.uuidutils".to_string()));

    let misc = dest.read("myproj/taskflow/utils/misc.py");
    assert!(misc.contains("from myproj.openstack.common import uuidutils\n"));
    assert!(!dest.exists("myproj/taskflow/openstack/common/uuidutils.py"));
    assert_eq!(
        dest.read("myproj/openstack/common/uuidutils.py"),
        "# vendored by the consumer\n"
    );
}

#[test]
fn test_engines_and_persistence_register_entry_points() {
    let source = taskflow_library();
    let dest = consumer_project("myproj");

    let report = Updater::new(&LocalFileStore)
        .run(&options(
            &source,
            &dest,
            &["engines.action_engine", "persistence.impl_memory"],
        ))
        .unwrap();

    assert_eq!(
        report.entrypoints.groups,
        vec!["myproj.taskflow.engines", "myproj.taskflow.persistence"]
    );
    assert!(dest
        .read("myproj/taskflow/engines/helpers.py")
        .contains("ENGINES_NAMESPACE = 'myproj.taskflow.engines'\n"));
    assert!(dest
        .read("myproj/taskflow/persistence/backends/__init__.py")
        .contains("BACKEND_NAMESPACE = 'myproj.taskflow.persistence'\n"));
    assert_eq!(
        dest.read("setup.cfg"),
        "[entry_points]\n\
         myproj.taskflow.engines =\n    \
         default = myproj.taskflow.engines.action_engine.engine:SingleThreadedActionEngine\n\
         myproj.taskflow.persistence =\n    \
         memory = myproj.taskflow.persistence.backends.impl_memory:MemoryBackend\n"
    );
}

#[test]
fn test_second_run_modifies_nothing() {
    let source = taskflow_library();
    let dest = consumer_with_shared("myproj", &["openstack.common.uuidutils"])
        .with_file("setup.cfg", "[metadata]\nname = myproj\n");
    let opts = options(
        &source,
        &dest,
        &[
            "task",
            "flow.linear_flow",
            "flow.graph_flow",
            "engines.action_engine",
            "persistence.impl_memory",
            "decorators",
        ],
    );
    let updater = Updater::new(&LocalFileStore);

    let first = updater.run(&opts).unwrap();
    assert!(!first.written.is_empty());
    let before = dest.digests();

    let second = updater.run(&opts).unwrap();
    assert!(second.written.is_empty());
    assert!(second.entrypoints.adjusted.is_empty());
    assert_eq!(second.entrypoints.manifest, None);
    assert_eq!(second.modules, first.modules);
    assert_eq!(dest.digests(), before);
}

#[test]
fn test_unknown_category_fails_before_touching_anything() {
    let err = PrimitiveRequest::parse(["bogus.thing"]).unwrap_err();
    assert!(matches!(err, GraftError::InvalidRequest { .. }));
}

#[test]
fn test_dangling_import_aborts_without_partial_file() {
    let source = taskflow_library();
    source.write(
        "taskflow/decorators.py",
        "from taskflow import task\nfrom taskflow.missing import thing\n",
    );
    let dest = consumer_project("myproj");

    let err = Updater::new(&LocalFileStore)
        .run(&options(&source, &dest, &["decorators"]))
        .unwrap_err();

    match err {
        GraftError::ModuleNotFound { module, location } => {
            assert_eq!(module, "taskflow.missing.thing");
            assert_eq!(location.line_number(), Some(2));
        }
        other => panic!("unexpected {:?}", other),
    }
    assert!(!dest.exists("myproj/taskflow/decorators.py"));
}

#[test]
fn test_library_initializer_imports_are_copied() {
    let source = taskflow_library();
    source.write("taskflow/__init__.py", "from taskflow import task  # noqa\n");
    let dest = consumer_project("myproj");

    let report = Updater::new(&LocalFileStore)
        .run(&options(&source, &dest, &["exceptions"]))
        .unwrap();

    assert!(report.modules.contains(&"task".to_string()));
    assert_eq!(
        dest.read("myproj/taskflow/__init__.py"),
        format!("{}from myproj.taskflow import task  # noqa\n", GENERATED_HEADER)
    );
    assert!(dest.exists("myproj/taskflow/task.py"));
    assert!(dest.exists("myproj/taskflow/utils/misc.py"));
}
