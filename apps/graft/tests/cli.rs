//! Integration tests for the `graft` binary

use assert_cmd::Command;
use graft_test_support::fixtures::{consumer_project, taskflow_library};
use graft_test_support::SourceTree;
use predicates::prelude::*;

fn graft_cmd() -> Command {
    let mut cmd = Command::cargo_bin("graft").unwrap();
    cmd.env_remove("RUST_LOG").env_remove("LOG_FORMAT").write_stdin("");
    cmd
}

fn ini_config(source: &SourceTree, primitives: &str) -> String {
    format!(
        "[DEFAULT]\nprimitives = {}\nbase = myproj\nsource_dir = {}\n",
        primitives,
        source.path().display()
    )
}

#[test]
fn test_help_lists_options() {
    graft_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--primitives"))
        .stdout(predicate::str::contains("--shared-namespace"))
        .stdout(predicate::str::contains("CONFIGFILE_OR_DESTDIR"));
}

#[test]
fn test_unknown_primitive_is_rejected() {
    let dest = consumer_project("myproj");

    graft_cmd()
        .args(["--primitives", "bogus.thing,task", "--base", "myproj", "--dest-dir"])
        .arg(dest.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("[E2001]"))
        .stderr(predicate::str::contains("Unknown primitives (bogus) are being copied"));

    assert_eq!(dest.files(), vec!["myproj/__init__.py"]);
}

#[test]
fn test_missing_destination_fails() {
    let source = taskflow_library();

    graft_cmd()
        .args(["--primitives", "task", "--base", "myproj", "--source-dir"])
        .arg(source.path())
        .arg("--dest-dir")
        .arg(source.join("does-not-exist"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("A valid destination dir is required"));
}

#[test]
fn test_missing_base_fails() {
    let source = taskflow_library();
    let dest = consumer_project("myproj");

    graft_cmd()
        .args(["--primitives", "task", "--source-dir"])
        .arg(source.path())
        .arg("--dest-dir")
        .arg(dest.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("A destination base module is required"));
}

#[test]
fn test_project_dir_with_library_conf() {
    let source = taskflow_library();
    let dest = consumer_project("myproj");
    dest.write("taskflow.conf", &ini_config(&source, "task"));

    graft_cmd()
        .arg(dest.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Copied 8 taskflow modules"))
        .stdout(predicate::str::contains("9 files written"));

    assert!(dest.exists("myproj/taskflow/task.py"));
    assert!(dest
        .read("myproj/taskflow/utils/misc.py")
        .contains("from myproj.taskflow import exceptions as exc"));

    // A second run leaves everything alone
    let before = dest.digests();
    graft_cmd()
        .arg(dest.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("0 files written"));
    assert_eq!(dest.digests(), before);
}

#[test]
fn test_toml_config_file_and_overrides() {
    let source = taskflow_library();
    let dest = consumer_project("myproj");
    let config = SourceTree::new().with_file(
        "graft.toml",
        &format!(
            "primitives = [\"flow.linear_flow\"]\nbase = \"myproj\"\nsource_dir = \"{}\"\n",
            source.path().display()
        ),
    );

    graft_cmd()
        .arg("--config-file")
        .arg(config.join("graft.toml"))
        .arg("--dest-dir")
        .arg(dest.path())
        .args(["--primitives", "engines.action_engine"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "entry point group 'myproj.taskflow.engines'",
        ));

    assert!(dest.exists("myproj/taskflow/engines/action_engine/engine.py"));
    assert!(!dest.exists("myproj/taskflow/patterns/linear_flow.py"));
    assert!(dest.exists("setup.cfg"));
}

#[test]
fn test_dangling_import_reports_location() {
    let source = taskflow_library();
    source.write("taskflow/exceptions.py", "\nfrom taskflow.nowhere import x\n");
    let dest = consumer_project("myproj");

    graft_cmd()
        .args(["--primitives", "task", "--base", "myproj", "--source-dir"])
        .arg(source.path())
        .arg("--dest-dir")
        .arg(dest.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("[E2002]"))
        .stderr(predicate::str::contains("taskflow.nowhere.x"))
        .stderr(predicate::str::contains("line 2"));
}
