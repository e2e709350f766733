//! End-to-end tests driving the compiled binary.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;
use test_support::fake_engine_with_report;

const KUMOFILE: &str = "stack_version: \"1.0.0\"\nstack: dev\nconfig:\n  location: eastus\n  vm_name: x\n";

const REPORT: &str = r#"{
    "outcome": "succeeded",
    "resources": {
        "myresourcegroup": { "name": "myresourcegroup", "location": "eastus" },
        "bootdiagnosticsstorage": { "name": "metricsstorage0badc0de" },
        "x": { "name": "x" }
    }
}"#;

fn kumo() -> Command {
    Command::cargo_bin("kumo").expect("binary")
}

fn workdir_with_kumofile() -> TempDir {
    let dir = TempDir::new().expect("workdir");
    fs::write(dir.path().join("Kumofile"), KUMOFILE).expect("write Kumofile");
    dir
}

#[test]
fn help_lists_the_subcommands() {
    kumo()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("up"))
        .stdout(predicate::str::contains("preview"))
        .stdout(predicate::str::contains("graph"))
        .stdout(predicate::str::contains("plan"));
}

#[test]
fn preview_summarises_the_stack() {
    let dir = workdir_with_kumofile();
    kumo()
        .arg("-C")
        .arg(dir.path())
        .arg("preview")
        .env("KUMO_SECRET_ADMIN_PASSWORD", "hunter2")
        .assert()
        .success()
        .stdout(predicate::str::contains("stack dev: 7 resources, 4 exports"))
        .stdout(predicate::str::contains("virtual-machine"))
        .stdout(predicate::str::contains("export vmName"));
}

#[test]
fn preview_without_the_secret_fails() {
    let dir = workdir_with_kumofile();
    kumo()
        .arg("-C")
        .arg(dir.path())
        .arg("preview")
        .env_remove("KUMO_SECRET_ADMIN_PASSWORD")
        .assert()
        .failure();
}

#[test]
fn graph_emits_dot() {
    let dir = workdir_with_kumofile();
    kumo()
        .arg("-C")
        .arg(dir.path())
        .arg("graph")
        .env("KUMO_SECRET_ADMIN_PASSWORD", "hunter2")
        .assert()
        .success()
        .stdout(predicate::str::starts_with("digraph \"dev\" {"))
        .stdout(predicate::str::contains("\"vmNIC\" -> \"vmSubnet\";"));
}

#[test]
fn up_prints_resolved_exports() {
    let dir = workdir_with_kumofile();
    let (_engine_dir, engine) = fake_engine_with_report(REPORT);
    kumo()
        .arg("-C")
        .arg(dir.path())
        .arg("up")
        .env("KUMO_SECRET_ADMIN_PASSWORD", "hunter2")
        .env("KUMO_ENGINE", engine)
        .assert()
        .success()
        .stdout(predicate::str::contains("resourceGroupName = myresourcegroup"))
        .stdout(predicate::str::contains(
            "storageAccountName = metricsstorage0badc0de",
        ))
        .stdout(predicate::str::contains("vmName = x"))
        .stdout(predicate::str::contains("location = eastus"));
}

#[test]
fn plan_writes_the_requested_file() {
    let dir = workdir_with_kumofile();
    let out = dir.path().join("out.json");
    kumo()
        .arg("-f")
        .arg(dir.path().join("Kumofile"))
        .arg("plan")
        .arg(&out)
        .env("KUMO_SECRET_ADMIN_PASSWORD", "hunter2")
        .assert()
        .success();
    let plan: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&out).expect("plan file")).expect("plan json");
    assert_eq!(plan["format"], "1");
    assert_eq!(plan["resources"][0]["kind"], "resource-group");
}
