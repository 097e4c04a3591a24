//! End-to-end CLI tests
//!
//! The dependency-inference tool is stubbed with a shell script so the whole
//! `gen` pass can run against a real temp project.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;

fn write_project(root: &Path, manifest: &str, files: &[(&str, &str)]) {
    fs::write(root.join("strata.toml"), manifest).unwrap();
    for (path, content) in files {
        let full = root.join(path);
        if let Some(parent) = full.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(full, content).unwrap();
    }
}

#[cfg(unix)]
fn write_stub_depend(root: &Path, lines: &str) -> String {
    use std::os::unix::fs::PermissionsExt;
    let tool = root.join("depend-stub.sh");
    fs::write(&tool, format!("#!/bin/sh\nprintf '%s\\n' '{lines}'\n")).unwrap();
    let mut perms = fs::metadata(&tool).unwrap().permissions();
    perms.set_mode(0o755);
    fs::set_permissions(&tool, perms).unwrap();
    tool.to_string_lossy().into_owned()
}

#[cfg(unix)]
#[test]
fn test_gen_writes_a_complete_makefile() {
    let temp = tempfile::tempdir().unwrap();
    let root = temp.path();
    let tool = write_stub_depend(root, "code/a.fst : code/b.fst");
    let manifest = format!(
        r#"
[project]
name = "demo"

[tools]
depend = "{tool}"

[options.extension]
fst = "--strict"
"#
    );
    write_project(
        root,
        &manifest,
        &[("code/a.fst", "module A\n"), ("code/b.fst", "module B\n")],
    );

    Command::cargo_bin("strata")
        .unwrap()
        .args(["-C", root.to_str().unwrap(), "gen", "--make", "Makefile"])
        .assert()
        .success()
        .stdout(predicate::str::contains("wrote"));

    let makefile = fs::read_to_string(root.join("Makefile")).unwrap();
    assert!(makefile.contains("obj/code/a.fst.verified.tmp : obj/code/b.fst.verified"));
    assert!(makefile.contains(".PHONY : all"));
}

#[cfg(unix)]
#[test]
fn test_gen_fails_without_writing_when_analysis_warns() {
    let temp = tempfile::tempdir().unwrap();
    let root = temp.path();
    let tool = write_stub_depend(root, "Warning: module Foo not found");
    let manifest = format!(
        r#"
[project]
name = "demo"

[tools]
depend = "{tool}"

[options.extension]
fst = "--strict"
"#
    );
    write_project(root, &manifest, &[("code/a.fst", "module A\n")]);

    Command::cargo_bin("strata")
        .unwrap()
        .args(["-C", root.to_str().unwrap(), "gen", "--make", "Makefile"])
        .assert()
        .failure();
    assert!(!root.join("Makefile").exists());
}

#[test]
fn test_modules_lists_discovered_modules() {
    let temp = tempfile::tempdir().unwrap();
    let root = temp.path();
    let manifest = r#"
[project]
name = "demo"

[options.extension]
fst = "--strict"
meta = "--strict"
"#;
    write_project(
        root,
        manifest,
        &[("code/a.fst", "module A\n"), ("code/w.meta", "")],
    );

    Command::cargo_bin("strata")
        .unwrap()
        .args(["-C", root.to_str().unwrap(), "modules"])
        .assert()
        .success()
        .stdout(predicate::str::contains("A code/a.fst"))
        .stdout(predicate::str::contains("W obj/code/w.fsti"));
}
