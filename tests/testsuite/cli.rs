//! Tests for the `freshen` command line.

#![cfg(unix)]

use freshen_test_support::{project, str};

use crate::utils::FreshenProjectExt;

const COMPILE: &str = "mkdir -p out && cp src/Foo.java out/Foo.class && echo ran >> log";

/// Arguments for `freshen run`, with `extra` options placed before the
/// wrapped command.
fn compile_args<'a>(extra: &[&'a str]) -> Vec<&'a str> {
    let mut args = vec![
        "run",
        "--input",
        "src/Foo.java",
        "--output",
        "out/Foo.class",
        "--depfile",
        "out/Foo.d",
    ];
    args.extend_from_slice(extra);
    args.extend(["--", "sh", "-c", COMPILE]);
    args
}

fn status_args<'a>(extra: &[&'a str]) -> Vec<&'a str> {
    let mut args = vec!["status", "--input", "src/Foo.java", "--output", "out/Foo.class"];
    args.extend_from_slice(extra);
    args.extend(["--", "sh", "-c", COMPILE]);
    args
}

#[test]
fn run_writes_outputs_record_and_depfile() {
    let p = project().file("src/Foo.java", "class Foo{}").build();

    p.freshen().args(compile_args(&[])).assert().success();

    assert_eq!(p.read_file("out/Foo.class"), "class Foo{}");
    assert_eq!(p.read_file("out/Foo.d"), "out/Foo.class: src/Foo.java\n");
    assert!(p.exists("out/Foo.class.fingerprint"));
    assert_eq!(p.read_file("log"), "ran\n");

    p.freshen().args(compile_args(&[])).assert().success();
    assert_eq!(p.read_file("log"), "ran\n");

    p.change_file("src/Foo.java", "class Foo{ int x; }");
    p.freshen().args(compile_args(&[])).assert().success();
    assert_eq!(p.read_file("log"), "ran\nran\n");
    assert_eq!(p.read_file("out/Foo.class"), "class Foo{ int x; }");
}

#[test]
fn status_reports_freshness() {
    let p = project().file("src/Foo.java", "class Foo{}").build();

    p.freshen()
        .args(status_args(&[]))
        .assert()
        .code(1)
        .stdout_eq(str![[r#"
stale: no previous record

"#]]);

    p.freshen().args(compile_args(&[])).assert().success();
    p.freshen()
        .args(status_args(&[]))
        .assert()
        .success()
        .stdout_eq(str![[r#"
fresh

"#]]);

    p.change_file("src/Foo.java", "class Foo{ int x; }");
    p.freshen()
        .args(status_args(&[]))
        .assert()
        .code(1)
        .stdout_eq(str![[r#"
stale: inputs changed

"#]]);
    assert_eq!(p.read_file("log"), "ran\n");

    p.freshen()
        .args(status_args(&["--explain"]))
        .assert()
        .code(1)
        .stdout_eq(str![[r#"
stale: inputs changed
input files changed:
  modified: src/Foo.java

"#]]);
}

#[test]
fn changed_command_line_is_stale() {
    let p = project().file("src/Foo.java", "class Foo{}").build();
    p.freshen().args(compile_args(&[])).assert().success();

    p.freshen()
        .args([
            "status",
            "--input",
            "src/Foo.java",
            "--output",
            "out/Foo.class",
            "--",
            "sh",
            "-c",
            "cp src/Foo.java out/Foo.class",
        ])
        .assert()
        .code(1)
        .stdout_eq(str![[r#"
stale: inputs changed

"#]]);
}

#[test]
fn failing_command_exit_code_is_forwarded() {
    let p = project().file("src/Foo.java", "class Foo{}").build();

    p.freshen()
        .args([
            "run",
            "--input",
            "src/Foo.java",
            "--output",
            "out/Foo.class",
            "--",
            "sh",
            "-c",
            "mkdir -p out && touch out/Foo.class && exit 3",
        ])
        .assert()
        .code(3)
        .stderr_eq("");

    assert!(p.exists("out/Foo.class"));
    assert!(!p.exists("out/Foo.class.fingerprint"));
}

#[test]
fn missing_input() {
    let p = project().build();

    p.freshen()
        .args([
            "run",
            "--input",
            "src/missing.txt",
            "--output",
            "out/o",
            "--",
            "sh",
            "-c",
            "echo ran >> log",
        ])
        .assert()
        .code(101)
        .stderr_eq(str![[r#"
error: input file `src/missing.txt` does not exist

"#]]);
    assert!(!p.exists("log"));
}

#[test]
fn step_without_outputs_is_rejected() {
    let p = project().file("a.txt", "a").build();

    p.freshen()
        .args(["run", "--input", "a.txt", "--", "true"])
        .assert()
        .code(101)
        .stderr_eq(str![[r#"
error: invalid step configuration: a step needs at least one output path

"#]]);
}

#[test]
fn explain_on_stderr() {
    let p = project().file("src/Foo.java", "class Foo{}").build();
    p.freshen()
        .args(compile_args(&["--explain"]))
        .assert()
        .success()
        .stderr_eq(str![[r#"
freshen: `out/Foo.class` is stale: no previous record found

"#]]);

    p.change_file("src/Foo.java", "class Foo{ }");
    p.freshen()
        .args(compile_args(&[]))
        .env("FRESHEN_EXPLAIN", "1")
        .assert()
        .success()
        .stderr_eq(str![[r#"
freshen: `out/Foo.class` is stale: input files changed:
  modified: src/Foo.java

"#]]);
}

#[test]
fn force() {
    let p = project().file("src/Foo.java", "class Foo{}").build();
    p.freshen().args(compile_args(&[])).assert().success();

    p.freshen()
        .args(compile_args(&["--force"]))
        .assert()
        .success();
    assert_eq!(p.read_file("log"), "ran\nran\n");

    p.freshen()
        .args(compile_args(&[]))
        .env("FRESHEN_FORCE", "1")
        .assert()
        .success();
    assert_eq!(p.read_file("log"), "ran\nran\nran\n");

    p.freshen()
        .args(compile_args(&[]))
        .env("FRESHEN_FORCE", "0")
        .assert()
        .success();
    assert_eq!(p.read_file("log"), "ran\nran\nran\n");
}

#[test]
fn input_lists_and_stamp() {
    let p = project()
        .file("src/a.txt", "a")
        .file("src/b.txt", "b")
        .file("src/c.txt", "c")
        .file("sources.txt", "src/b.txt\n\n  src/a.txt  \n")
        .build();

    p.freshen()
        .args([
            "run",
            "--inputs-from",
            "sources.txt",
            "--input-list",
            r#"["src/c.txt", "src/a.txt"]"#,
            "--output",
            "out/all.txt",
            "--depfile",
            "out/all.d",
            "--depfile-dep",
            "tools/cat",
            "--stamp",
            "out/all.stamp",
            "--",
            "sh",
            "-c",
            "mkdir -p out && cat src/b.txt src/a.txt src/c.txt > out/all.txt",
        ])
        .assert()
        .success();

    assert_eq!(p.read_file("out/all.txt"), "bac");
    assert_eq!(
        p.read_file("out/all.d"),
        "out/all.txt: src/b.txt src/a.txt src/c.txt tools/cat\n"
    );
    assert_eq!(p.read_file("out/all.stamp"), "");
}

#[test]
fn file_args_are_expanded() {
    let p = project()
        .file("args.json", r#"{"name": "hello"}"#)
        .build();
    let run = [
        "run",
        "--output",
        "out.txt",
        "--",
        "sh",
        "-c",
        "echo $0 > out.txt",
        "@FileArg(args.json:name)",
    ];

    p.freshen().args(run).assert().success();
    assert_eq!(p.read_file("out.txt"), "hello\n");

    p.change_file("args.json", r#"{"name": "world"}"#);
    p.freshen().args(run).assert().success();
    assert_eq!(p.read_file("out.txt"), "world\n");
}

#[test]
fn changes_file() {
    let p = project().file("src/Foo.java", "class Foo{}").build();

    p.freshen()
        .args(compile_args(&["--changes-file", "changes.json"]))
        .assert()
        .success();
    assert_eq!(
        p.read_file("changes.json"),
        r#"{
  "has_record": false,
  "forced": false,
  "added_or_modified_only": true,
  "strings_changed": true,
  "added": [
    "src/Foo.java"
  ],
  "modified": [],
  "removed": [],
  "missing_outputs": [
    "out/Foo.class"
  ],
  "changed_subpaths": {}
}"#
    );
}
