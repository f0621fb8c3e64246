//! Tests for tracking the entries of zip containers.

use std::cell::RefCell;
use std::path::Path;

use freshen::util::ConfigError;
use freshen::{EntryFingerprint, Step, Tracker, record};
use freshen_test_support::project;

use crate::utils::Runs;

fn lib_step(p: &freshen_test_support::Project) -> Step {
    let mut step = Step::new();
    step.input_path(p.path("lib.jar"))
        .input_path(p.path("config.txt"))
        .output_path(p.path("out/classes.dex"))
        .track_subentries(p.path("lib.jar"));
    step
}

#[test]
fn changed_and_removed_entries() {
    let p = project()
        .zip("lib.jar", &[("a/A.class", "A"), ("b/B.class", "B"), ("C.class", "C")])
        .file("config.txt", "opt")
        .build();
    let step = lib_step(&p);
    let runs = Runs::default();
    let tracker = Tracker::default();
    let jar = p.path("lib.jar");

    let seen = RefCell::new(Vec::new());
    runs.run_with(&tracker, &step, |changes| {
        seen.replace(changes.changed_subpaths(&jar)?);
        assert!(changes.removed_subpaths(&jar)?.is_empty());
        Ok(())
    });
    assert_eq!(seen.take(), ["a/A.class", "b/B.class", "C.class"]);

    p.change_zip(
        "lib.jar",
        &[("a/A.class", "A2"), ("b/B.class", "B"), ("D.class", "D")],
    );
    let removed = RefCell::new(Vec::new());
    runs.run_with(&tracker, &step, |changes| {
        seen.replace(changes.changed_subpaths(&jar)?);
        removed.replace(changes.removed_subpaths(&jar)?);
        Ok(())
    });
    assert_eq!(seen.take(), ["a/A.class", "D.class"]);
    assert_eq!(removed.take(), ["C.class"]);
    assert_eq!(runs.count(), 2);
}

#[test]
fn unchanged_container_has_no_changed_entries() {
    let p = project()
        .zip("lib.jar", &[("A.class", "A")])
        .file("config.txt", "opt")
        .build();
    let step = lib_step(&p);
    let runs = Runs::default();
    let tracker = Tracker::default();
    runs.run(&tracker, &step);

    p.change_file("config.txt", "opt2");
    runs.run_with(&tracker, &step, |changes| {
        let jar = p.path("lib.jar");
        assert!(changes.changed_subpaths(&jar)?.is_empty());
        assert!(changes.removed_subpaths(&jar)?.is_empty());
        // Untracked inputs never report entries.
        assert!(changes.changed_subpaths(&p.path("config.txt"))?.is_empty());
        Ok(())
    });
    assert_eq!(runs.count(), 2);
}

#[test]
fn record_stores_entries_of_tracked_containers() {
    let p = project()
        .zip("lib.jar", &[("A.class", "a")])
        .file("config.txt", "opt")
        .build();
    let step = lib_step(&p);
    Runs::default().run(&Tracker::default(), &step);

    let record = record::load(&p.path("out/classes.dex.fingerprint")).unwrap();
    let jar = record.file(&p.path("lib.jar")).unwrap();
    let entries = jar.entries.as_ref().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].name, "A.class");
    assert_eq!(entries[0].tag, "e8b7be43");
    assert!(record.file(&p.path("config.txt")).unwrap().entries.is_none());
}

#[test]
fn custom_entry_lister() {
    let p = project().file("bundle.txt", "x").build();
    let mut step = Step::new();
    step.input_path(p.path("bundle.txt"))
        .output_path(p.path("out"))
        .track_subentries(p.path("bundle.txt"));
    let tracker = Tracker::default().with_entry_lister(
        |_: &Path| -> anyhow::Result<Vec<EntryFingerprint>> {
            Ok(vec![EntryFingerprint {
                name: "only".to_string(),
                tag: "1".to_string(),
            }])
        },
    );
    Runs::default().run_with(&tracker, &step, |changes| {
        assert_eq!(changes.changed_subpaths(&p.path("bundle.txt"))?, ["only"]);
        Ok(())
    });
}

#[test]
fn tracked_container_must_be_an_input() {
    let p = project().file("config.txt", "opt").build();
    let mut step = Step::new();
    step.input_path(p.path("config.txt"))
        .output_path(p.path("out"))
        .track_subentries(p.path("lib.jar"));
    let mut calls = 0;
    let err = Tracker::default()
        .run_if_stale(&step, |_| {
            calls += 1;
            Ok(())
        })
        .unwrap_err();
    assert!(err.downcast_ref::<ConfigError>().is_some());
    assert_eq!(
        err.to_string(),
        format!(
            "invalid step configuration: tracked container `{}` is not an input path",
            p.path("lib.jar").display()
        )
    );
    assert_eq!(calls, 0);
}
