//! Tests for how records are persisted between runs.

use freshen::record::{self, RECORD_VERSION};
use freshen::{DirtyReason, Freshness, Step, Tracker};
use freshen_test_support::project;

use crate::utils::Runs;

#[test]
fn record_is_written_next_to_the_first_output() {
    let p = project().file("src/Foo.java", "class Foo{}").build();
    let mut step = Step::new();
    step.input_path(p.path("src/Foo.java"))
        .input_string("-g")
        .output_path(p.path("out/Foo.class"))
        .output_path(p.path("out/Foo$1.class"));

    Runs::default().run(&Tracker::default(), &step);

    let record = record::load(&p.path("out/Foo.class.fingerprint")).unwrap();
    assert_eq!(record.version, RECORD_VERSION);
    assert_eq!(record.strings, ["-g"]);
    assert_eq!(record.files.len(), 1);
    assert_eq!(record.files[0].path, p.path("src/Foo.java"));
    assert!(record.files[0].entries.is_none());
}

#[test]
fn explicit_record_path() {
    let p = project().file("a", "a").build();
    let mut step = Step::new();
    step.input_path(p.path("a"))
        .output_path(p.path("out/a"))
        .record_path(p.path("records/a.json"));

    Runs::default().run(&Tracker::default(), &step);

    assert!(p.exists("records/a.json"));
    assert!(!p.exists("out/a.fingerprint"));
}

#[test]
fn corrupt_record_is_a_cache_miss() {
    let p = project().file("a", "a").build();
    let mut step = Step::new();
    step.input_path(p.path("a")).output_path(p.path("out"));
    let runs = Runs::default();
    let tracker = Tracker::default();
    runs.run(&tracker, &step);

    p.change_file("out.fingerprint", "{ not json");
    assert_eq!(
        runs.run(&tracker, &step),
        Freshness::Dirty {
            reason: DirtyReason::FreshBuild,
            explanation: None,
        }
    );
    assert_eq!(runs.count(), 2);
    // The record was rewritten and is usable again.
    assert!(runs.run(&tracker, &step).is_fresh());
}

#[test]
fn record_from_another_version_is_a_cache_miss() {
    let p = project().file("a", "a").build();
    let mut step = Step::new();
    step.input_path(p.path("a")).output_path(p.path("out"));
    let runs = Runs::default();
    let tracker = Tracker::default();
    runs.run(&tracker, &step);

    let contents = p.read_file("out.fingerprint").replacen(
        &format!("\"version\":{}", RECORD_VERSION),
        &format!("\"version\":{}", RECORD_VERSION + 1),
        1,
    );
    p.change_file("out.fingerprint", &contents);
    assert!(runs.run(&tracker, &step).is_dirty());
    assert_eq!(runs.count(), 2);
}
