//! Tests for the content fingerprint of a step's inputs.

use freshen::MissingInputError;
use freshen::fingerprint::calculate;
use freshen_test_support::project;

const NO_STRINGS: &[&str] = &[];

#[test]
fn deterministic() {
    let p = project()
        .file("src/Foo.java", "class Foo{}")
        .file("src/Bar.java", "class Bar{}")
        .build();
    let inputs = [p.path("src/Foo.java"), p.path("src/Bar.java")];
    let first = calculate(&inputs, &["-g", "-O2"]).unwrap();
    for _ in 0..3 {
        assert_eq!(calculate(&inputs, &["-g", "-O2"]).unwrap(), first);
    }
}

#[test]
fn sensitive_to_a_single_byte() {
    let p = project().file("src/Foo.java", "class Foo{}").build();
    let inputs = [p.path("src/Foo.java")];
    let before = calculate(&inputs, NO_STRINGS).unwrap();

    p.change_file("src/Foo.java", "class Fop{}");
    let after = calculate(&inputs, NO_STRINGS).unwrap();
    assert_ne!(before.hash(), after.hash());
    assert_ne!(before.files()[0].hash, after.files()[0].hash);
    assert_eq!(before.strings_hash(), after.strings_hash());
}

#[test]
fn sensitive_to_strings() {
    let p = project().file("a", "a").build();
    let inputs = [p.path("a")];
    let base = calculate(&inputs, &["-O2", "-g"]).unwrap();

    let char_changed = calculate(&inputs, &["-O3", "-g"]).unwrap();
    assert_ne!(base.hash(), char_changed.hash());

    let reordered = calculate(&inputs, &["-g", "-O2"]).unwrap();
    assert_ne!(base.hash(), reordered.hash());

    let resplit = calculate(&inputs, &["-O2-", "g"]).unwrap();
    assert_ne!(base.hash(), resplit.hash());
    assert_eq!(base.files(), resplit.files());
}

#[test]
fn timestamps_do_not_matter() {
    let p = project().file("a", "a").build();
    let inputs = [p.path("a")];
    let before = calculate(&inputs, NO_STRINGS).unwrap();
    p.age("a");
    assert_eq!(calculate(&inputs, NO_STRINGS).unwrap(), before);
}

#[test]
fn directories_are_hashed_recursively() {
    let p = project()
        .file("res/values/strings.xml", "<resources/>")
        .file("res/layout/main.xml", "<LinearLayout/>")
        .build();
    let inputs = [p.path("res")];
    let before = calculate(&inputs, NO_STRINGS).unwrap();
    assert_eq!(calculate(&inputs, NO_STRINGS).unwrap(), before);

    p.change_file("res/layout/main.xml", "<FrameLayout/>");
    let edited = calculate(&inputs, NO_STRINGS).unwrap();
    assert_ne!(before.hash(), edited.hash());

    p.change_file("res/layout/extra.xml", "<FrameLayout/>");
    let added = calculate(&inputs, NO_STRINGS).unwrap();
    assert_ne!(edited.hash(), added.hash());
}

#[test]
fn missing_input() {
    let p = project().file("a", "a").build();
    let err = calculate(&[p.path("a"), p.path("gone")], NO_STRINGS).unwrap_err();
    assert_eq!(
        err.to_string(),
        format!("input file `{}` does not exist", p.path("gone").display())
    );
    assert_eq!(
        err.downcast_ref::<MissingInputError>().unwrap().path,
        p.path("gone")
    );
}
