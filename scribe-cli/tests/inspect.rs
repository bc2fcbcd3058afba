use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use std::fs;
use tempfile::tempdir;

#[test]
fn inspect_tokens_and_tree() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("page.md");
    fs::write(&input, "Text with `code` and [notice]\nx\n[/notice]\n").unwrap();

    cargo_bin_cmd!("scribe")
        .arg("inspect")
        .arg(&input)
        .arg("tokens")
        .assert()
        .success()
        .stdout(predicate::str::contains("{{CODE_INLINE_"));

    cargo_bin_cmd!("scribe")
        .arg("inspect")
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::contains("paragraph"));
}

#[test]
fn inspect_rejects_unknown_transform() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("page.md");
    fs::write(&input, "x\n").unwrap();

    cargo_bin_cmd!("scribe")
        .arg("inspect")
        .arg(&input)
        .arg("ast-tag")
        .assert()
        .failure();
}
