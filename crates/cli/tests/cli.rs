// ABOUTME: Integration tests for the poewiki workflow CLI.
// ABOUTME: Covers item list errors and runs where no item needs a browser.

use assert_cmd::assert::OutputAssertExt;
use assert_cmd::cargo::CommandCargoExt;
use predicates::prelude::*;
use std::fs;
use std::process::Command;
use tempfile::TempDir;

fn poewiki_cmd() -> Command {
    Command::cargo_bin("poewiki").unwrap()
}

#[test]
fn missing_item_list_fails() {
    let temp_dir = TempDir::new().unwrap();
    poewiki_cmd()
        .arg("--items")
        .arg(temp_dir.path().join("absent.json"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot load item list"));
}

#[test]
fn object_item_list_is_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let items = temp_dir.path().join("items.json");
    fs::write(&items, r#"{"value": "Scroll_of_Wisdom"}"#).unwrap();

    poewiki_cmd()
        .arg("--items")
        .arg(&items)
        .assert()
        .failure()
        .stderr(predicate::str::contains("not a list"));
}

#[test]
fn no_selected_items_reports_empty_run() {
    let temp_dir = TempDir::new().unwrap();
    let items = temp_dir.path().join("items.json");
    fs::write(
        &items,
        r#"[{"value": "Chaos_Orb", "desc": "通货"}, {"value": "Tabula_Rasa", "desc": "暗金"}]"#,
    )
    .unwrap();

    poewiki_cmd()
        .arg("--items")
        .arg(&items)
        .arg("--out-dir")
        .arg(temp_dir.path().join("out"))
        .arg("--compact")
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""total_items":0"#))
        .stdout(predicate::str::contains(r#""failed":0"#));
}
