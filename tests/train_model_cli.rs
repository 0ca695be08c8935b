use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;

fn train_model(root: &std::path::Path) -> Command {
    let mut cmd = Command::cargo_bin("train_model").unwrap();
    cmd.env("RECIPE_EMBEDDER_ROOT", root).env_remove("RUST_LOG");
    cmd
}

#[test]
fn empty_root_reports_missing_corpus() {
    let root = tempfile::tempdir().unwrap();
    train_model(root.path())
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Recipe CSV not found"))
        .stderr(predicate::str::contains("recipes_data.csv"))
        .stderr(predicate::str::contains("recipes.csv"));
}

#[test]
fn tiny_corpus_stops_before_model_download() {
    let root = tempfile::tempdir().unwrap();
    fs::write(
        root.path().join("recipes.csv"),
        "title,ingredients,cuisine\nA,eggs,French\nB,eggs,French\nC,rice,Thai\n",
    )
    .unwrap();

    train_model(root.path())
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Not enough training examples"));

    assert!(!root.path().join("models/base").exists());
    assert!(!root.path().join("models/recipe-embedder").exists());
}
