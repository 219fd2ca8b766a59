use assert_cmd::Command;
use predicates::prelude::*;
use std::io::Write;
use tempfile::NamedTempFile;

const PRODUCT: &str = r#"{"uri": "file:/a.mj", "name": "target", "language": "js", "content": "var x = 1;", "rangeMap": [{"sbegin": 0, "send": 5, "tbegin": 0, "tend": 3}, {"sbegin": 5, "send": 10, "tbegin": 3, "tend": 9}]}"#;

fn file_with(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("temp file");
    file.write_all(contents.as_bytes()).expect("write temp file");
    file
}

#[test]
fn help_displays_usage() {
    Command::cargo_bin("monto-cli")
        .expect("binary exists")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage"))
        .stdout(predicate::str::contains("replay"));
}

#[test]
fn map_prints_mapped_span() {
    let product = file_with(PRODUCT);
    Command::cargo_bin("monto-cli")
        .expect("binary exists")
        .args(["map", "--offset", "7", "--direction", "backward"])
        .arg(product.path())
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "monto:/a.mj-target.js backward 7 -> [5, 10)",
        ));
}

#[test]
fn map_uses_configured_scheme() {
    let product = file_with(PRODUCT);
    let config = file_with("[documents]\nscheme = \"derived\"\n");
    Command::cargo_bin("monto-cli")
        .expect("binary exists")
        .arg("--config")
        .arg(config.path())
        .args(["map", "--offset", "1"])
        .arg(product.path())
        .assert()
        .success()
        .stdout(predicate::str::starts_with("derived:/a.mj-target.js forward 1"));
}

#[test]
fn map_rejects_invalid_product() {
    let product = file_with(r#"{"uri": "file:/a.mj", "name": "target", "language": "js", "content": "", "rangeMap": [{"sbegin": 4, "send": 0, "tbegin": 0, "tend": 3}]}"#);
    Command::cargo_bin("monto-cli")
        .expect("binary exists")
        .args(["map", "--offset", "0"])
        .arg(product.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid product"));
}

#[test]
fn replay_prints_transcript() {
    let script = file_with(&format!(
        "{{\"publish\": {PRODUCT}}}\n\
         {{\"select\": {{\"uri\": \"file:///a.mj\", \"selections\": [[1, 1]]}}}}\n\
         {{\"select\": {{\"uri\": \"file:///a.mj\", \"selections\": [[1, 1]]}}}}\n"
    ));
    Command::cargo_bin("monto-cli")
        .expect("binary exists")
        .arg("replay")
        .arg(script.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("> publish file:/a.mj target.js"))
        .stdout(predicate::str::contains("apply monto:/a.mj-target.js [0, 3)"));
}
