//! E2E tests for `tally extract`, run against a stub `gh` placed first on
//! `PATH`.

#![cfg(unix)]

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;
use tempfile::TempDir;

const STUB_GH: &str = r#"#!/bin/sh
case "$*" in
  *"--json number,title,author"*)
    cat <<'EOF'
[{"number":1,"title":"Crash, \"hard\"","author":{"login":"alice"},"state":"OPEN",
  "createdAt":"2024-01-01T00:00:00Z","closedAt":null,"url":"https://example.test/1",
  "milestone":{"title":"Backlog"}},
 {"number":2,"title":"Docs","author":{"login":"bob"},"state":"CLOSED",
  "createdAt":"2024-01-02T00:00:00Z","closedAt":"2024-01-04T00:00:00Z",
  "url":"https://example.test/2","milestone":null}]
EOF
    ;;
  *"--json number,labels"*)
    echo '[{"number":1,"labels":[{"name":"Area - UI"},{"name":"Area - Backend"},{"name":"Bug"},{"name":"Pri: 2"}]},{"number":2,"labels":[]}]'
    ;;
  *"--json number,reactionGroups"*)
    echo '[{"number":1,"reactionGroups":[{"users":{"totalCount":3}},{"users":{"totalCount":1}}]},{"number":2,"reactionGroups":[]}]'
    ;;
  api*)
    echo '[{"number":1,"comments":4}]'
    echo '[{"number":2,"comments":0}]'
    ;;
  *)
    echo "unexpected gh invocation: $*" >&2
    exit 1
    ;;
esac
"#;

const FAILING_GH: &str = "#!/bin/sh\necho 'HTTP 404: Not Found' >&2\nexit 1\n";

fn install_gh(dir: &Path, script: &str) {
    let bin = dir.join("bin");
    fs::create_dir_all(&bin).expect("mkdir bin");
    let gh = bin.join("gh");
    fs::write(&gh, script).expect("write stub");
    fs::set_permissions(&gh, fs::Permissions::from_mode(0o755)).expect("chmod");
}

fn tally_cmd(dir: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("tally"));
    let path = std::env::var("PATH").unwrap_or_default();
    cmd.current_dir(dir);
    cmd.env("PATH", format!("{}:{path}", dir.join("bin").display()));
    cmd.env("TALLY_LOG", "error");
    cmd.env("XDG_CONFIG_HOME", dir.join("xdg"));
    cmd
}

#[test]
fn extract_writes_json_and_csv() {
    let dir = TempDir::new().expect("tempdir");
    install_gh(dir.path(), STUB_GH);

    tally_cmd(dir.path())
        .args(["extract", "acme/widgets", "--out-dir", "data"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Processed 2 issues from acme/widgets"));

    let json: Value = serde_json::from_str(
        &fs::read_to_string(dir.path().join("data/acme-widgets-all-issues.json")).expect("json"),
    )
    .expect("valid JSON");
    let first = &json[0];
    assert_eq!(first["author"], "alice");
    assert_eq!(first["areas"], serde_json::json!(["UI", "Backend"]));
    assert_eq!(first["priority"], 2);
    assert_eq!(first["type"], "Bug");
    assert_eq!(first["totalReactions"], 4);
    assert_eq!(first["commentCount"], 4);
    assert_eq!(first["milestone"], "Backlog");
    assert_eq!(first["hasArea"], true);
    assert_eq!(json[1]["priority"], -1);
    assert_eq!(json[1]["hasType"], false);

    let csv = fs::read_to_string(dir.path().join("data/acme-widgets-issues.csv")).expect("csv");
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines.len(), 1 + 3, "header + two UI/Backend rows + one blank-area row");
    assert!(lines[1].starts_with(r#""1","Crash, ""hard""","alice","OPEN""#));
    assert!(lines[1].contains(r#","UI","Bug","4","#));
    assert!(lines[3].contains(r#","2024-01-04T00:00:00Z","","#));
}

#[test]
fn extracted_file_feeds_bootstrap() {
    let dir = TempDir::new().expect("tempdir");
    install_gh(dir.path(), STUB_GH);

    tally_cmd(dir.path()).args(["extract", "acme/widgets"]).assert().success();
    tally_cmd(dir.path())
        .args(["bootstrap", "--input", "acme-widgets-all-issues.json"])
        .args(["--output", "report.json", "--today", "2024-01-05"])
        .assert()
        .success();

    let report: Value =
        serde_json::from_str(&fs::read_to_string(dir.path().join("report.json")).expect("read"))
            .expect("valid JSON");
    assert_eq!(report["backlogIssues"][0]["number"], 1);
    assert_eq!(report["mostCommentedIssues"][0]["number"], 1);
}

#[test]
fn gh_failure_exits_non_zero_with_stderr() {
    let dir = TempDir::new().expect("tempdir");
    install_gh(dir.path(), FAILING_GH);

    tally_cmd(dir.path())
        .args(["extract", "acme/missing"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("E4001").and(predicate::str::contains("HTTP 404")));
    assert!(!dir.path().join("acme-missing-all-issues.json").exists());
}
