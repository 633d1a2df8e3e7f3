#![allow(deprecated)]
use assert_cmd::Command;
use predicates::prelude::*;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn multio(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("multio-plans").unwrap();
    cmd.current_dir(dir.path())
        .env_remove("MULTIO_PLANS_FILE")
        .env_remove("MULTIO_PLANS");
    cmd
}

fn write(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, content).unwrap();
    path
}

fn read(path: &Path) -> String {
    std::fs::read_to_string(path).unwrap()
}

const OUTPUT_PLAN: &str = r#"
plans:
  - name: output plan
    actions:
      - type: select
        match:
          - category: custom
      - type: encode
        format: grib
        template: grib_template.grib
        grid-type: n320
      - type: sink
        sinks:
          - type: file
            append: false
            per-server: false
            path: debug.grib
"#;

const COLLECTION: &str = r#"
server:
  transport: mpi
  group: io
  plans:
    - name: to-disk
      actions:
        - type: sink
          sinks:
            - type: fdb5
client:
  plans:
    - name: forward
      actions:
        - type: transport
          target: server
"#;

// ---------------------------------------------------------------------------
// init / add-action / add-sink
// ---------------------------------------------------------------------------

#[test]
fn init_creates_client_config_with_sink() {
    let dir = TempDir::new().unwrap();
    multio(&dir)
        .args(["init", "plans.yaml", "--plan", "my plan"])
        .assert()
        .success()
        .stdout(predicate::str::contains("plan 'my-plan'"));

    let content = read(&dir.path().join("plans.yaml"));
    assert!(content.contains("name: my-plan"));
    assert!(content.contains("type: sink"));
    assert!(!content.contains("transport"));
}

#[test]
fn init_with_transport_creates_server_config() {
    let dir = TempDir::new().unwrap();
    multio(&dir)
        .args(["init", "server.json", "--transport", "mpi"])
        .assert()
        .success()
        .stdout(predicate::str::contains("server config"));

    let value: serde_json::Value =
        serde_json::from_str(&read(&dir.path().join("server.json"))).unwrap();
    assert_eq!(value["transport"], "mpi");
    assert_eq!(value["plans"][0]["name"], "default");
}

#[test]
fn init_refuses_to_overwrite() {
    let dir = TempDir::new().unwrap();
    multio(&dir).args(["init", "plans.yaml"]).assert().success();
    multio(&dir)
        .args(["init", "plans.yaml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));
    multio(&dir)
        .args(["init", "plans.yaml", "--force", "--plan", "other"])
        .assert()
        .success();
    assert!(read(&dir.path().join("plans.yaml")).contains("name: other"));
}

#[test]
fn add_action_appends_to_plan() {
    let dir = TempDir::new().unwrap();
    multio(&dir).args(["init", "plans.yaml"]).assert().success();
    multio(&dir)
        .args([
            "add-action",
            "plans.yaml",
            "--plan",
            "default",
            "--action",
            r#"{"type": "print", "stream": "cout"}"#,
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Added 'print' action"));

    let content = read(&dir.path().join("plans.yaml"));
    assert!(content.contains("type: print"));
    assert!(content.contains("stream: cout"));
}

#[test]
fn add_invalid_action_fails_and_leaves_file_alone() {
    let dir = TempDir::new().unwrap();
    multio(&dir).args(["init", "plans.yaml"]).assert().success();
    let before = read(&dir.path().join("plans.yaml"));

    multio(&dir)
        .args([
            "add-action",
            "plans.yaml",
            "--plan",
            "default",
            "--action",
            r#"{"type": "invalid"}"#,
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown variant"));

    assert_eq!(read(&dir.path().join("plans.yaml")), before);
}

#[test]
fn add_action_to_missing_plan() {
    let dir = TempDir::new().unwrap();
    multio(&dir).args(["init", "plans.yaml"]).assert().success();
    multio(&dir)
        .args([
            "add-action",
            "plans.yaml",
            "--plan",
            "extra",
            "--action",
            r#"{"type": "aggregation"}"#,
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("plan not found: extra"));

    multio(&dir)
        .args([
            "add-action",
            "plans.yaml",
            "--plan",
            "extra",
            "--create",
            "--action",
            r#"{"type": "aggregation"}"#,
        ])
        .assert()
        .success();
    assert!(read(&dir.path().join("plans.yaml")).contains("name: extra"));
}

#[test]
fn add_sink_fills_existing_sink_action() {
    let dir = TempDir::new().unwrap();
    multio(&dir).args(["init", "plans.yaml"]).assert().success();
    multio(&dir)
        .args([
            "add-sink",
            "plans.yaml",
            "--plan",
            "default",
            "--sink",
            r#"{"type": "file", "append": true, "path": "out.grib"}"#,
        ])
        .assert()
        .success();

    let content = read(&dir.path().join("plans.yaml"));
    assert_eq!(content.matches("type: sink").count(), 1);
    assert!(content.contains("path: out.grib"));

    // Empty sink warning is gone now.
    multio(&dir)
        .args(["validate", "plans.yaml", "--strict"])
        .assert()
        .success();
}

// ---------------------------------------------------------------------------
// validate
// ---------------------------------------------------------------------------

#[test]
fn validate_sample_plan() {
    let dir = TempDir::new().unwrap();
    write(&dir, "plans.yaml", OUTPUT_PLAN);
    multio(&dir)
        .args(["validate", "plans.yaml"])
        .assert()
        .success()
        .stdout(predicate::str::contains("valid"));
}

#[test]
fn validate_reads_file_from_env() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "plans.yaml", OUTPUT_PLAN);
    multio(&dir)
        .env("MULTIO_PLANS_FILE", &path)
        .arg("validate")
        .assert()
        .success();
}

#[test]
fn validate_flags_plan_without_terminal_action() {
    let dir = TempDir::new().unwrap();
    write(
        &dir,
        "plans.yaml",
        "plans:\n  - name: p\n    actions:\n      - type: print\n",
    );
    multio(&dir)
        .args(["validate", "plans.yaml"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("[error] plans[0]"))
        .stdout(predicate::str::contains("no terminal action"));
}

#[test]
fn validate_strict_fails_on_warnings() {
    let dir = TempDir::new().unwrap();
    multio(&dir).args(["init", "plans.yaml"]).assert().success();
    multio(&dir)
        .args(["validate", "plans.yaml"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[warning]"));
    multio(&dir)
        .args(["validate", "plans.yaml", "--strict"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("strict mode"));
}

#[test]
fn validate_json_output() {
    let dir = TempDir::new().unwrap();
    multio(&dir).args(["init", "plans.yaml"]).assert().success();
    let out = multio(&dir)
        .args(["--json", "validate", "plans.yaml"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
    assert_eq!(value["issues"][0]["level"], "warning");
    assert_eq!(value["issues"][0]["location"], "plans[0].actions[0]");
}

#[test]
fn schema_errors_fail_to_load() {
    let dir = TempDir::new().unwrap();
    write(
        &dir,
        "plans.yaml",
        "plans:\n  - name: p\n    actions:\n      - type: encode\n        format: grib\n      - type: sink\n",
    );
    multio(&dir)
        .args(["validate", "plans.yaml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("template is required for grib format"));
}

#[test]
fn validate_collection() {
    let dir = TempDir::new().unwrap();
    write(&dir, "collection.yaml", COLLECTION);
    multio(&dir)
        .args(["validate", "collection.yaml", "--collection", "--strict"])
        .assert()
        .success();
}

// ---------------------------------------------------------------------------
// show / convert
// ---------------------------------------------------------------------------

#[test]
fn show_lists_plans() {
    let dir = TempDir::new().unwrap();
    write(&dir, "plans.yaml", OUTPUT_PLAN);
    multio(&dir)
        .args(["show", "plans.yaml"])
        .assert()
        .success()
        .stdout(predicate::str::contains("output-plan"))
        .stdout(predicate::str::contains("select > encode > sink"));
}

#[test]
fn show_collection_json() {
    let dir = TempDir::new().unwrap();
    write(&dir, "collection.yaml", COLLECTION);
    let out = multio(&dir)
        .args(["show", "collection.yaml", "--collection", "--json"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
    let rows = value.as_array().unwrap();
    assert_eq!(rows.len(), 2);
    let server = rows.iter().find(|r| r["config"] == "server").unwrap();
    assert_eq!(server["role"], "server");
    assert_eq!(server["transport"], "mpi");
    let client = rows.iter().find(|r| r["config"] == "client").unwrap();
    assert_eq!(client["actions"][0], "transport");
    assert_eq!(client["terminal"], true);
}

#[test]
fn convert_yaml_to_json_stdout() {
    let dir = TempDir::new().unwrap();
    write(&dir, "plans.yaml", OUTPUT_PLAN);
    let out = multio(&dir)
        .args(["convert", "plans.yaml", "--to", "json"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
    let actions = &value["plans"][0]["actions"];
    assert_eq!(actions[1]["grid-type"], "n320");
    assert_eq!(actions[2]["sinks"][0]["per-server"], false);
}

#[test]
fn convert_to_file_roundtrips() {
    let dir = TempDir::new().unwrap();
    write(&dir, "plans.yaml", OUTPUT_PLAN);
    multio(&dir)
        .args(["convert", "plans.yaml", "--to", "json", "-o", "plans.json"])
        .assert()
        .success();
    multio(&dir)
        .args(["convert", "plans.json", "--to", "yaml", "-o", "again.yaml"])
        .assert()
        .success();
    let again = read(&dir.path().join("again.yaml"));
    assert!(again.contains("name: output-plan"));
    assert!(again.contains("template: grib_template.grib"));
}

#[test]
fn convert_ensure_sink() {
    let dir = TempDir::new().unwrap();
    write(
        &dir,
        "plans.yaml",
        "plans:\n  - name: p\n    actions:\n      - type: print\n",
    );
    multio(&dir)
        .args(["convert", "plans.yaml", "--ensure-sink"])
        .assert()
        .success()
        .stdout(predicate::str::contains("type: sink"));
}

#[test]
fn convert_rejects_unknown_format() {
    let dir = TempDir::new().unwrap();
    write(&dir, "plans.yaml", OUTPUT_PLAN);
    multio(&dir)
        .args(["convert", "plans.yaml", "--to", "toml"])
        .assert()
        .failure();
}

// ---------------------------------------------------------------------------
// env / run
// ---------------------------------------------------------------------------

#[test]
fn env_prints_export_line() {
    let dir = TempDir::new().unwrap();
    write(&dir, "plans.yaml", OUTPUT_PLAN);
    multio(&dir)
        .args(["env", "plans.yaml"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("export MULTIO_PLANS='{"));
}

#[test]
fn env_json_is_parseable_config() {
    let dir = TempDir::new().unwrap();
    write(&dir, "plans.yaml", OUTPUT_PLAN);
    let out = multio(&dir)
        .args(["--json", "env", "plans.yaml", "--var", "CUSTOM_PLANS"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
    let inline = value["CUSTOM_PLANS"].as_str().unwrap();
    let config: serde_json::Value = serde_json::from_str(inline).unwrap();
    assert_eq!(config["plans"][0]["name"], "output-plan");
}

#[cfg(unix)]
#[test]
fn run_exports_inline_plans() {
    let dir = TempDir::new().unwrap();
    write(&dir, "plans.yaml", OUTPUT_PLAN);
    multio(&dir)
        .args([
            "run",
            "plans.yaml",
            "--",
            "sh",
            "-c",
            r#"echo "$MULTIO_PLANS" | grep -q output-plan"#,
        ])
        .assert()
        .success();
}

#[cfg(unix)]
#[test]
fn run_exports_plans_file() {
    let dir = TempDir::new().unwrap();
    write(&dir, "plans.yaml", OUTPUT_PLAN);
    multio(&dir)
        .args([
            "run",
            "plans.yaml",
            "--plans-file",
            "exported.json",
            "--",
            "sh",
            "-c",
            r#"test -f "$MULTIO_PLANS_FILE" && test -z "$MULTIO_PLANS""#,
        ])
        .assert()
        .success();
    assert!(dir.path().join("exported.json").exists());
}

#[cfg(unix)]
#[test]
fn run_propagates_failure() {
    let dir = TempDir::new().unwrap();
    write(&dir, "plans.yaml", OUTPUT_PLAN);
    multio(&dir)
        .args(["run", "plans.yaml", "--", "sh", "-c", "exit 3"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("exited with status 3"));
}
