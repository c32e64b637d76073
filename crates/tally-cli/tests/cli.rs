use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const SCENARIO: &str =
    "Website design for $1500, content creation for $500. Apply 8% tax. Due in 14 days.";

/// A config file in its own directory, so tests never read the user's config.
fn workspace() -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = dir.path().join("config.json");
    fs::write(&config, "{}").expect("config");
    (dir, config)
}

fn tally(config: &Path) -> Command {
    let mut cmd = Command::cargo_bin("tally").expect("bin");
    cmd.env_remove("TALLY_API_KEY")
        .env_remove("RUST_LOG")
        .arg("--config")
        .arg(config);
    cmd
}

#[test]
fn extract_prints_json_result() {
    let (_dir, config) = workspace();

    let output = tally(&config)
        .args(["extract", SCENARIO, "--provider", "local-rules"])
        .output()
        .expect("run");
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).expect("json");
    assert_eq!(json["provider"], "local-rules");
    assert_eq!(json["items"].as_array().map(Vec::len), Some(2));
    assert_eq!(json["due_days"], 14);
    assert_eq!(json["due_date"].as_str().map(str::len), Some(10));
}

#[test]
fn extract_remote_without_key_falls_back() {
    let (_dir, config) = workspace();

    tally(&config)
        .args(["extract", "Logo design for $350"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"provider\": \"local-rules\""));
}

#[test]
fn extract_reads_stdin_and_file() {
    let (dir, config) = workspace();

    tally(&config)
        .args(["extract", "--provider", "provider-b", "--format", "text"])
        .write_stdin("Website design for $1500")
        .assert()
        .success()
        .stdout(predicate::str::contains("Custom Design with Responsive Layout"));

    let input = dir.path().join("job.txt");
    fs::write(&input, "Invoice for Acme Corp (billing@acme.com) at 1 Main St. Logo design for $350.").unwrap();
    tally(&config)
        .args(["extract", "--provider", "local-rules", "--file"])
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::contains("billing@acme.com"))
        .stdout(predicate::str::contains("1 Main St"));
}

#[test]
fn extract_rejects_blank_input() {
    let (_dir, config) = workspace();

    tally(&config)
        .args(["extract", "   "])
        .assert()
        .failure()
        .stderr(predicate::str::contains("empty"));
}

#[test]
fn extract_rejects_unknown_provider() {
    let (_dir, config) = workspace();

    tally(&config)
        .args(["extract", "Logo for $300", "--provider", "gpt"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown provider"));
}

#[test]
fn invoice_text_shows_totals() {
    let (_dir, config) = workspace();

    tally(&config)
        .args(["invoice", SCENARIO, "--provider", "local-rules", "--format", "text"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Subtotal: $2,000.00"))
        .stdout(predicate::str::contains("Tax (8%): $160.00"))
        .stdout(predicate::str::contains("Total:    $2,160.00"))
        .stdout(predicate::str::is_match(r"Invoice: INV-\d{8}-\d{3}").unwrap());
}

#[test]
fn invoice_applies_overrides() {
    let (dir, config) = workspace();
    let business = dir.path().join("business.json");
    fs::write(&business, r#"{"name": "Studio Nine", "tax_id": "51 824 753 556"}"#).unwrap();
    let output_path = dir.path().join("invoice.json");

    tally(&config)
        .args([
            "invoice",
            "Invoice for Acme Corp. Logo for $300.",
            "--provider",
            "local-rules",
            "--client-name",
            "Globex",
        ])
        .arg("--business")
        .arg(&business)
        .arg("--output")
        .arg(&output_path)
        .assert()
        .success();

    let json: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&output_path).unwrap()).unwrap();
    assert_eq!(json["client"]["name"], "Globex");
    assert_eq!(json["company"]["name"], "Studio Nine");
    assert_eq!(json["company"]["tax_id"], "51 824 753 556");
}

#[test]
fn invoice_validate_reports_issues() {
    let (_dir, config) = workspace();

    tally(&config)
        .args(["invoice", "Fixed the gate", "--provider", "local-rules", "--validate"])
        .assert()
        .success()
        .stderr(predicate::str::contains("Client name was not provided"));
}

#[test]
fn batch_processes_directory() {
    let (dir, config) = workspace();
    let inputs = dir.path().join("jobs");
    let out = dir.path().join("out");
    fs::create_dir_all(&inputs).unwrap();
    fs::write(inputs.join("a.txt"), SCENARIO).unwrap();
    fs::write(inputs.join("b.txt"), "Logo for $300").unwrap();
    fs::write(inputs.join("blank.txt"), "  ").unwrap();
    fs::write(inputs.join("notes.md"), "ignored").unwrap();

    tally(&config)
        .arg("batch")
        .arg(format!("{}/*", inputs.display()))
        .args(["--provider", "local-rules", "--summary", "--continue-on-error"])
        .arg("--output-dir")
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("Processed 3 files"))
        .stdout(predicate::str::contains("2 successful, 1 failed"));

    assert!(out.join("a.json").exists());
    assert!(out.join("b.json").exists());
    assert!(!out.join("blank.json").exists());

    let summary = fs::read_to_string(out.join("summary.csv")).unwrap();
    assert!(summary.starts_with("filename,status,"));
    assert!(summary.contains("a.txt,success"));
    assert!(summary.contains("blank.txt,error"));
}

#[test]
fn batch_stops_on_error_by_default() {
    let (dir, config) = workspace();
    fs::write(dir.path().join("blank.txt"), "").unwrap();

    tally(&config)
        .arg("batch")
        .arg(format!("{}/*.txt", dir.path().display()))
        .assert()
        .failure();
}

#[test]
fn providers_lists_all() {
    let (_dir, config) = workspace();

    tally(&config)
        .arg("providers")
        .assert()
        .success()
        .stdout(predicate::str::contains("local-rules"))
        .stdout(predicate::str::contains("provider-c"))
        .stdout(predicate::str::contains("(default)"));
}

#[test]
fn config_set_then_get() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("nested").join("config.json");

    tally(&config)
        .args(["config", "set", "extraction.default_provider", "provider-b"])
        .assert()
        .success();

    tally(&config)
        .args(["config", "get", "extraction.default_provider"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"provider-b\""));

    tally(&config)
        .args(["config", "set", "extraction.default_provider", "gpt"])
        .assert()
        .failure();

    tally(&config)
        .args(["config", "set", "extraction.no_such_key", "1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn config_init_refuses_overwrite() {
    let (_dir, config) = workspace();

    tally(&config).args(["config", "init"]).assert().failure();
    tally(&config).args(["config", "init", "--force"]).assert().success();

    tally(&config)
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"default_due_days\": 30"));
}
