mod common;

use std::fs;

use assert_cmd::cargo::cargo_bin_cmd;
use common::{TestWorkspace, fixture_path};
use predicates::str::contains;
use serde_json::Value as JsonValue;

fn fixture_arg(name: &str) -> String {
    fixture_path(name).to_string_lossy().into_owned()
}

#[test]
fn probe_prints_inferred_columns() {
    cargo_bin_cmd!("csv-normalize")
        .args(["probe", "-i", &fixture_arg("orders.csv")])
        .assert()
        .success()
        .stdout(contains("Table 'orders': 5 column(s), 10 sampled row(s)"))
        .stdout(contains("customer_email"))
        .stdout(contains("INT"));
}

#[test]
fn probe_emits_json_columns() {
    let output = cargo_bin_cmd!("csv-normalize")
        .args(["probe", "-i", &fixture_arg("orders.csv"), "--format", "json"])
        .output()
        .expect("run probe");
    assert!(output.status.success());
    let report: JsonValue = serde_json::from_slice(&output.stdout).expect("probe json");
    assert_eq!(report["table"], "orders");
    assert_eq!(report["rows"], 10);
    assert_eq!(report["columns"][0]["name"], "order_id");
    assert_eq!(report["columns"].as_array().map(Vec::len), Some(5));
}

#[test]
fn dependencies_lists_the_customer_dependency_and_key() {
    cargo_bin_cmd!("csv-normalize")
        .args(["dependencies", "-i", &fixture_arg("orders.csv")])
        .assert()
        .success()
        .stdout(contains("{customer_email} -> {customer_name}"))
        .stdout(contains("Candidate keys (1):"))
        .stdout(contains("Primary key: {order_id}"));
}

#[test]
fn classify_reports_the_current_form() {
    cargo_bin_cmd!("csv-normalize")
        .args(["classify", "-i", &fixture_arg("orders.csv")])
        .assert()
        .success()
        .stdout("orders: 2NF\n");

    cargo_bin_cmd!("csv-normalize")
        .args(["classify", "-i", &fixture_arg("contacts.csv")])
        .assert()
        .success()
        .stdout("contacts: Unnormalized\n");
}

#[test]
fn classify_reads_standard_input() {
    let csv = fs::read_to_string(fixture_path("orders.csv")).expect("read fixture");
    cargo_bin_cmd!("csv-normalize")
        .args(["classify", "-i", "-"])
        .write_stdin(csv)
        .assert()
        .success()
        .stdout("stdin: 2NF\n");
}

#[test]
fn analyze_text_report_shows_steps_and_final_tables() {
    cargo_bin_cmd!("csv-normalize")
        .args(["analyze", "-i", &fixture_arg("orders.csv")])
        .assert()
        .success()
        .stdout(contains("Table 'orders': 2NF -> 5NF (target 5NF)"))
        .stdout(contains("4 step(s)"))
        .stdout(contains("Transitive dependency in 'orders'"))
        .stdout(contains("orders_customer_name (primary key {customer_name}, 3 row(s))"));
}

#[test]
fn analyze_json_report_round_trips_the_summary() {
    let output = cargo_bin_cmd!("csv-normalize")
        .args(["analyze", "-i", &fixture_arg("orders.csv"), "--format", "json"])
        .output()
        .expect("run analyze");
    assert!(output.status.success());
    let report: JsonValue = serde_json::from_slice(&output.stdout).expect("analysis json");
    let summary = &report["summary"];
    assert!(summary["analysis_id"].is_string());
    assert_eq!(summary["original_nf"], "2NF");
    assert_eq!(summary["final_nf"], "5NF");
    assert_eq!(summary["tables_count"], 2);
    assert_eq!(report["tables"][1]["name"], "orders_customer_name");
    assert!(
        report["violations"]
            .as_array()
            .is_some_and(|v| !v.is_empty())
    );
}

#[test]
fn analyze_writes_report_and_exports_tables() {
    let workspace = TestWorkspace::new();
    let report = workspace.path().join("report.yaml");
    let export_dir = workspace.path().join("tables");
    cargo_bin_cmd!("csv-normalize")
        .args([
            "analyze",
            "-i",
            &fixture_arg("orders.csv"),
            "--format",
            "yaml",
            "-o",
            report.to_str().expect("utf-8 path"),
            "--export-dir",
            export_dir.to_str().expect("utf-8 path"),
        ])
        .assert()
        .success()
        .stdout("");

    let yaml = fs::read_to_string(&report).expect("read report");
    let parsed: serde_yaml::Value = serde_yaml::from_str(&yaml).expect("parse yaml report");
    assert_eq!(parsed["summary"]["final_nf"].as_str(), Some("5NF"));

    let customers =
        fs::read_to_string(export_dir.join("orders_customer_name.csv")).expect("customers csv");
    assert_eq!(
        customers,
        "customer_name,customer_email\nAlice,alice@example.com\nBob,bob@example.com\nCarol,carol@example.com\n"
    );
    let orders = fs::read_to_string(export_dir.join("orders.csv")).expect("orders csv");
    assert!(orders.starts_with("order_id,product,qty,customer_name\n1,Widget,2,Alice\n"));
}

#[test]
fn analyze_honours_target_flag_and_config_file() {
    cargo_bin_cmd!("csv-normalize")
        .args(["analyze", "-i", &fixture_arg("orders.csv"), "--target", "3NF"])
        .assert()
        .success()
        .stdout(contains("Table 'orders': 2NF -> 3NF (target 3NF)"))
        .stdout(contains("1 step(s)"));

    let workspace = TestWorkspace::new();
    let config = workspace.write("settings.yml", "target: BCNF\nconfidence_threshold: 0.9\n");
    cargo_bin_cmd!("csv-normalize")
        .args([
            "analyze",
            "-i",
            &fixture_arg("orders.csv"),
            "--config",
            config.to_str().expect("utf-8 path"),
        ])
        .assert()
        .success()
        .stdout(contains("(target BCNF)"));
}

#[test]
fn analyze_flags_repeating_groups() {
    cargo_bin_cmd!("csv-normalize")
        .args(["analyze", "-i", &fixture_arg("contacts.csv"), "--target", "1NF"])
        .assert()
        .success()
        .stdout(contains("Repeating group in 'contacts': phone1, phone2, phone3"));
}

#[test]
fn invalid_threshold_is_rejected() {
    cargo_bin_cmd!("csv-normalize")
        .args(["dependencies", "-i", &fixture_arg("orders.csv"), "--threshold", "1.5"])
        .assert()
        .failure()
        .stderr(contains("error: Validating analysis settings"));
}

#[test]
fn missing_input_reports_loading_failure() {
    cargo_bin_cmd!("csv-normalize")
        .args(["classify", "-i", "does-not-exist.csv"])
        .assert()
        .failure()
        .stderr(contains("error: Loading table from"));
}

#[test]
fn unnormalized_target_is_a_usage_error() {
    cargo_bin_cmd!("csv-normalize")
        .args(["analyze", "-i", &fixture_arg("orders.csv"), "--target", "UNF"])
        .assert()
        .failure()
        .stderr(contains("Target must be 1NF or higher"));
}
