//! Integration tests for the oxydose binary.
//!
//! These tests verify end-to-end behavior including:
//! - Dose calculation output (human and JSON)
//! - Boundary validation and unknown ids
//! - Custom catalogs and configuration
//! - Catalog listing commands

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

/// Helper to create a test directory holding an empty config file
///
/// Every command gets `--config` so a developer's own config never leaks in.
fn setup_test_dir() -> (TempDir, PathBuf) {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let config_path = temp_dir.path().join("config.toml");
    fs::write(&config_path, "").expect("Failed to write config");
    (temp_dir, config_path)
}

/// Helper to get the path to the CLI binary
fn cli() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("oxydose"))
}

/// Reference patient: 70 y male, 80 kg, 175 cm, ASA 3, knee replacement
fn calc_reference(config: &PathBuf) -> Command {
    let mut cmd = cli();
    cmd.arg("calc")
        .arg("--config")
        .arg(config)
        .args(["--procedure", "knee_replacement"])
        .args(["--age", "70", "--sex", "male"])
        .args(["--weight", "80", "--height", "175", "--asa", "3"]);
    cmd
}

#[test]
fn test_cli_help() {
    cli()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Post-operative opioid dose recommendation",
        ));
}

#[test]
fn test_calc_prints_breakdown() {
    let (_temp_dir, config) = setup_test_dir();

    calc_reference(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("Recommended dose:     45.50 mg"))
        .stdout(predicate::str::contains("Secondary estimate:   41.00 mg"))
        .stdout(predicate::str::contains("Age factor:          ×0.779"))
        .stdout(predicate::str::contains("DANGER"));
}

#[test]
fn test_calc_json_report() {
    let (_temp_dir, config) = setup_test_dir();

    let output = calc_reference(&config)
        .args(["--adjuvant", "nsaid", "--adjuvant", "ketamine", "--json"])
        .output()
        .expect("Failed to run");
    assert!(output.status.success());

    let report: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("stdout is not JSON");
    assert_eq!(report["procedure_id"], "knee_replacement");
    assert_eq!(report["adjuvant_ids"], serde_json::json!(["ketamine", "nsaid"]));
    assert_eq!(report["result"]["rule_based_dose"], 27.5);
    assert_eq!(report["result"]["breakdown"]["asa_factor"], 1.1);
    assert_eq!(report["bmi_category"], "overweight");

    // 27.5 mg is high but not dangerous; ketamine is the only sedative
    let alerts = report["alerts"].as_array().unwrap();
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0]["kind"], "high_dose");
}

#[test]
fn test_invalid_patient_rejected() {
    let (_temp_dir, config) = setup_test_dir();

    cli()
        .arg("calc")
        .arg("--config")
        .arg(&config)
        .args(["--procedure", "appendectomy"])
        .args(["--age", "150", "--sex", "female"])
        .args(["--weight", "60", "--height", "165", "--asa", "7"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Age must be between"))
        .stderr(predicate::str::contains("ASA class must be between"));
}

#[test]
fn test_unknown_procedure_rejected() {
    let (_temp_dir, config) = setup_test_dir();

    cli()
        .arg("calc")
        .arg("--config")
        .arg(&config)
        .args(["--procedure", "brain_surgery"])
        .args(["--age", "40", "--sex", "male"])
        .args(["--weight", "70", "--height", "180", "--asa", "1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("UnknownProcedure"));
}

#[test]
fn test_unknown_adjuvant_rejected() {
    let (_temp_dir, config) = setup_test_dir();

    calc_reference(&config)
        .args(["--adjuvant", "unicorn_dust"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unicorn_dust"));
}

#[test]
fn test_invalid_sex_rejected_by_parser() {
    let (_temp_dir, config) = setup_test_dir();

    cli()
        .arg("calc")
        .arg("--config")
        .arg(&config)
        .args(["--procedure", "appendectomy"])
        .args(["--age", "40", "--sex", "unknown"])
        .args(["--weight", "70", "--height", "180", "--asa", "1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("expected male or female"));
}

#[test]
fn test_config_changes_reference_weight() {
    let (_temp_dir, config) = setup_test_dir();
    fs::write(&config, "[engine]\nreference_weight_kg = 35.0\n").unwrap();

    // 40 y, 70 kg, 180 cm male: ABW = 70, so halving the reference doubles the dose
    let output = cli()
        .arg("calc")
        .arg("--config")
        .arg(&config)
        .args(["--procedure", "hip_replacement"])
        .args(["--age", "40", "--sex", "male"])
        .args(["--weight", "70", "--height", "180", "--asa", "1", "--json"])
        .output()
        .expect("Failed to run");
    assert!(output.status.success());

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["result"]["rule_based_dose"], 88.0);
}

#[test]
fn test_invalid_config_rejected() {
    let (_temp_dir, config) = setup_test_dir();
    fs::write(&config, "[engine]\nadjuvant_safety_limit_factor = 2.0\n").unwrap();

    cli()
        .arg("adjuvants")
        .arg("--config")
        .arg(&config)
        .assert()
        .failure()
        .stderr(predicate::str::contains("adjuvant_safety_limit_factor"));
}

#[test]
fn test_custom_catalog() {
    let (temp_dir, config) = setup_test_dir();
    let catalog_path = temp_dir.path().join("catalog.toml");
    fs::write(
        &catalog_path,
        r#"
[[procedures]]
id = "tonsillectomy"
name = "Tonsillectomy"
specialty = "ENT"
base_mme = 10.0
pain_profile = { somatic = 7.0, visceral = 1.0, neuropathic = 2.0 }
"#,
    )
    .unwrap();

    cli()
        .arg("procedures")
        .arg("--config")
        .arg(&config)
        .arg("--catalog")
        .arg(&catalog_path)
        .assert()
        .success()
        .stdout(predicate::str::contains("tonsillectomy"))
        .stdout(predicate::str::contains("knee_replacement").not());

    // 40 y, 70 kg, 180 cm male: 10 MME -> 20 mg
    cli()
        .arg("calc")
        .arg("--config")
        .arg(&config)
        .arg("--catalog")
        .arg(&catalog_path)
        .args(["--procedure", "tonsillectomy"])
        .args(["--age", "40", "--sex", "male"])
        .args(["--weight", "70", "--height", "180", "--asa", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Recommended dose:     20.00 mg"));
}

#[test]
fn test_check_catalog_reports_problems() {
    let (temp_dir, config) = setup_test_dir();
    let catalog_path = temp_dir.path().join("catalog.toml");
    fs::write(
        &catalog_path,
        r#"
[[procedures]]
id = "broken"
name = "Broken"
specialty = "ENT"
base_mme = -4.0
pain_profile = { somatic = 1.0, visceral = 1.0, neuropathic = 1.0 }
"#,
    )
    .unwrap();

    cli()
        .arg("check-catalog")
        .arg("--config")
        .arg(&config)
        .arg("--catalog")
        .arg(&catalog_path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Catalog validation errors"))
        .stderr(predicate::str::contains("base MME"));
}

#[test]
fn test_check_default_catalog() {
    let (_temp_dir, config) = setup_test_dir();

    cli()
        .arg("check-catalog")
        .arg("--config")
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("6 procedures, 9 adjuvants"));
}

#[test]
fn test_procedures_filtered_by_specialty() {
    let (_temp_dir, config) = setup_test_dir();

    cli()
        .arg("procedures")
        .arg("--config")
        .arg(&config)
        .args(["--specialty", "urology"])
        .assert()
        .success()
        .stdout(predicate::str::contains("prostatectomy"))
        .stdout(predicate::str::contains("appendectomy").not());
}

#[test]
fn test_adjuvants_listing() {
    let (_temp_dir, config) = setup_test_dir();

    cli()
        .arg("adjuvants")
        .arg("--config")
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("ketamine"))
        .stdout(predicate::str::contains("select (Ibuprofen/Ketorolac/Celecoxib)"));
}

#[test]
fn test_init_config_writes_defaults() {
    let temp_dir = tempfile::tempdir().unwrap();
    let config = temp_dir.path().join("oxydose").join("config.toml");

    cli()
        .arg("init-config")
        .arg("--config")
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("Wrote default config"));

    let contents = fs::read_to_string(&config).unwrap();
    assert!(contents.contains("reference_weight_kg = 70.0"));

    // Second run leaves the file alone
    cli()
        .arg("init-config")
        .arg("--config")
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("already exists"));
}
