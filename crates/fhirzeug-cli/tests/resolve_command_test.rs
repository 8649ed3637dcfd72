//! Integration tests for the `fhirzeug` binary

use std::io::Write;
use std::process::{Command, Output};

use tempfile::NamedTempFile;

fn write_input(content: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new()
        .prefix("fhirzeug-cli-")
        .suffix(".yaml")
        .tempfile()
        .unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

/// Run the binary with logging silenced so stderr only carries errors
fn fhirzeug(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_fhirzeug"))
        .args(args)
        .env("RUST_LOG", "off")
        .output()
        .unwrap()
}

fn path_arg(file: &NamedTempFile) -> &str {
    file.path().to_str().unwrap()
}

const PROFILES: &str = r#"
profiles:
  - url: http://hl7.org/fhir/StructureDefinition/Patient
    elements:
      - path: Patient
        class: { name: Patient, superclass: DomainResource }
      - path: Patient.active
        owner: Patient
        types: [{ code: boolean }]
        min: 0
        max: "1"
      - path: Patient.deceased[x]
        owner: Patient
        types: [{ code: boolean }, { code: dateTime }]
        min: 0
        max: "1"
      - path: Patient.name
        owner: Patient
        types: [{ code: HumanName }]
        min: 0
        max: "*"
"#;

#[test]
fn resolve_prints_summary_and_unresolved_superclass() {
    let input = write_input(PROFILES);
    let output = fhirzeug(&["resolve", path_arg(&input)]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Resolved 1 classes from 1 profiles"));
    assert!(stdout.contains("Patient(DomainResource): 4 properties"));
    assert!(stdout.contains("UNRESOLVED_SUPERCLASS"));
}

#[test]
fn resolve_strict_fails_on_warnings() {
    let input = write_input(PROFILES);
    let output = fhirzeug(&["resolve", "--strict", path_arg(&input)]);
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("strict"));
}

#[test]
fn resolve_json_dump_is_valid_json() {
    let input = write_input(PROFILES);
    let output = fhirzeug(&[
        "resolve",
        path_arg(&input),
        "--format",
        "json",
    ]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let dump: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("stdout should be JSON");
    let properties = dump["classes"][0]["properties"].as_array().unwrap();
    let names: Vec<_> = properties
        .iter()
        .map(|p| p["name"].as_str().unwrap())
        .collect();
    assert_eq!(
        names,
        vec!["active", "deceasedBoolean", "deceasedDateTime", "name"]
    );
    assert_eq!(dump["stats"]["profiles"], 1);
}

#[test]
fn resolve_applies_rule_overrides() {
    let input = write_input(PROFILES);
    let rules = write_input("class_map:\n  boolean: Flag\n");
    let output = fhirzeug(&[
        "classes",
        path_arg(&input),
        "--rules",
        path_arg(&rules),
    ]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("  active: Flag"));
    assert!(stdout.contains("  name: HumanName[]"));
}

#[test]
fn resolve_missing_input_fails() {
    let output = fhirzeug(&["resolve", "/nonexistent/profiles.yaml"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("failed to load profiles"));
}
