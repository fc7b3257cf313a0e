#![cfg(feature = "cli")]

use std::path::Path;
use std::process::{Command, Output};

use serde_json::Value;

const USERS: &str = r##"
openapi: 3.0.3
info:
  title: Users
  version: 1.0.0
paths:
  /users/{userId}:
    get:
      operationId: getUser
      parameters:
        - name: userId
          in: path
          required: true
          schema:
            type: string
      responses:
        "200":
          description: ok
          content:
            application/json:
              schema:
                $ref: "#/components/schemas/User"
              example:
                name: a
components:
  schemas:
    User:
      type: object
      required: [name]
      properties:
        name:
          type: string
        password:
          type: string
          minLength: 7
"##;

fn speclink(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_speclink"))
        .arg("--log-level")
        .arg("error")
        .arg("--format")
        .arg("json")
        .args(args)
        .output()
        .expect("speclink should run")
}

fn write(dir: &Path, name: &str, body: &str) -> String {
    let path = dir.join(name);
    std::fs::write(&path, body).expect("fixture should be writable");
    path.display().to_string()
}

fn stdout_json(output: &Output) -> Value {
    serde_json::from_slice(&output.stdout).expect("stdout should be JSON")
}

#[test]
fn validate_valid_document_exits_zero() {
    let dir = tempfile::tempdir().unwrap();
    let api = write(dir.path(), "users.yaml", USERS);

    let output = speclink(&["validate", &api]);
    assert_eq!(output.status.code(), Some(0));
    let result = stdout_json(&output);
    assert_eq!(result["valid"], true);
    assert_eq!(result["references"], 1);
    assert!(result["schema_id"]
        .as_str()
        .unwrap()
        .ends_with("validate-result.schema.json"));
}

#[test]
fn validate_bad_example_exits_60_with_issue() {
    let dir = tempfile::tempdir().unwrap();
    let api = write(
        dir.path(),
        "users.yaml",
        &USERS.replace("                name: a", "                name: a\n                password: short"),
    );

    let output = speclink(&["validate", &api]);
    assert_eq!(output.status.code(), Some(60));
    let result = stdout_json(&output);
    assert_eq!(result["valid"], false);
    let issues = result["issues"].as_array().unwrap();
    assert_eq!(issues.len(), 1);
    let message = issues[0]["message"].as_str().unwrap();
    assert!(message.contains("/password"));
    assert!(message.contains("minLength"));

    let output = speclink(&["validate", &api, "--no-examples"]);
    assert_eq!(output.status.code(), Some(0));
}

#[test]
fn malformed_input_exits_65() {
    let dir = tempfile::tempdir().unwrap();
    let api = write(dir.path(), "broken.json", "{\"openapi\": ");

    let output = speclink(&["validate", &api]);
    assert_eq!(output.status.code(), Some(65));
    assert!(String::from_utf8_lossy(&output.stderr).contains("error:"));
}

#[test]
fn missing_file_and_dangling_reference_exit_66() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("absent.yaml").display().to_string();
    let output = speclink(&["validate", &missing]);
    assert_eq!(output.status.code(), Some(66));

    let api = write(
        dir.path(),
        "dangling.yaml",
        &USERS.replace("#/components/schemas/User", "#/components/schemas/Gone"),
    );
    let output = speclink(&["resolve", &api]);
    assert_eq!(output.status.code(), Some(66));
    assert!(String::from_utf8_lossy(&output.stderr).contains("#/components/schemas/Gone"));
}

#[test]
fn external_references_require_opt_in() {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "common.yaml",
        "User:\n  type: object\n  required: [name]\n  properties:\n    name:\n      type: string\n",
    );
    let api = write(
        dir.path(),
        "users.yaml",
        &USERS.replace("#/components/schemas/User", "common.yaml#/User"),
    );

    let output = speclink(&["validate", &api]);
    assert_eq!(output.status.code(), Some(66));

    let output = speclink(&["validate", &api, "--external-refs"]);
    assert_eq!(output.status.code(), Some(0));
    let result = stdout_json(&output);
    let external = result["external_documents"].as_array().unwrap();
    assert_eq!(external.len(), 1);
    assert!(external[0].as_str().unwrap().ends_with("/common.yaml"));
}

#[test]
fn resolve_reports_reference_counts() {
    let dir = tempfile::tempdir().unwrap();
    let api = write(dir.path(), "users.yaml", USERS);

    let output = speclink(&["resolve", &api]);
    assert_eq!(output.status.code(), Some(0));
    let result = stdout_json(&output);
    assert_eq!(result["format"], "yaml");
    assert_eq!(result["references"], 1);
    assert_eq!(result["bound"], 1);
    assert_eq!(result["resolved"], true);
}

#[test]
fn convert_yaml_to_json_keeps_references() {
    let dir = tempfile::tempdir().unwrap();
    let api = write(dir.path(), "users.yaml", USERS);

    let output = speclink(&["convert", &api, "--to", "json"]);
    assert_eq!(output.status.code(), Some(0));
    let converted = stdout_json(&output);
    assert_eq!(converted["openapi"], "3.0.3");
    assert_eq!(
        converted["paths"]["/users/{userId}"]["get"]["responses"]["200"]["content"]
            ["application/json"]["schema"]["$ref"],
        "#/components/schemas/User"
    );

    let target = dir.path().join("users.json");
    let output = speclink(&[
        "convert",
        &api,
        "--to",
        "json",
        "--output",
        &target.display().to_string(),
    ]);
    assert_eq!(output.status.code(), Some(0));
    let written: Value = serde_json::from_slice(&std::fs::read(&target).unwrap()).unwrap();
    assert_eq!(written["info"]["title"], "Users");
}

#[test]
fn invalid_timeout_is_a_usage_error() {
    let dir = tempfile::tempdir().unwrap();
    let api = write(dir.path(), "users.yaml", USERS);

    let output = speclink(&["validate", &api, "--timeout", "0s"]);
    assert_eq!(output.status.code(), Some(64));
}

#[test]
fn version_prints_package_version() {
    let output = speclink(&["version"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains(&format!("speclink {}", env!("CARGO_PKG_VERSION"))));
}

#[test]
fn extended_version_reports_build_details() {
    let output = speclink(&["version", "--extended"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    let profile = stdout
        .lines()
        .find_map(|line| line.strip_prefix("profile: "))
        .unwrap();
    assert!(["debug", "release"].contains(&profile), "{stdout}");
    assert!(!stdout.contains("rustc: unknown"), "{stdout}");
}

#[test]
fn envinfo_json_lists_schemes() {
    let output = speclink(&["envinfo"]);
    assert!(output.status.success());
    let result = stdout_json(&output);
    assert!(result["schemes"]
        .as_array()
        .unwrap()
        .iter()
        .any(|scheme| scheme == "file"));
}
