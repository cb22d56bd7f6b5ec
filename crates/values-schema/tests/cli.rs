use std::fs;
use std::path::Path;
use std::process::{Command, Output};

fn run_in(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_values-schema"))
        .args(args)
        .current_dir(dir)
        .env_remove("VALUES_SCHEMA_LOG")
        .output()
        .expect("failed to execute values-schema")
}

const TRUTH: &str = "\
$properties:
  replicaCount:
    _type: integer
  image:
    repository:
      _type: string
    tag:
      $optional: true
      _type: string
  nameOverride:
    $optional: true
    _type: string
";

#[test]
fn generates_schema_with_default_paths() -> Result<(), Box<dyn core::error::Error>> {
    let tmp = tempfile::tempdir()?;
    fs::write(tmp.path().join("values.truth.yaml"), TRUTH)?;

    let output = run_in(tmp.path(), &["generate"]);
    assert!(output.status.success(), "{output:?}");

    let written = fs::read_to_string(tmp.path().join("values.schema.json"))?;
    let schema: serde_json::Value = serde_json::from_str(&written)?;
    assert_eq!(schema["required"], serde_json::json!(["replicaCount", "image"]));
    assert_eq!(
        schema["properties"]["nameOverride"],
        serde_json::json!({"type": "string"})
    );
    assert_eq!(
        schema["properties"]["image"]["properties"]["tag"]["$optional"],
        serde_json::json!(true)
    );
    Ok(())
}

#[test]
fn config_file_enables_recursive_required() -> Result<(), Box<dyn core::error::Error>> {
    let tmp = tempfile::tempdir()?;
    fs::create_dir(tmp.path().join("chart"))?;
    fs::write(tmp.path().join("chart/values.truth.yaml"), TRUTH)?;
    fs::write(
        tmp.path().join("values-schema.toml"),
        "input = \"chart/values.truth.yaml\"\noutput = \"chart/values.schema.json\"\nrecursive-required = true\n",
    )?;

    let output = run_in(tmp.path(), &["generate"]);
    assert!(output.status.success(), "{output:?}");

    let written = fs::read_to_string(tmp.path().join("chart/values.schema.json"))?;
    let schema: serde_json::Value = serde_json::from_str(&written)?;
    assert_eq!(
        schema["properties"]["image"]["required"],
        serde_json::json!(["repository"])
    );
    assert!(
        schema["properties"]["image"]["properties"]["tag"]
            .get("$optional")
            .is_none()
    );
    Ok(())
}

#[test]
fn check_reports_stale_output() -> Result<(), Box<dyn core::error::Error>> {
    let tmp = tempfile::tempdir()?;
    fs::write(tmp.path().join("values.truth.yaml"), TRUTH)?;

    let output = run_in(tmp.path(), &["generate", "--check"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(!tmp.path().join("values.schema.json").exists());

    assert!(run_in(tmp.path(), &["generate"]).status.success());
    let output = run_in(tmp.path(), &["generate", "--check"]);
    assert!(output.status.success(), "{output:?}");
    Ok(())
}

#[test]
fn stdout_mode_prints_schema() -> Result<(), Box<dyn core::error::Error>> {
    let tmp = tempfile::tempdir()?;
    fs::write(tmp.path().join("values.truth.yaml"), TRUTH)?;

    let output = run_in(tmp.path(), &["generate", "--stdout"]);
    assert!(output.status.success(), "{output:?}");
    let schema: serde_json::Value = serde_json::from_slice(&output.stdout)?;
    assert_eq!(schema["type"], "object");
    assert!(!tmp.path().join("values.schema.json").exists());
    Ok(())
}

#[test]
fn invalid_yaml_fails_without_output() -> Result<(), Box<dyn core::error::Error>> {
    let tmp = tempfile::tempdir()?;
    fs::write(tmp.path().join("values.truth.yaml"), "$properties: {a: [\n")?;

    let output = run_in(tmp.path(), &["generate"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(!tmp.path().join("values.schema.json").exists());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("values_schema::input_parse"), "{stderr}");
    Ok(())
}

#[test]
fn missing_properties_key_fails() -> Result<(), Box<dyn core::error::Error>> {
    let tmp = tempfile::tempdir()?;
    fs::write(tmp.path().join("values.truth.yaml"), "replicaCount: 1\n")?;

    let output = run_in(tmp.path(), &["generate"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(!tmp.path().join("values.schema.json").exists());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("$properties"), "{stderr}");
    Ok(())
}

#[test]
fn missing_input_fails() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let output = run_in(tmp.path(), &["generate"]);
    assert_eq!(output.status.code(), Some(1));
}
