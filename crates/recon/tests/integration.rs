use std::path::PathBuf;

use patchwork_recon::config::PatchworkConfig;
use patchwork_recon::csv_io::{load_csv_file, write_csv_file};
use patchwork_recon::engine::{patch, run};
use patchwork_recon::model::{MarriageType, ReconInput, ReconResult, Value};
use patchwork_recon::ReconError;

fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn load_config(name: &str) -> PatchworkConfig {
    let toml = std::fs::read_to_string(fixtures_dir().join(name)).unwrap();
    PatchworkConfig::from_toml(&toml).unwrap()
}

fn load_input(config: &PatchworkConfig) -> ReconInput {
    let dir = fixtures_dir();
    let left = load_csv_file(&dir.join(&config.left.file), config.left.delimiter_byte().unwrap())
        .unwrap();
    let right = load_csv_file(&dir.join(&config.right.file), config.right.delimiter_byte().unwrap())
        .unwrap();
    ReconInput { left, right }
}

fn load_and_run(name: &str) -> ReconResult {
    let config = load_config(name);
    let input = load_input(&config);
    run(&config, &input).unwrap()
}

fn marriage_types(result: &ReconResult) -> Vec<MarriageType> {
    result
        .quilt
        .rows
        .iter()
        .map(|r| MarriageType::of_row(r).unwrap())
        .collect()
}

// -------------------------------------------------------------------------
// Key pass + fuzzy pass
// -------------------------------------------------------------------------

#[test]
fn customers_key_then_fuzzy() {
    let result = load_and_run("customers.patchwork.toml");

    assert_eq!(result.meta.config_name, "Customer merge");
    assert_eq!(result.summary.left_rows, 4);
    assert_eq!(result.summary.right_rows, 4);
    // 2 joined + 2 left-only + 2 right-only, then Bob and Carol by name.
    assert_eq!(result.summary.total_rows, 8);
    assert_eq!(result.summary.key_matches, 2);
    assert_eq!(result.summary.fuzzy_matches, 2);
    assert_eq!(result.summary.unknown, 4);

    use MarriageType::*;
    assert_eq!(
        marriage_types(&result),
        vec![KeyMatch, KeyMatch, Unknown, Unknown, Unknown, Unknown, FuzzyMatch, FuzzyMatch]
    );
}

#[test]
fn customers_quilt_columns() {
    let result = load_and_run("customers.patchwork.toml");
    assert_eq!(
        result.quilt.columns,
        vec![
            "id",
            "name_left",
            "city_left",
            "name_right",
            "city_right",
            "marriage_type",
            "id_left",
            "id_right",
            "fuzzy_score",
            "patch_id",
        ]
    );
}

#[test]
fn customers_row_contents() {
    let result = load_and_run("customers.patchwork.toml");
    let q = &result.quilt;

    // Joined row carries both sides under one id.
    assert_eq!(q.value(0, "id"), &Value::Int(1));
    assert_eq!(q.value(0, "name_left"), &Value::from("Alice"));
    assert_eq!(q.value(0, "name_right"), &Value::from("Alicia"));
    assert_eq!(q.value(0, "fuzzy_score"), &Value::Null);

    // Left-only Dave: right side null, empty city read as null.
    assert_eq!(q.value(3, "id"), &Value::Int(4));
    assert_eq!(q.value(3, "city_left"), &Value::Null);
    assert_eq!(q.value(3, "name_right"), &Value::Null);

    // Right-only rows keep their key in the shared column.
    assert_eq!(q.value(4, "id"), &Value::Int(5));
    assert_eq!(q.value(4, "name_left"), &Value::Null);
    assert_eq!(q.value(5, "name_right"), &Value::from("Zed"));

    // Bob -> Bobby lands exactly on the threshold and is accepted.
    assert_eq!(q.value(6, "name_left"), &Value::from("Bob"));
    assert_eq!(q.value(6, "name_right"), &Value::from("Bobby"));
    assert_eq!(q.value(6, "fuzzy_score"), &Value::Float(75.0));
    assert_eq!(q.value(6, "id"), &Value::Null);
    assert_eq!(q.value(6, "id_left"), &Value::Int(2));

    assert_eq!(q.value(7, "name_right"), &Value::from("Caroline"));
    assert_eq!(q.value(7, "id_right"), &Value::Int(5));
    let score = q.value(7, "fuzzy_score").as_f64().unwrap();
    assert!((score - 1000.0 / 13.0).abs() < 1e-9);

    let mean = result.summary.mean_fuzzy_score.unwrap();
    assert!((mean - (75.0 + 1000.0 / 13.0) / 2.0).abs() < 1e-9);
}

#[test]
fn patch_ids_are_gap_free() {
    let result = load_and_run("customers.patchwork.toml");
    let ids: Vec<&Value> = result.quilt.column("patch_id").collect();
    let expected: Vec<Value> = (1..=8).map(Value::Int).collect();
    assert_eq!(ids, expected.iter().collect::<Vec<_>>());

    let seventh = patch(&result.quilt, 7).unwrap();
    assert_eq!(seventh.get("name_left"), Some(&Value::from("Bob")));
    assert!(patch(&result.quilt, 0).is_none());
    assert!(patch(&result.quilt, 9).is_none());
}

#[test]
fn rerun_is_identical() {
    let config = load_config("customers.patchwork.toml");
    let input = load_input(&config);
    let first = run(&config, &input).unwrap();
    let second = run(&config, &input).unwrap();
    assert_eq!(first.quilt, second.quilt);
}

// -------------------------------------------------------------------------
// Config variants
// -------------------------------------------------------------------------

#[test]
fn fuzzy_only_with_semicolon_source() {
    let result = load_and_run("fuzzy-only.patchwork.toml");

    assert_eq!(result.summary.key_matches, 0);
    assert_eq!(result.summary.unknown, 0);
    // Alice -> Alicia clears 70 here; Dave never does.
    assert_eq!(result.summary.fuzzy_matches, 3);
    assert_eq!(
        result.quilt.columns,
        vec![
            "id_left",
            "name_left",
            "city_left",
            "id_right",
            "name_right",
            "city_right",
            "fuzzy_score",
            "marriage_type",
            "patch_id",
        ]
    );
    assert_eq!(result.quilt.value(0, "name_right"), &Value::from("Alicia"));
    assert_eq!(result.quilt.value(0, "patch_id"), &Value::Int(1));
}

#[test]
fn key_presence_labels_orphans_as_key_match() {
    let result = load_and_run("key-presence.patchwork.toml");
    assert_eq!(result.summary.total_rows, 6);
    assert_eq!(result.summary.key_matches, 6);
    assert_eq!(result.summary.unknown, 0);
    assert_eq!(result.summary.fuzzy_matches, 0);
    assert!(result.summary.mean_fuzzy_score.is_none());
}

#[test]
fn missing_fuzzy_field_fails_run() {
    let config = load_config("missing-column.patchwork.toml");
    let input = load_input(&config);
    let err = run(&config, &input).unwrap_err();
    assert!(matches!(err, ReconError::MissingColumn { ref column, .. } if column == "email"));
    assert!(err.is_config());
}

#[test]
fn out_of_range_threshold_rejected_at_load() {
    let toml = r#"
name = "Bad threshold"

[left]
file = "left.csv"

[right]
file = "right.csv"

[matching]
fuzzy_fields = ["name"]
threshold = 150
"#;
    let err = PatchworkConfig::from_toml(toml).unwrap_err();
    assert!(matches!(err, ReconError::InvalidThreshold(t) if t == 150.0));
}

// -------------------------------------------------------------------------
// Output
// -------------------------------------------------------------------------

#[test]
fn quilt_csv_reloads() {
    let result = load_and_run("customers.patchwork.toml");
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("quilt.csv");

    write_csv_file(&path, &result.quilt).unwrap();
    let reloaded = load_csv_file(&path, b',').unwrap();

    assert_eq!(reloaded.columns, result.quilt.columns);
    assert_eq!(reloaded.len(), 8);
    assert_eq!(reloaded.value(7, "patch_id"), &Value::Int(8));
    assert_eq!(reloaded.value(6, "fuzzy_score"), &Value::Float(75.0));
    assert_eq!(reloaded.value(2, "marriage_type"), &Value::from("Unknown"));
}

#[test]
fn result_json_shape() {
    let result = load_and_run("customers.patchwork.toml");
    let json: serde_json::Value = serde_json::from_str(&result.to_json_pretty().unwrap()).unwrap();

    assert_eq!(json["meta"]["config_name"], "Customer merge");
    assert!(json["meta"]["run_at"].as_str().is_some());
    assert_eq!(json["summary"]["total_rows"], 8);
    assert_eq!(json["quilt"]["columns"][0], "id");
    assert_eq!(json["quilt"]["rows"][0]["marriage_type"], "KeyMatch");
    assert_eq!(json["quilt"]["rows"][0]["fuzzy_score"], serde_json::Value::Null);
    assert_eq!(json["quilt"]["rows"][6]["patch_id"], 7);
}
