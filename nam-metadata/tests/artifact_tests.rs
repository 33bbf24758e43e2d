//! Integration tests for artifact file access
//!
//! Tests cover:
//! - Loading and saving `.nam` documents
//! - Atomic write (no temp file left behind)
//! - Preservation of unrelated sections and metadata keys
//! - Unknown provenance when the training key is absent

use nam_metadata::{
    Artifact, Data, DataChecks, Error, Latency, LatencyCalibration, LatencyCalibrationWarnings,
    Settings, TrainingMetadata, TRAINING_KEY,
};
use serde_json::{json, Value};
use tempfile::TempDir;

fn record() -> TrainingMetadata {
    TrainingMetadata::new(
        Settings::new(true, false),
        Data::new(
            Latency::new(
                None,
                LatencyCalibration::new(
                    1,
                    vec![12, 13, 12],
                    2,
                    10,
                    LatencyCalibrationWarnings::new(false, false),
                ),
            ),
            DataChecks::new(1, true),
        ),
        Some(0.0021),
    )
    .unwrap()
}

fn artifact_json() -> Value {
    json!({
        "version": "0.5.2",
        "architecture": "WaveNet",
        "config": {"layers": [{"channels": 16}]},
        "metadata": {
            "date": {"year": 2024, "month": 5, "day": 19},
            "loudness": -18.5
        },
        "weights": [0.25, -0.5, 1.0]
    })
}

fn write_artifact(dir: &TempDir, value: &Value) -> std::path::PathBuf {
    let path = dir.path().join("model.nam");
    std::fs::write(&path, value.to_string()).unwrap();
    path
}

#[test]
fn test_load_artifact_without_training_record() {
    let dir = TempDir::new().unwrap();
    let path = write_artifact(&dir, &artifact_json());

    let artifact = Artifact::load(&path).unwrap();
    assert!(artifact.training_metadata().unwrap().is_none());
    assert_eq!(artifact.get("loudness"), Some(&json!(-18.5)));
}

#[test]
fn test_attach_and_reload() {
    let dir = TempDir::new().unwrap();
    let path = write_artifact(&dir, &artifact_json());

    let mut artifact = Artifact::load(&path).unwrap();
    artifact.set_training_metadata(&record()).unwrap();
    artifact.save(&path).unwrap();

    let reloaded = Artifact::load(&path).unwrap();
    assert_eq!(reloaded.training_metadata().unwrap(), Some(record()));

    // Everything else survives
    assert_eq!(reloaded.section("weights"), Some(&json!([0.25, -0.5, 1.0])));
    assert_eq!(reloaded.section("architecture"), Some(&json!("WaveNet")));
    assert_eq!(reloaded.get("loudness"), Some(&json!(-18.5)));
    assert!(reloaded.get("date").is_some());

    let raw: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(
        raw["metadata"][TRAINING_KEY]["data"]["latency"]["calibration"]["delays"],
        json!([12, 13, 12])
    );
}

#[test]
fn test_save_leaves_no_temp_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("fresh.nam");

    let mut artifact = Artifact::new();
    artifact.set_training_metadata(&record()).unwrap();
    artifact.save(&path).unwrap();

    assert!(path.exists());
    assert!(!dir.path().join("fresh.nam.tmp").exists());
}

#[test]
fn test_load_missing_file_is_io_error() {
    let dir = TempDir::new().unwrap();
    let err = Artifact::load(dir.path().join("absent.nam")).unwrap_err();
    assert!(matches!(err, Error::Io(_)));
}

#[test]
fn test_load_malformed_file_is_decode_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("broken.nam");
    std::fs::write(&path, "[1, 2, 3]").unwrap();
    assert!(matches!(Artifact::load(&path).unwrap_err(), Error::Decode(_)));
}

#[test]
fn test_replacing_record_keeps_single_key() {
    let mut artifact = Artifact::from_value(artifact_json()).unwrap();
    artifact.set_training_metadata(&record()).unwrap();

    let (settings, data, _) = record().into_parts();
    let replacement = TrainingMetadata::new(settings, data, None).unwrap();
    artifact.set_training_metadata(&replacement).unwrap();

    assert_eq!(artifact.training_metadata().unwrap(), Some(replacement));
    assert_eq!(artifact.metadata().unwrap().len(), 3);
}

#[test]
fn test_save_reproduces_weights_bit_exact() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("weights.nam");
    let weights: [f64; _] = [
        5.204792265355981e-8,
        0.1,
        -0.30000000000000004,
        1.7976931348623157e308,
        2.2250738585072014e-308,
        -8.881784197001252e-16,
    ];
    let text = format!(
        r#"{{"weights": [{}], "metadata": {{}}}}"#,
        weights
            .iter()
            .map(|w| format!("{:?}", w))
            .collect::<Vec<_>>()
            .join(", ")
    );
    std::fs::write(&path, text).unwrap();

    let mut artifact = Artifact::load(&path).unwrap();
    artifact.set_training_metadata(&record()).unwrap();
    artifact.save(&path).unwrap();

    let reloaded = Artifact::load(&path).unwrap();
    let saved: Vec<u64> = reloaded
        .section("weights")
        .unwrap()
        .as_array()
        .unwrap()
        .iter()
        .map(|w| w.as_f64().unwrap().to_bits())
        .collect();
    let expected: Vec<u64> = weights.iter().map(|w| w.to_bits()).collect();
    assert_eq!(saved, expected);
}

#[test]
fn test_save_preserves_key_order() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("ordered.nam");
    std::fs::write(
        &path,
        r#"{"version": "0.5.2", "metadata": {"name": "amp", "date": {}}, "architecture": "WaveNet", "weights": []}"#,
    )
    .unwrap();

    let mut artifact = Artifact::load(&path).unwrap();
    artifact.set_training_metadata(&record()).unwrap();
    artifact.save(&path).unwrap();

    let reloaded = Artifact::load(&path).unwrap();
    let top: Vec<_> = reloaded
        .clone()
        .into_value()
        .as_object()
        .unwrap()
        .keys()
        .cloned()
        .collect();
    assert_eq!(top, vec!["version", "metadata", "architecture", "weights"]);

    let meta: Vec<_> = reloaded.metadata().unwrap().keys().cloned().collect();
    assert_eq!(meta, vec!["name", "date", TRAINING_KEY]);
}
