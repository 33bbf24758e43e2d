//! Persisted representation of training metadata
//!
//! The record is stored as a nested JSON mapping under [`TRAINING_KEY`] in
//! an artifact's metadata map. Field names are kept verbatim and optional
//! fields are omitted when absent. On input an explicit `null` for an
//! optional field reads as absent.

use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{Error, Result, ViolationKind};
use crate::model::{
    check_esr, Data, DataChecks, Latency, LatencyCalibration, LatencyCalibrationWarnings,
    Settings, TrainingMetadata,
};
use crate::schema::{type_name, Reader};

/// Key under which the record is saved in an artifact's metadata map
pub const TRAINING_KEY: &str = "training";

const ROOT_FIELDS: &[&str] = &["settings", "data", "validation_esr"];
const SETTINGS_FIELDS: &[&str] = &["fit_cab", "ignore_checks"];
const DATA_FIELDS: &[&str] = &["latency", "checks"];
const LATENCY_FIELDS: &[&str] = &["manual", "calibration"];
const CALIBRATION_FIELDS: &[&str] = &[
    "algorithm_version",
    "delays",
    "safety_factor",
    "recommended",
    "warnings",
];
const WARNINGS_FIELDS: &[&str] = &["matches_lookahead", "disagreement_too_high"];
const CHECKS_FIELDS: &[&str] = &["version", "passed"];

/// A field present in the input but not part of the schema
#[derive(Debug, Clone, PartialEq)]
pub struct UnrecognizedField {
    /// Dotted path from the record root
    pub path: String,
    pub value: Value,
}

/// Decoding behaviour
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecodeOptions {
    /// Report unrecognized fields as violations instead of returning them
    pub deny_unrecognized: bool,
}

impl DecodeOptions {
    pub fn strict() -> Self {
        Self {
            deny_unrecognized: true,
        }
    }
}

/// Result of a successful decode
#[derive(Debug, Clone, PartialEq)]
pub struct Decoded {
    pub metadata: TrainingMetadata,
    /// Extra fields found in the input, kept for inspection
    pub unrecognized: Vec<UnrecognizedField>,
}

impl TrainingMetadata {
    /// Canonical nested mapping for embedding under [`TRAINING_KEY`]
    pub fn to_value(&self) -> Result<Value> {
        let value = serde_json::to_value(self)?;
        debug!("Serialized training metadata");
        Ok(value)
    }

    /// Compact JSON text of [`to_value`](Self::to_value)
    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Rebuild a record, logging (not failing on) unrecognized fields
    pub fn from_value(value: &Value) -> Result<Self> {
        let decoded = decode(value, DecodeOptions::default())?;
        for field in &decoded.unrecognized {
            warn!("Ignoring unrecognized training metadata field '{}'", field.path);
        }
        Ok(decoded.metadata)
    }

    /// Parse JSON text and rebuild a record
    pub fn from_json_str(text: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(text)
            .map_err(|e| Error::Decode(format!("training metadata is not valid JSON: {}", e)))?;
        Self::from_value(&value)
    }
}

impl<'de> Deserialize<'de> for TrainingMetadata {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        TrainingMetadata::from_value(&value).map_err(serde::de::Error::custom)
    }
}

/// Decode a record from its structured representation
///
/// Fails with [`Error::Decode`] if `value` is not a JSON object, otherwise
/// with [`Error::Validation`] listing every missing or mistyped field.
pub fn decode(value: &Value, options: DecodeOptions) -> Result<Decoded> {
    if !value.is_object() {
        return Err(Error::Decode(format!(
            "training metadata must be a JSON object, found {}",
            type_name(value)
        )));
    }

    let mut reader = Reader::new();
    let metadata = read_training_metadata(&mut reader, value);

    let Reader {
        mut violations,
        unrecognized,
    } = reader;

    if options.deny_unrecognized {
        for field in &unrecognized {
            violations.push(field.path.clone(), ViolationKind::Unrecognized);
        }
    }

    match metadata {
        Some(metadata) if violations.is_empty() => {
            debug!(
                unrecognized = unrecognized.len(),
                "Decoded training metadata"
            );
            Ok(Decoded {
                metadata,
                unrecognized,
            })
        }
        _ => Err(violations.into_error().into()),
    }
}

fn read_training_metadata(reader: &mut Reader, value: &Value) -> Option<TrainingMetadata> {
    let fields = reader.object("", value, ROOT_FIELDS)?;

    let settings = reader
        .required(&fields, "settings")
        .and_then(|v| read_settings(reader, &fields.path_of("settings"), v));
    let data = reader
        .required(&fields, "data")
        .and_then(|v| read_data(reader, &fields.path_of("data"), v));
    let validation_esr = reader.optional_f64(&fields, "validation_esr").ok()?;
    check_esr(&mut reader.violations, "validation_esr", validation_esr);

    Some(TrainingMetadata::from_parts(settings?, data?, validation_esr))
}

fn read_settings(reader: &mut Reader, path: &str, value: &Value) -> Option<Settings> {
    let fields = reader.object(path, value, SETTINGS_FIELDS)?;
    let fit_cab = reader.required_bool(&fields, "fit_cab");
    let ignore_checks = reader.required_bool(&fields, "ignore_checks");
    Some(Settings::new(fit_cab?, ignore_checks?))
}

fn read_data(reader: &mut Reader, path: &str, value: &Value) -> Option<Data> {
    let fields = reader.object(path, value, DATA_FIELDS)?;
    let latency = reader
        .required(&fields, "latency")
        .and_then(|v| read_latency(reader, &fields.path_of("latency"), v));
    let checks = reader
        .required(&fields, "checks")
        .and_then(|v| read_checks(reader, &fields.path_of("checks"), v));
    Some(Data::new(latency?, checks?))
}

fn read_latency(reader: &mut Reader, path: &str, value: &Value) -> Option<Latency> {
    let fields = reader.object(path, value, LATENCY_FIELDS)?;
    let manual = reader.optional_i64(&fields, "manual");
    let calibration = reader
        .required(&fields, "calibration")
        .and_then(|v| read_calibration(reader, &fields.path_of("calibration"), v));
    Some(Latency::new(manual.ok()?, calibration?))
}

fn read_calibration(reader: &mut Reader, path: &str, value: &Value) -> Option<LatencyCalibration> {
    let fields = reader.object(path, value, CALIBRATION_FIELDS)?;
    let algorithm_version = reader.required_u32(&fields, "algorithm_version");
    let delays = reader.required_i64_list(&fields, "delays");
    let safety_factor = reader.required_i64(&fields, "safety_factor");
    let recommended = reader.required_i64(&fields, "recommended");
    let warnings = reader
        .required(&fields, "warnings")
        .and_then(|v| read_warnings(reader, &fields.path_of("warnings"), v));
    Some(LatencyCalibration::new(
        algorithm_version?,
        delays?,
        safety_factor?,
        recommended?,
        warnings?,
    ))
}

fn read_warnings(
    reader: &mut Reader,
    path: &str,
    value: &Value,
) -> Option<LatencyCalibrationWarnings> {
    let fields = reader.object(path, value, WARNINGS_FIELDS)?;
    let matches_lookahead = reader.required_bool(&fields, "matches_lookahead");
    let disagreement_too_high = reader.required_bool(&fields, "disagreement_too_high");
    Some(LatencyCalibrationWarnings::new(
        matches_lookahead?,
        disagreement_too_high?,
    ))
}

fn read_checks(reader: &mut Reader, path: &str, value: &Value) -> Option<DataChecks> {
    let fields = reader.object(path, value, CHECKS_FIELDS)?;
    let version = reader.required_u32(&fields, "version");
    let passed = reader.required_bool(&fields, "passed");
    Some(DataChecks::new(version?, passed?))
}
