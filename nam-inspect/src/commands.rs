//! Inspection commands
//!
//! Each command reads an artifact and writes its report to any
//! `io::Write`, returning an [`Outcome`] that maps to the exit status.

use anyhow::{Context, Result};
use nam_metadata::config::InspectConfig;
use nam_metadata::{decode, Artifact, DecodeOptions, Decoded, Error, TrainingMetadata, TRAINING_KEY};
use serde_json::Value;
use std::io::Write;
use std::path::Path;
use tracing::{info, warn};

/// How a command finished
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Record present and valid (or written)
    Success,
    /// Record present but invalid
    Invalid,
    /// Artifact has no training record
    Unknown,
}

/// Exit status for failures outside the record itself (config, I/O)
pub const EXIT_ERROR: i32 = 1;

impl Outcome {
    pub fn exit_code(self) -> i32 {
        match self {
            Outcome::Success => 0,
            Outcome::Invalid => 1,
            Outcome::Unknown => 2,
        }
    }
}

fn decode_options(config: &InspectConfig) -> DecodeOptions {
    DecodeOptions {
        deny_unrecognized: config.strict,
    }
}

fn write_json(out: &mut impl Write, value: &Value, pretty: bool) -> Result<()> {
    let text = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    writeln!(out, "{}", text)?;
    Ok(())
}

fn write_unknown(out: &mut impl Write) -> Result<()> {
    writeln!(
        out,
        "No training metadata (key '{}' absent or null); provenance unknown",
        TRAINING_KEY
    )?;
    Ok(())
}

fn decode_record(value: &Value, config: &InspectConfig) -> nam_metadata::Result<Decoded> {
    let decoded = decode(value, decode_options(config))?;
    for field in &decoded.unrecognized {
        warn!("Unrecognized field '{}' in training metadata", field.path);
    }
    Ok(decoded)
}

/// Print the training record as JSON
pub fn show(artifact: &Artifact, config: &InspectConfig, out: &mut impl Write) -> Result<Outcome> {
    let Some(raw) = artifact.training_record() else {
        write_unknown(out)?;
        return Ok(Outcome::Unknown);
    };

    let decoded = decode_record(raw, config).context("Failed to decode training metadata")?;
    write_json(out, &decoded.metadata.to_value()?, config.pretty)?;
    Ok(Outcome::Success)
}

/// Validate the training record, listing every violation
pub fn check(artifact: &Artifact, config: &InspectConfig, out: &mut impl Write) -> Result<Outcome> {
    let Some(raw) = artifact.training_record() else {
        write_unknown(out)?;
        return Ok(Outcome::Unknown);
    };

    match decode_record(raw, config) {
        Ok(decoded) => {
            writeln!(out, "OK: training metadata is valid")?;
            for field in &decoded.unrecognized {
                writeln!(out, "  note: unrecognized field '{}'", field.path)?;
            }
            Ok(Outcome::Success)
        }
        Err(Error::Validation(e)) => {
            writeln!(out, "INVALID: {} field(s) failed", e.violations().len())?;
            for violation in e.violations() {
                writeln!(out, "  {}", violation)?;
            }
            Ok(Outcome::Invalid)
        }
        Err(Error::Decode(message)) => {
            writeln!(out, "INVALID: {}", message)?;
            Ok(Outcome::Invalid)
        }
        Err(e) => Err(e.into()),
    }
}

/// Human-readable digest of the training record
pub fn summary(artifact: &Artifact, config: &InspectConfig, out: &mut impl Write) -> Result<Outcome> {
    let Some(raw) = artifact.training_record() else {
        write_unknown(out)?;
        return Ok(Outcome::Unknown);
    };

    let metadata = decode_record(raw, config)
        .context("Failed to decode training metadata")?
        .metadata;
    write_summary(&metadata, out)?;
    Ok(Outcome::Success)
}

fn write_summary(metadata: &TrainingMetadata, out: &mut impl Write) -> Result<()> {
    let settings = metadata.settings();
    let latency = &metadata.data().latency;
    let calibration = &latency.calibration;
    let checks = &metadata.data().checks;

    writeln!(out, "Settings:")?;
    writeln!(out, "  fit_cab:        {}", settings.fit_cab)?;
    writeln!(out, "  ignore_checks:  {}", settings.ignore_checks)?;

    writeln!(out, "Latency:")?;
    match latency.manual {
        Some(manual) => {
            writeln!(
                out,
                "  effective:      {} samples (manual; calibration recommended {})",
                manual, calibration.recommended
            )?;
            if calibration.warnings.any() {
                warn!("Latency was set manually but calibration raised warnings");
            }
        }
        None => writeln!(out, "  effective:      {} samples (calibrated)", calibration.recommended)?,
    }
    writeln!(
        out,
        "  calibration:    algorithm v{}, {} attempt(s) {:?}, safety factor {}",
        calibration.algorithm_version,
        calibration.attempts(),
        calibration.delays,
        calibration.safety_factor
    )?;

    let mut raised = Vec::new();
    if calibration.warnings.matches_lookahead {
        raised.push("matches lookahead");
    }
    if calibration.warnings.disagreement_too_high {
        raised.push("disagreement too high");
    }
    if raised.is_empty() {
        writeln!(out, "  warnings:       none")?;
    } else {
        writeln!(out, "  warnings:       {}", raised.join(", "))?;
    }

    writeln!(
        out,
        "Data checks:      {} (version {})",
        if checks.passed { "passed" } else { "failed" },
        checks.version
    )?;
    match metadata.validation_esr() {
        Some(esr) => writeln!(out, "Validation ESR:   {}", esr)?,
        None => writeln!(out, "Validation ESR:   not evaluated")?,
    }
    Ok(())
}

/// Validate a record file and embed it in the artifact under the training key
pub fn attach(
    artifact_path: &Path,
    record_path: &Path,
    config: &InspectConfig,
    out: &mut impl Write,
) -> Result<Outcome> {
    let text = std::fs::read_to_string(record_path)
        .with_context(|| format!("Failed to read {}", record_path.display()))?;
    let value: Value = serde_json::from_str(&text)
        .with_context(|| format!("{} is not valid JSON", record_path.display()))?;

    let metadata = match decode_record(&value, config) {
        Ok(decoded) => decoded.metadata,
        Err(Error::Validation(e)) => {
            writeln!(out, "INVALID: record not attached")?;
            for violation in e.violations() {
                writeln!(out, "  {}", violation)?;
            }
            return Ok(Outcome::Invalid);
        }
        Err(Error::Decode(message)) => {
            writeln!(out, "INVALID: record not attached: {}", message)?;
            return Ok(Outcome::Invalid);
        }
        Err(e) => return Err(e.into()),
    };

    let mut artifact = Artifact::load(artifact_path)
        .with_context(|| format!("Failed to load {}", artifact_path.display()))?;
    artifact.set_training_metadata(&metadata)?;
    artifact.save(artifact_path)?;

    info!("Attached training metadata to {}", artifact_path.display());
    writeln!(out, "Attached training metadata to {}", artifact_path.display())?;
    Ok(Outcome::Success)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record_value() -> Value {
        json!({
            "settings": {"fit_cab": false, "ignore_checks": true},
            "data": {
                "latency": {
                    "manual": 20,
                    "calibration": {
                        "algorithm_version": 1,
                        "delays": [],
                        "safety_factor": 2,
                        "recommended": 10,
                        "warnings": {"matches_lookahead": true, "disagreement_too_high": true}
                    }
                },
                "checks": {"version": 2, "passed": false}
            }
        })
    }

    fn artifact_with(record: Value) -> Artifact {
        let mut artifact = Artifact::new();
        artifact.set(TRAINING_KEY, record);
        artifact
    }

    type Command = fn(&Artifact, &InspectConfig, &mut Vec<u8>) -> Result<Outcome>;

    fn run(command: Command, artifact: &Artifact) -> (Outcome, String) {
        let mut out = Vec::new();
        let outcome = command(artifact, &InspectConfig::default(), &mut out).unwrap();
        (outcome, String::from_utf8(out).unwrap())
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(Outcome::Success.exit_code(), 0);
        assert_eq!(Outcome::Invalid.exit_code(), 1);
        assert_eq!(Outcome::Unknown.exit_code(), 2);
        assert_ne!(EXIT_ERROR, Outcome::Unknown.exit_code());
    }

    #[test]
    fn test_summary_manual_override_and_warnings() {
        let (outcome, text) = run(summary, &artifact_with(record_value()));
        assert_eq!(outcome, Outcome::Success);
        assert!(text.contains("20 samples (manual; calibration recommended 10)"));
        assert!(text.contains("0 attempt(s) []"));
        assert!(text.contains("matches lookahead, disagreement too high"));
        assert!(text.contains("failed (version 2)"));
        assert!(text.contains("not evaluated"));
    }

    #[test]
    fn test_check_lists_violations() {
        let mut record = record_value();
        record["data"]["checks"]["passed"] = json!("yes");
        record["settings"] = json!({});

        let (outcome, text) = run(check, &artifact_with(record));
        assert_eq!(outcome, Outcome::Invalid);
        assert!(text.contains("INVALID: 3 field(s) failed"));
        assert!(text.contains("settings.fit_cab: missing required field"));
        assert!(text.contains("data.checks.passed: expected boolean, found string"));
    }

    #[test]
    fn test_show_omits_absent_optionals() {
        let (outcome, text) = run(show, &artifact_with(record_value()));
        assert_eq!(outcome, Outcome::Success);
        let printed: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(printed, record_value());
    }

    #[test]
    fn test_unknown_when_key_absent() {
        let commands: [Command; 3] = [show, check, summary];
        for command in commands {
            let (outcome, text) = run(command, &Artifact::new());
            assert_eq!(outcome, Outcome::Unknown);
            assert!(text.contains("provenance unknown"));
        }
    }

    #[test]
    fn test_unknown_when_key_null() {
        let commands: [Command; 3] = [show, check, summary];
        for command in commands {
            let (outcome, text) = run(command, &artifact_with(Value::Null));
            assert_eq!(outcome, Outcome::Unknown);
            assert!(text.contains("provenance unknown"));
        }
    }

    #[test]
    fn test_strict_check_flags_unrecognized() {
        let mut record = record_value();
        record["data"]["extra"] = json!(1);
        let artifact = artifact_with(record);

        let (outcome, text) = run(check, &artifact);
        assert_eq!(outcome, Outcome::Success);
        assert!(text.contains("note: unrecognized field 'data.extra'"));

        let strict = InspectConfig {
            strict: true,
            ..InspectConfig::default()
        };
        let mut out = Vec::new();
        let outcome = check(&artifact, &strict, &mut out).unwrap();
        assert_eq!(outcome, Outcome::Invalid);
        assert!(String::from_utf8(out).unwrap().contains("data.extra: unrecognized field"));
    }
}
