//! Training metadata data model
//!
//! Immutable value types describing how a trained artifact was produced:
//! user settings, latency calibration evidence, data checks and the final
//! validation score. Types are assembled bottom-up (leaves first) and never
//! mutated after construction.
//!
//! Field names are the wire names; see [`crate::codec`] for the persisted
//! representation.

use serde::Serialize;

use crate::error::ValidationError;
use crate::schema::Violations;

/// User-provided training settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Settings {
    /// Whether a cabinet was fit along with the amp
    pub fit_cab: bool,
    /// Whether the user chose to train despite failed data checks
    pub ignore_checks: bool,
}

impl Settings {
    pub fn new(fit_cab: bool, ignore_checks: bool) -> Self {
        Self {
            fit_cab,
            ignore_checks,
        }
    }
}

/// Things that aren't necessarily wrong with a latency calibration but are
/// worth looking into
///
/// Purely informational: neither flag affects the validity of the record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct LatencyCalibrationWarnings {
    /// The calibrated latency is as far forward as possible: the very first
    /// sample looked at tripped the trigger, so the trigger is probably too
    /// sensitive.
    pub matches_lookahead: bool,
    /// The spread between individual delay estimates was large enough that
    /// something may have gone wrong.
    pub disagreement_too_high: bool,
}

impl LatencyCalibrationWarnings {
    pub fn new(matches_lookahead: bool, disagreement_too_high: bool) -> Self {
        Self {
            matches_lookahead,
            disagreement_too_high,
        }
    }

    /// Whether any warning is raised
    pub fn any(&self) -> bool {
        self.matches_lookahead || self.disagreement_too_high
    }
}

/// Raw evidence and recommendation from one latency calibration run
///
/// `recommended` is stored exactly as the calibration algorithm reported it.
/// It is not checked against `delays` and `safety_factor`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct LatencyCalibration {
    pub algorithm_version: u32,
    /// Per-attempt delay estimates in samples, in measurement order.
    /// Empty when no calibration attempt was made.
    pub delays: Vec<i64>,
    /// Margin (samples) applied to the raw estimate
    pub safety_factor: i64,
    /// Recommended latency in samples
    pub recommended: i64,
    pub warnings: LatencyCalibrationWarnings,
}

impl LatencyCalibration {
    pub fn new(
        algorithm_version: u32,
        delays: Vec<i64>,
        safety_factor: i64,
        recommended: i64,
        warnings: LatencyCalibrationWarnings,
    ) -> Self {
        Self {
            algorithm_version,
            delays,
            safety_factor,
            recommended,
            warnings,
        }
    }

    /// Number of calibration attempts recorded
    pub fn attempts(&self) -> usize {
        self.delays.len()
    }
}

/// Final latency decision with its calibration trail
///
/// The calibration is kept even when a manual override is present.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Latency {
    /// User override in samples
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manual: Option<i64>,
    pub calibration: LatencyCalibration,
}

impl Latency {
    pub fn new(manual: Option<i64>, calibration: LatencyCalibration) -> Self {
        Self {
            manual,
            calibration,
        }
    }

    /// Latency the artifact was trained with: the manual override if set,
    /// otherwise the calibration's recommendation
    pub fn effective(&self) -> i64 {
        self.manual.unwrap_or(self.calibration.recommended)
    }

    pub fn is_overridden(&self) -> bool {
        self.manual.is_some()
    }
}

/// Outcome of the data-quality checks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct DataChecks {
    /// Version of the checks logic (independent of the calibration
    /// algorithm version)
    pub version: u32,
    pub passed: bool,
}

impl DataChecks {
    pub fn new(version: u32, passed: bool) -> Self {
        Self { version, passed }
    }
}

/// Everything gathered about the training data during a run
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Data {
    pub latency: Latency,
    pub checks: DataChecks,
}

impl Data {
    pub fn new(latency: Latency, checks: DataChecks) -> Self {
        Self { latency, checks }
    }
}

/// Root record describing how an artifact was trained
///
/// Fields are private so that `validation_esr` can only hold a finite,
/// non-negative score.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrainingMetadata {
    settings: Settings,
    data: Data,
    #[serde(skip_serializing_if = "Option::is_none")]
    validation_esr: Option<f64>,
}

impl TrainingMetadata {
    /// Assemble a record, rejecting a negative or non-finite ESR
    pub fn new(
        settings: Settings,
        data: Data,
        validation_esr: Option<f64>,
    ) -> Result<Self, ValidationError> {
        let mut violations = Violations::new();
        check_esr(&mut violations, "validation_esr", validation_esr);
        violations.finish()?;
        Ok(Self::from_parts(settings, data, validation_esr))
    }

    /// Caller guarantees the ESR was checked with [`check_esr`]
    pub(crate) fn from_parts(settings: Settings, data: Data, validation_esr: Option<f64>) -> Self {
        Self {
            settings,
            data,
            validation_esr,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn data(&self) -> &Data {
        &self.data
    }

    /// Error-to-signal ratio on held-out data; `None` when validation was
    /// not run. Lower is better.
    pub fn validation_esr(&self) -> Option<f64> {
        self.validation_esr
    }

    /// Shorthand for `data().latency.effective()`
    pub fn effective_latency(&self) -> i64 {
        self.data.latency.effective()
    }

    pub fn into_parts(self) -> (Settings, Data, Option<f64>) {
        (self.settings, self.data, self.validation_esr)
    }
}

/// Record a violation if an ESR is present but negative or non-finite
pub(crate) fn check_esr(violations: &mut Violations, path: &str, esr: Option<f64>) {
    match esr {
        Some(v) if !v.is_finite() => {
            violations.out_of_range(path, format!("ESR must be finite, got {}", v))
        }
        Some(v) if v < 0.0 => {
            violations.out_of_range(path, format!("ESR must be non-negative, got {}", v))
        }
        _ => {}
    }
}
