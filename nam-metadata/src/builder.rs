//! Field-by-name construction with aggregate validation
//!
//! Each builder collects named fields and reports every missing or invalid
//! one in a single [`ValidationError`]. Nested builders can be handed to a
//! parent directly; their violations are reported under the parent's path
//! (e.g. `data.latency.calibration.recommended`).
//!
//! ```
//! use nam_metadata::{
//!     DataBuilder, DataChecks, LatencyBuilder, LatencyCalibrationBuilder,
//!     LatencyCalibrationWarnings, Settings, TrainingMetadata,
//! };
//!
//! let calibration = LatencyCalibrationBuilder::new()
//!     .algorithm_version(1)
//!     .delays(vec![12, 13, 12])
//!     .safety_factor(2)
//!     .recommended(10)
//!     .warnings(LatencyCalibrationWarnings::new(false, false));
//!
//! let metadata = TrainingMetadata::builder()
//!     .settings(Settings::new(true, false))
//!     .data_with(
//!         DataBuilder::new()
//!             .latency_with(LatencyBuilder::new().calibration_with(calibration))
//!             .checks(DataChecks::new(1, true)),
//!     )
//!     .validation_esr(0.0021)
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(metadata.effective_latency(), 10);
//! ```

use crate::error::ValidationError;
use crate::model::{
    check_esr, Data, DataChecks, Latency, LatencyCalibration, LatencyCalibrationWarnings,
    Settings, TrainingMetadata,
};
use crate::schema::Violations;

type Slot<T> = Option<Result<T, ValidationError>>;

/// Builder for [`Settings`]
#[derive(Debug, Clone, Default)]
pub struct SettingsBuilder {
    fit_cab: Option<bool>,
    ignore_checks: Option<bool>,
}

impl SettingsBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fit_cab(mut self, value: bool) -> Self {
        self.fit_cab = Some(value);
        self
    }

    pub fn ignore_checks(mut self, value: bool) -> Self {
        self.ignore_checks = Some(value);
        self
    }

    pub fn build(self) -> Result<Settings, ValidationError> {
        let mut violations = Violations::new();
        let fit_cab = violations.require("fit_cab", self.fit_cab);
        let ignore_checks = violations.require("ignore_checks", self.ignore_checks);
        match (fit_cab, ignore_checks) {
            (Some(fit_cab), Some(ignore_checks)) => Ok(Settings::new(fit_cab, ignore_checks)),
            _ => Err(violations.into_error()),
        }
    }
}

/// Builder for [`LatencyCalibrationWarnings`]
#[derive(Debug, Clone, Default)]
pub struct LatencyCalibrationWarningsBuilder {
    matches_lookahead: Option<bool>,
    disagreement_too_high: Option<bool>,
}

impl LatencyCalibrationWarningsBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn matches_lookahead(mut self, value: bool) -> Self {
        self.matches_lookahead = Some(value);
        self
    }

    pub fn disagreement_too_high(mut self, value: bool) -> Self {
        self.disagreement_too_high = Some(value);
        self
    }

    pub fn build(self) -> Result<LatencyCalibrationWarnings, ValidationError> {
        let mut violations = Violations::new();
        let matches_lookahead = violations.require("matches_lookahead", self.matches_lookahead);
        let disagreement_too_high =
            violations.require("disagreement_too_high", self.disagreement_too_high);
        match (matches_lookahead, disagreement_too_high) {
            (Some(a), Some(b)) => Ok(LatencyCalibrationWarnings::new(a, b)),
            _ => Err(violations.into_error()),
        }
    }
}

/// Builder for [`LatencyCalibration`]
///
/// An empty `delays` sequence is valid; an unset one is not.
#[derive(Debug, Clone, Default)]
pub struct LatencyCalibrationBuilder {
    algorithm_version: Option<u32>,
    delays: Option<Vec<i64>>,
    safety_factor: Option<i64>,
    recommended: Option<i64>,
    warnings: Slot<LatencyCalibrationWarnings>,
}

impl LatencyCalibrationBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn algorithm_version(mut self, value: u32) -> Self {
        self.algorithm_version = Some(value);
        self
    }

    pub fn delays(mut self, value: Vec<i64>) -> Self {
        self.delays = Some(value);
        self
    }

    pub fn safety_factor(mut self, value: i64) -> Self {
        self.safety_factor = Some(value);
        self
    }

    pub fn recommended(mut self, value: i64) -> Self {
        self.recommended = Some(value);
        self
    }

    pub fn warnings(mut self, value: LatencyCalibrationWarnings) -> Self {
        self.warnings = Some(Ok(value));
        self
    }

    pub fn warnings_with(mut self, builder: LatencyCalibrationWarningsBuilder) -> Self {
        self.warnings = Some(builder.build());
        self
    }

    pub fn build(self) -> Result<LatencyCalibration, ValidationError> {
        let mut violations = Violations::new();
        let algorithm_version = violations.require("algorithm_version", self.algorithm_version);
        let delays = violations.require("delays", self.delays);
        let safety_factor = violations.require("safety_factor", self.safety_factor);
        let recommended = violations.require("recommended", self.recommended);
        let warnings = violations.nested("warnings", self.warnings);
        match (algorithm_version, delays, safety_factor, recommended, warnings) {
            (
                Some(algorithm_version),
                Some(delays),
                Some(safety_factor),
                Some(recommended),
                Some(warnings),
            ) => Ok(LatencyCalibration::new(
                algorithm_version,
                delays,
                safety_factor,
                recommended,
                warnings,
            )),
            _ => Err(violations.into_error()),
        }
    }
}

/// Builder for [`Latency`]; `manual` may be left unset
#[derive(Debug, Clone, Default)]
pub struct LatencyBuilder {
    manual: Option<i64>,
    calibration: Slot<LatencyCalibration>,
}

impl LatencyBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn manual(mut self, value: i64) -> Self {
        self.manual = Some(value);
        self
    }

    pub fn calibration(mut self, value: LatencyCalibration) -> Self {
        self.calibration = Some(Ok(value));
        self
    }

    pub fn calibration_with(mut self, builder: LatencyCalibrationBuilder) -> Self {
        self.calibration = Some(builder.build());
        self
    }

    pub fn build(self) -> Result<Latency, ValidationError> {
        let mut violations = Violations::new();
        match violations.nested("calibration", self.calibration) {
            Some(calibration) => Ok(Latency::new(self.manual, calibration)),
            None => Err(violations.into_error()),
        }
    }
}

/// Builder for [`DataChecks`]
#[derive(Debug, Clone, Default)]
pub struct DataChecksBuilder {
    version: Option<u32>,
    passed: Option<bool>,
}

impl DataChecksBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn version(mut self, value: u32) -> Self {
        self.version = Some(value);
        self
    }

    pub fn passed(mut self, value: bool) -> Self {
        self.passed = Some(value);
        self
    }

    pub fn build(self) -> Result<DataChecks, ValidationError> {
        let mut violations = Violations::new();
        let version = violations.require("version", self.version);
        let passed = violations.require("passed", self.passed);
        match (version, passed) {
            (Some(version), Some(passed)) => Ok(DataChecks::new(version, passed)),
            _ => Err(violations.into_error()),
        }
    }
}

/// Builder for [`Data`]
#[derive(Debug, Clone, Default)]
pub struct DataBuilder {
    latency: Slot<Latency>,
    checks: Slot<DataChecks>,
}

impl DataBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn latency(mut self, value: Latency) -> Self {
        self.latency = Some(Ok(value));
        self
    }

    pub fn latency_with(mut self, builder: LatencyBuilder) -> Self {
        self.latency = Some(builder.build());
        self
    }

    pub fn checks(mut self, value: DataChecks) -> Self {
        self.checks = Some(Ok(value));
        self
    }

    pub fn checks_with(mut self, builder: DataChecksBuilder) -> Self {
        self.checks = Some(builder.build());
        self
    }

    pub fn build(self) -> Result<Data, ValidationError> {
        let mut violations = Violations::new();
        let latency = violations.nested("latency", self.latency);
        let checks = violations.nested("checks", self.checks);
        match (latency, checks) {
            (Some(latency), Some(checks)) => Ok(Data::new(latency, checks)),
            _ => Err(violations.into_error()),
        }
    }
}

/// Builder for [`TrainingMetadata`]; `validation_esr` may be left unset
#[derive(Debug, Clone, Default)]
pub struct TrainingMetadataBuilder {
    settings: Slot<Settings>,
    data: Slot<Data>,
    validation_esr: Option<f64>,
}

impl TrainingMetadataBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn settings(mut self, value: Settings) -> Self {
        self.settings = Some(Ok(value));
        self
    }

    pub fn settings_with(mut self, builder: SettingsBuilder) -> Self {
        self.settings = Some(builder.build());
        self
    }

    pub fn data(mut self, value: Data) -> Self {
        self.data = Some(Ok(value));
        self
    }

    pub fn data_with(mut self, builder: DataBuilder) -> Self {
        self.data = Some(builder.build());
        self
    }

    pub fn validation_esr(mut self, value: f64) -> Self {
        self.validation_esr = Some(value);
        self
    }

    /// Validate every field and assemble the record
    pub fn build(self) -> Result<TrainingMetadata, ValidationError> {
        let mut violations = Violations::new();
        let settings = violations.nested("settings", self.settings);
        let data = violations.nested("data", self.data);
        check_esr(&mut violations, "validation_esr", self.validation_esr);
        match (settings, data) {
            (Some(settings), Some(data)) if violations.is_empty() => Ok(
                TrainingMetadata::from_parts(settings, data, self.validation_esr),
            ),
            _ => Err(violations.into_error()),
        }
    }
}

impl TrainingMetadata {
    pub fn builder() -> TrainingMetadataBuilder {
        TrainingMetadataBuilder::new()
    }
}
