//! # NAM Training Metadata
//!
//! Provenance record attached to artifacts produced by the simplified
//! trainers:
//! - Data model (settings, latency calibration, data checks, validation ESR)
//! - Builders that report every invalid field at once
//! - JSON representation stored under [`TRAINING_KEY`]
//! - Key-value access to an artifact's metadata map
//! - Inspection tool configuration

pub mod artifact;
pub mod builder;
pub mod codec;
pub mod config;
pub mod error;
pub mod model;
mod schema;

pub use artifact::Artifact;
pub use builder::{
    DataBuilder, DataChecksBuilder, LatencyBuilder, LatencyCalibrationBuilder,
    LatencyCalibrationWarningsBuilder, SettingsBuilder, TrainingMetadataBuilder,
};
pub use codec::{decode, DecodeOptions, Decoded, UnrecognizedField, TRAINING_KEY};
pub use error::{Error, FieldViolation, Result, ValidationError, ViolationKind};
pub use model::{
    Data, DataChecks, Latency, LatencyCalibration, LatencyCalibrationWarnings, Settings,
    TrainingMetadata,
};
