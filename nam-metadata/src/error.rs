//! Error types for training metadata

use std::fmt;
use thiserror::Error;

/// Common result type for metadata operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced while constructing, decoding or persisting training metadata
#[derive(Error, Debug)]
pub enum Error {
    /// One or more fields are missing, mistyped or out of range
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Input is not a structured mapping at all
    #[error("Decode error: {0}")]
    Decode(String),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encoding error (wraps serde_json::Error)
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Why a single field failed validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViolationKind {
    /// Required field absent
    Missing,

    /// Field present with the wrong JSON type
    WrongType {
        expected: &'static str,
        found: &'static str,
    },

    /// Field has the right type but an unacceptable value
    OutOfRange(String),

    /// Field not part of the schema (strict decoding only)
    Unrecognized,
}

impl fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ViolationKind::Missing => write!(f, "missing required field"),
            ViolationKind::WrongType { expected, found } => {
                write!(f, "expected {}, found {}", expected, found)
            }
            ViolationKind::OutOfRange(reason) => write!(f, "{}", reason),
            ViolationKind::Unrecognized => write!(f, "unrecognized field"),
        }
    }
}

/// A failed field, addressed by its dotted path from the record root
/// (e.g. `data.latency.calibration.delays[2]`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldViolation {
    pub path: String,
    pub kind: ViolationKind,
}

impl fmt::Display for FieldViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.kind)
    }
}

/// Every field that failed during one construction or decode
///
/// Never empty: a `ValidationError` is only produced when at least one
/// violation was recorded.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{count} invalid field(s): {list}", count = .violations.len(), list = join_violations(.violations))]
pub struct ValidationError {
    violations: Vec<FieldViolation>,
}

impl ValidationError {
    pub(crate) fn new(violations: Vec<FieldViolation>) -> Self {
        debug_assert!(!violations.is_empty());
        Self { violations }
    }

    /// All violations in the order they were detected
    pub fn violations(&self) -> &[FieldViolation] {
        &self.violations
    }

    /// Paths of all offending fields
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.violations.iter().map(|v| v.path.as_str())
    }

    /// Whether `path` is among the offending fields
    pub fn contains(&self, path: &str) -> bool {
        self.paths().any(|p| p == path)
    }

    /// Violation recorded for `path`, if any
    pub fn kind_of(&self, path: &str) -> Option<&ViolationKind> {
        self.violations
            .iter()
            .find(|v| v.path == path)
            .map(|v| &v.kind)
    }

    pub fn into_violations(self) -> Vec<FieldViolation> {
        self.violations
    }
}

fn join_violations(violations: &[FieldViolation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
