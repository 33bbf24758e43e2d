//! Schema validation layer
//!
//! Collects field violations with their dotted paths instead of stopping
//! at the first problem, and reads JSON values without implicit coercion:
//! a float is never an integer, a string is never a boolean.

use serde_json::{Map, Value};

use crate::codec::UnrecognizedField;
use crate::error::{FieldViolation, ValidationError, ViolationKind};

const NON_NEGATIVE_INTEGER: &str = "non-negative integer";
const INTEGER: &str = "integer";

/// Join a parent path and a field name (`data` + `checks` → `data.checks`)
pub(crate) fn join_path(parent: &str, field: &str) -> String {
    if parent.is_empty() {
        field.to_string()
    } else if field.starts_with('[') {
        format!("{}{}", parent, field)
    } else {
        format!("{}.{}", parent, field)
    }
}

/// JSON type name used in violation messages
pub(crate) fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_i64() || n.is_u64() => "integer",
        Value::Number(_) => "float",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Accumulator for field violations
#[derive(Debug, Default)]
pub(crate) struct Violations {
    items: Vec<FieldViolation>,
}

impl Violations {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub(crate) fn push(&mut self, path: impl Into<String>, kind: ViolationKind) {
        self.items.push(FieldViolation {
            path: path.into(),
            kind,
        });
    }

    pub(crate) fn missing(&mut self, path: impl Into<String>) {
        self.push(path, ViolationKind::Missing);
    }

    pub(crate) fn wrong_type(&mut self, path: impl Into<String>, expected: &'static str, found: &Value) {
        self.push(
            path,
            ViolationKind::WrongType {
                expected,
                found: type_name(found),
            },
        );
    }

    pub(crate) fn out_of_range(&mut self, path: impl Into<String>, reason: String) {
        self.push(path, ViolationKind::OutOfRange(reason));
    }

    /// Pass a present value through; record `Missing` for an absent one
    pub(crate) fn require<T>(&mut self, path: &str, value: Option<T>) -> Option<T> {
        if value.is_none() {
            self.missing(path);
        }
        value
    }

    /// Like [`require`](Self::require) for a nested entity that may itself
    /// have failed; its violations are re-rooted under `path`
    pub(crate) fn nested<T>(
        &mut self,
        path: &str,
        value: Option<Result<T, ValidationError>>,
    ) -> Option<T> {
        match value {
            None => {
                self.missing(path);
                None
            }
            Some(Ok(v)) => Some(v),
            Some(Err(e)) => {
                for violation in e.into_violations() {
                    self.push(join_path(path, &violation.path), violation.kind);
                }
                None
            }
        }
    }

    /// `Ok` when nothing was recorded
    pub(crate) fn finish(self) -> Result<(), ValidationError> {
        if self.items.is_empty() {
            Ok(())
        } else {
            Err(ValidationError::new(self.items))
        }
    }

    pub(crate) fn into_error(self) -> ValidationError {
        ValidationError::new(self.items)
    }
}

/// View over one JSON object being decoded
pub(crate) struct Fields<'a> {
    map: &'a Map<String, Value>,
    path: String,
    known: &'static [&'static str],
}

impl<'a> Fields<'a> {
    pub(crate) fn path_of(&self, key: &str) -> String {
        join_path(&self.path, key)
    }
}

/// Walks a JSON tree, collecting violations and unrecognized fields
#[derive(Debug, Default)]
pub(crate) struct Reader {
    pub(crate) violations: Violations,
    pub(crate) unrecognized: Vec<UnrecognizedField>,
}

impl Reader {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Open `value` as an object with the given known keys
    ///
    /// Records a type violation at `path` if `value` is not an object.
    pub(crate) fn object<'a>(
        &mut self,
        path: &str,
        value: &'a Value,
        known: &'static [&'static str],
    ) -> Option<Fields<'a>> {
        match value {
            Value::Object(map) => {
                for (key, extra) in map.iter().filter(|(k, _)| !known.contains(&k.as_str())) {
                    self.unrecognized.push(UnrecognizedField {
                        path: join_path(path, key),
                        value: extra.clone(),
                    });
                }
                Some(Fields {
                    map,
                    path: path.to_string(),
                    known,
                })
            }
            other => {
                self.violations.wrong_type(path, "object", other);
                None
            }
        }
    }

    /// A required member; `null` counts as present-but-mistyped
    pub(crate) fn required<'a>(&mut self, fields: &Fields<'a>, key: &str) -> Option<&'a Value> {
        debug_assert!(fields.known.contains(&key));
        let value = fields.map.get(key);
        self.violations.require(&fields.path_of(key), value)
    }

    /// An optional member; absent and `null` both read as `None`
    pub(crate) fn optional<'a>(&self, fields: &Fields<'a>, key: &str) -> Option<&'a Value> {
        debug_assert!(fields.known.contains(&key));
        fields.map.get(key).filter(|v| !v.is_null())
    }

    pub(crate) fn bool(&mut self, path: &str, value: &Value) -> Option<bool> {
        match value {
            Value::Bool(b) => Some(*b),
            other => {
                self.violations.wrong_type(path, "boolean", other);
                None
            }
        }
    }

    pub(crate) fn i64(&mut self, path: &str, value: &Value) -> Option<i64> {
        match value {
            Value::Number(n) if n.is_i64() => n.as_i64(),
            Value::Number(n) if n.is_u64() => {
                self.violations
                    .out_of_range(path, format!("integer {} does not fit in 64 bits", n));
                None
            }
            other => {
                self.violations.wrong_type(path, INTEGER, other);
                None
            }
        }
    }

    pub(crate) fn u32(&mut self, path: &str, value: &Value) -> Option<u32> {
        match value {
            Value::Number(n) if n.is_u64() => match n.as_u64().map(u32::try_from) {
                Some(Ok(v)) => Some(v),
                _ => {
                    self.violations
                        .out_of_range(path, format!("integer {} exceeds {}", n, u32::MAX));
                    None
                }
            },
            Value::Number(n) if n.is_i64() => {
                self.violations
                    .out_of_range(path, format!("expected {}, got {}", NON_NEGATIVE_INTEGER, n));
                None
            }
            other => {
                self.violations.wrong_type(path, NON_NEGATIVE_INTEGER, other);
                None
            }
        }
    }

    /// Any JSON number, integer or float
    pub(crate) fn f64(&mut self, path: &str, value: &Value) -> Option<f64> {
        match value {
            Value::Number(n) => n.as_f64(),
            other => {
                self.violations.wrong_type(path, "number", other);
                None
            }
        }
    }

    /// Array of integers, each element checked and reported individually
    pub(crate) fn i64_list(&mut self, path: &str, value: &Value) -> Option<Vec<i64>> {
        let items = match value {
            Value::Array(items) => items,
            other => {
                self.violations.wrong_type(path, "array of integers", other);
                return None;
            }
        };

        let mut out = Vec::with_capacity(items.len());
        let mut ok = true;
        for (i, item) in items.iter().enumerate() {
            match self.i64(&join_path(path, &format!("[{}]", i)), item) {
                Some(v) => out.push(v),
                None => ok = false,
            }
        }
        ok.then_some(out)
    }

    pub(crate) fn required_bool(&mut self, fields: &Fields<'_>, key: &str) -> Option<bool> {
        let value = self.required(fields, key)?;
        self.bool(&fields.path_of(key), value)
    }

    pub(crate) fn required_i64(&mut self, fields: &Fields<'_>, key: &str) -> Option<i64> {
        let value = self.required(fields, key)?;
        self.i64(&fields.path_of(key), value)
    }

    pub(crate) fn required_u32(&mut self, fields: &Fields<'_>, key: &str) -> Option<u32> {
        let value = self.required(fields, key)?;
        self.u32(&fields.path_of(key), value)
    }

    pub(crate) fn required_i64_list(&mut self, fields: &Fields<'_>, key: &str) -> Option<Vec<i64>> {
        let value = self.required(fields, key)?;
        self.i64_list(&fields.path_of(key), value)
    }

    /// `Ok(None)` when absent, `Err(())` when present but invalid
    pub(crate) fn optional_i64(&mut self, fields: &Fields<'_>, key: &str) -> Result<Option<i64>, ()> {
        match self.optional(fields, key) {
            None => Ok(None),
            Some(value) => self.i64(&fields.path_of(key), value).map(Some).ok_or(()),
        }
    }

    /// `Ok(None)` when absent, `Err(())` when present but invalid
    pub(crate) fn optional_f64(&mut self, fields: &Fields<'_>, key: &str) -> Result<Option<f64>, ()> {
        match self.optional(fields, key) {
            None => Ok(None),
            Some(value) => self.f64(&fields.path_of(key), value).map(Some).ok_or(()),
        }
    }
}
