//! Key-value access to a `.nam` artifact's metadata map
//!
//! An artifact is a JSON object; its `metadata` member is the key-value
//! store in which the training record lives under [`TRAINING_KEY`].
//! Everything else in the file (weights, architecture, config, other
//! metadata keys) is carried through untouched, in its original key order
//! and with floats reproduced bit-for-bit.

use serde_json::{Map, Value};
use std::path::Path;
use tracing::{debug, info};

use crate::codec::TRAINING_KEY;
use crate::error::{Error, Result};
use crate::model::TrainingMetadata;
use crate::schema::type_name;

const METADATA_KEY: &str = "metadata";

/// In-memory artifact document
#[derive(Debug, Clone, PartialEq)]
pub struct Artifact {
    root: Map<String, Value>,
}

impl Artifact {
    /// Empty artifact with no sections
    pub fn new() -> Self {
        Self { root: Map::new() }
    }

    /// Wrap a parsed artifact document
    ///
    /// The document must be a JSON object, and its `metadata` member (if
    /// present) must be an object as well.
    pub fn from_value(value: Value) -> Result<Self> {
        let root = match value {
            Value::Object(root) => root,
            other => {
                return Err(Error::Decode(format!(
                    "artifact must be a JSON object, found {}",
                    type_name(&other)
                )))
            }
        };

        match root.get(METADATA_KEY) {
            None | Some(Value::Object(_)) => Ok(Self { root }),
            Some(other) => Err(Error::Decode(format!(
                "artifact '{}' must be a JSON object, found {}",
                METADATA_KEY,
                type_name(other)
            ))),
        }
    }

    pub fn from_json_str(text: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(text)
            .map_err(|e| Error::Decode(format!("artifact is not valid JSON: {}", e)))?;
        Self::from_value(value)
    }

    /// Read and parse an artifact file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!("Loading artifact from {}", path.display());
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Write the artifact atomically (sibling temp file, then rename)
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let mut temp_name = path.as_os_str().to_owned();
        temp_name.push(".tmp");
        let temp_path = std::path::PathBuf::from(temp_name);

        let text = serde_json::to_string(&self.root)?;
        std::fs::write(&temp_path, text)?;
        if let Err(e) = std::fs::rename(&temp_path, path) {
            let _ = std::fs::remove_file(&temp_path);
            return Err(e.into());
        }

        info!("Wrote artifact {}", path.display());
        Ok(())
    }

    /// A top-level section (e.g. `weights`, `architecture`)
    pub fn section(&self, name: &str) -> Option<&Value> {
        self.root.get(name)
    }

    /// Metadata map, if the artifact has one
    pub fn metadata(&self) -> Option<&Map<String, Value>> {
        self.root.get(METADATA_KEY).and_then(Value::as_object)
    }

    /// Value stored under `key` in the metadata map
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.metadata().and_then(|m| m.get(key))
    }

    /// Store `value` under `key`, creating the metadata map if needed.
    /// Returns the previous value.
    pub fn set(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.metadata_mut().insert(key.into(), value)
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        match self.root.get_mut(METADATA_KEY) {
            Some(Value::Object(map)) => map.shift_remove(key),
            _ => None,
        }
    }

    /// Raw value under [`TRAINING_KEY`]; an explicit `null` reads as absent
    pub fn training_record(&self) -> Option<&Value> {
        self.get(TRAINING_KEY).filter(|v| !v.is_null())
    }

    /// Training record, or `None` if the artifact was produced without one
    pub fn training_metadata(&self) -> Result<Option<TrainingMetadata>> {
        self.training_record()
            .map(TrainingMetadata::from_value)
            .transpose()
    }

    /// Embed `metadata` under [`TRAINING_KEY`], replacing any existing record
    pub fn set_training_metadata(&mut self, metadata: &TrainingMetadata) -> Result<()> {
        let value = metadata.to_value()?;
        if self.set(TRAINING_KEY, value).is_some() {
            debug!("Replaced existing training metadata");
        }
        Ok(())
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.root)
    }

    fn metadata_mut(&mut self) -> &mut Map<String, Value> {
        let entry = self
            .root
            .entry(METADATA_KEY)
            .or_insert_with(|| Value::Object(Map::new()));
        if !entry.is_object() {
            *entry = Value::Object(Map::new());
        }
        match entry {
            Value::Object(map) => map,
            _ => unreachable!("metadata entry was just made an object"),
        }
    }
}

impl Default for Artifact {
    fn default() -> Self {
        Self::new()
    }
}
