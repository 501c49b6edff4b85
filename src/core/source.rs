//! Purpose: Load the dataset from the local JSON data file.
//! Exports: `FileSource`.
//! Role: File-backed implementation of the data-provider contract.
//! Invariants: Every call reads the file fresh; nothing is cached between calls.
//! Invariants: Read, parse, and shape failures all surface as `DataUnavailable`.

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::core::error::{Error, ErrorKind};

#[derive(Clone, Debug)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<Vec<Value>, Error> {
        let raw = fs::read_to_string(&self.path).map_err(|err| {
            Error::new(ErrorKind::DataUnavailable)
                .with_message("failed to read data file")
                .with_path(&self.path)
                .with_source(err)
        })?;
        let parsed: Value = serde_json::from_str(&raw).map_err(|err| {
            Error::new(ErrorKind::DataUnavailable)
                .with_message("data file is not valid JSON")
                .with_path(&self.path)
                .with_source(err)
        })?;
        records_from_value(parsed).map_err(|err| err.with_path(&self.path))
    }
}

/// Accept only a top-level JSON array; anything else is an unusable payload.
pub(crate) fn records_from_value(value: Value) -> Result<Vec<Value>, Error> {
    match value {
        Value::Array(records) => Ok(records),
        other => Err(Error::new(ErrorKind::DataUnavailable)
            .with_message(format!("expected a JSON array of records, got {}", type_label(&other)))),
    }
}

fn type_label(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
