//! Decoding source bytes into the generic object.

use std::fmt;
use std::path::Path;

use serde_json::Value;

use super::value::{describe, RawObject};
use super::ConfigError;

/// Turns raw bytes into a decoded value.
pub trait Decoder {
    fn decode(&self, bytes: &[u8]) -> Result<Value, ConfigError>;

    /// Decodes and requires an object at the top level.
    fn decode_object(&self, bytes: &[u8]) -> Result<RawObject, ConfigError> {
        match self.decode(bytes)? {
            Value::Object(object) => Ok(object),
            other => Err(ConfigError::NotAnObject {
                found: describe(&other),
            }),
        }
    }
}

/// Supported serialization formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Format {
    #[default]
    Json,
    Toml,
}

impl Format {
    fn error(self, source: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> ConfigError {
        ConfigError::Decode {
            format: self,
            source: source.into(),
        }
    }

    /// Picks a format from the file extension, if it is a known one.
    pub fn from_path(path: &Path) -> Option<Format> {
        let ext = path.extension()?.to_str()?;
        if ext.eq_ignore_ascii_case("json") {
            Some(Format::Json)
        } else if ext.eq_ignore_ascii_case("toml") {
            Some(Format::Toml)
        } else {
            None
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Format::Json => f.write_str("JSON"),
            Format::Toml => f.write_str("TOML"),
        }
    }
}

impl Decoder for Format {
    fn decode(&self, bytes: &[u8]) -> Result<Value, ConfigError> {
        match self {
            Format::Json => serde_json::from_slice(bytes).map_err(|e| self.error(e)),
            Format::Toml => {
                let text = std::str::from_utf8(bytes).map_err(|e| self.error(e))?;
                let table: toml::Table = toml::from_str(text).map_err(|e| self.error(e))?;
                Ok(Value::Object(table_to_object(table)))
            }
        }
    }
}

fn table_to_object(table: toml::Table) -> RawObject {
    table
        .into_iter()
        .map(|(key, value)| (key, toml_to_json(value)))
        .collect()
}

/// Datetimes become strings; non-finite floats become null and are then
/// rejected like any other unsupported value.
fn toml_to_json(value: toml::Value) -> Value {
    match value {
        toml::Value::String(s) => Value::String(s),
        toml::Value::Integer(i) => Value::from(i),
        toml::Value::Float(f) => serde_json::Number::from_f64(f)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        toml::Value::Boolean(b) => Value::Bool(b),
        toml::Value::Datetime(dt) => Value::String(dt.to_string()),
        toml::Value::Array(items) => Value::Array(items.into_iter().map(toml_to_json).collect()),
        toml::Value::Table(table) => Value::Object(table_to_object(table)),
    }
}
