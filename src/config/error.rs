use std::path::PathBuf;
use thiserror::Error;

use super::decode::Format;
use super::tier::Tier;
use super::value::ValueKind;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("required config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to decode {format} config: {source}")]
    Decode {
        format: Format,
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("config must be an object at the top level, found {found}")]
    NotAnObject { found: &'static str },

    #[error("property {name} has unsupported type {found}, ignoring it")]
    UnsupportedValueKind { name: String, found: &'static str },

    #[error("property {0} does not exist")]
    PropertyNotFound(String),

    #[error("property {name} expects {expected}, found {found}")]
    KindMismatch {
        name: String,
        expected: ValueKind,
        found: &'static str,
    },

    #[error("cannot load {tier} tier before the base tier")]
    NoTreeLoaded { tier: Tier },

    #[error("no configuration tree has been loaded yet")]
    NotLoaded,

    #[error("unknown tier: {0}")]
    UnknownTier(String),
}
