//! File-based configuration source.

use std::path::{Path, PathBuf};

use tracing::debug;

use super::decode::{Decoder, Format};
use super::source::ConfigSource;
use super::value::RawObject;
use super::ConfigError;

/// A configuration source that loads a JSON or TOML file.
///
/// Files can be marked as required or optional. Required files that don't exist
/// cause an error; optional files that don't exist are silently skipped.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
    required: bool,
    format: Format,
}

impl FileSource {
    /// Creates a new file source. The format follows the file extension and
    /// defaults to JSON.
    pub fn new(path: impl AsRef<Path>, required: bool) -> Self {
        let path = path.as_ref().to_path_buf();
        let format = Format::from_path(&path).unwrap_or_default();
        Self {
            path,
            required,
            format,
        }
    }

    pub fn with_format(mut self, format: Format) -> Self {
        self.format = format;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ConfigSource for FileSource {
    fn load(&self) -> Result<Option<RawObject>, ConfigError> {
        match read_config_file(&self.path, self.required)? {
            Some(bytes) => self.format.decode_object(&bytes).map(Some),
            None => Ok(None),
        }
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// Reads a config file.
///
/// Returns `Ok(None)` if the file doesn't exist and `required` is false.
fn read_config_file(path: &Path, required: bool) -> Result<Option<Vec<u8>>, ConfigError> {
    match std::fs::read(path) {
        Ok(bytes) => Ok(Some(bytes)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            if required {
                Err(ConfigError::FileNotFound(path.to_path_buf()))
            } else {
                debug!(path = %path.display(), "optional config file not found");
                Ok(None)
            }
        }
        Err(e) => Err(ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}
