use serde_json::Value;

use super::node::NodeView;
use super::value::RawObject;
use super::ConfigError;

/// Something that can produce one tier's object.
///
/// `Ok(None)` means the source has nothing to contribute (an optional file
/// that does not exist, for example) and the load is skipped.
pub trait ConfigSource: Send + Sync + std::fmt::Debug {
    fn load(&self) -> Result<Option<RawObject>, ConfigError>;

    /// Loads with the current tree's root in reach.
    ///
    /// Sources whose input is untyped text use `shape` to pick the declared
    /// spelling and kind of each key. `shape` is `None` before the first
    /// base-tier load.
    fn load_for(&self, shape: Option<NodeView<'_>>) -> Result<Option<RawObject>, ConfigError> {
        let _ = shape;
        self.load()
    }

    /// Human readable name for diagnostics.
    fn describe(&self) -> String;
}

/// A source holding an already decoded object.
#[derive(Debug, Clone)]
pub struct ObjectSource {
    name: String,
    object: RawObject,
}

impl ObjectSource {
    pub fn new(name: impl Into<String>, object: RawObject) -> Self {
        Self {
            name: name.into(),
            object,
        }
    }
}

impl ConfigSource for ObjectSource {
    fn load(&self) -> Result<Option<RawObject>, ConfigError> {
        Ok(Some(self.object.clone()))
    }

    fn describe(&self) -> String {
        self.name.clone()
    }
}

/// Inserts `value` at a nested path, creating intermediate objects.
///
/// A non-object value sitting where an intermediate object is needed is
/// replaced.
pub fn insert_at_path(object: &mut RawObject, path: &[String], value: Value) {
    let Some((first, rest)) = path.split_first() else {
        return;
    };

    if rest.is_empty() {
        object.insert(first.clone(), value);
        return;
    }

    if !matches!(object.get(first), Some(Value::Object(_))) {
        object.insert(first.clone(), Value::Object(RawObject::new()));
    }

    if let Some(Value::Object(nested)) = object.get_mut(first) {
        insert_at_path(nested, rest, value);
    }
}
