use serde_json::Value;

use super::node::NodeView;
use super::source::{insert_at_path, ConfigSource};
use super::value::{RawObject, ValueKind};
use super::ConfigError;

/// Builds a tier object from environment variables.
///
/// `MYAPP__AUDIO__BITRATE=192` with prefix `MYAPP` and separator `__`
/// becomes `{"audio": {"bitrate": 192}}`.
///
/// Once a base tier is loaded, path segments match declared keys regardless
/// of ASCII case (`MYAPP__AUDIO__SAMPLERATE` reaches `audio.sampleRate`) and
/// each value is parsed as the kind its property declares. Anything the
/// shape does not declare is lowercased and its type guessed.
#[derive(Debug, Clone)]
pub struct EnvSource {
    prefix: String,
    separator: String,
}

impl EnvSource {
    pub fn new(prefix: impl Into<String>, separator: impl Into<String>) -> Self {
        let separator = separator.into();
        assert!(!separator.is_empty(), "separator must not be empty");
        Self {
            prefix: prefix.into(),
            separator,
        }
    }

    fn object_from_vars(
        &self,
        vars: impl IntoIterator<Item = (String, String)>,
        shape: Option<NodeView<'_>>,
    ) -> RawObject {
        let prefix_with_sep = format!("{}{}", self.prefix, self.separator);
        let mut object = RawObject::new();

        for (key, value) in vars {
            let Some(path_str) = key.strip_prefix(&prefix_with_sep) else {
                continue;
            };
            if path_str.is_empty() {
                continue;
            }

            let segments: Vec<&str> = path_str.split(&self.separator).collect();
            let (path, kind) = match_shape(shape, &segments);
            insert_at_path(&mut object, &path, parse_as(&value, kind));
        }

        object
    }
}

impl ConfigSource for EnvSource {
    fn load(&self) -> Result<Option<RawObject>, ConfigError> {
        self.load_for(None)
    }

    fn load_for(&self, shape: Option<NodeView<'_>>) -> Result<Option<RawObject>, ConfigError> {
        let object = self.object_from_vars(std::env::vars(), shape);
        Ok((!object.is_empty()).then_some(object))
    }

    fn describe(&self) -> String {
        format!("environment ({}{}*)", self.prefix, self.separator)
    }
}

/// Spells `segments` the way the declared shape does and looks up the kind
/// of the property they end on.
fn match_shape(shape: Option<NodeView<'_>>, segments: &[&str]) -> (Vec<String>, Option<ValueKind>) {
    let mut path = Vec::with_capacity(segments.len());
    let mut kind = None;
    let mut node = shape;

    for (i, segment) in segments.iter().enumerate() {
        let Some(current) = node.take() else {
            path.push(segment.to_lowercase());
            continue;
        };

        if i + 1 == segments.len() {
            let slots = current.node().slots();
            if let Some(slot) = slots.iter().find(|s| s.key().eq_ignore_ascii_case(segment)) {
                kind = Some(slot.kind());
                path.push(slot.key().to_string());
                continue;
            }
        }

        match current
            .children()
            .find(|child| child.name().eq_ignore_ascii_case(segment))
        {
            Some(child) => {
                path.push(child.name().to_string());
                node = Some(child);
            }
            None => path.push(segment.to_lowercase()),
        }
    }

    (path, kind)
}

/// Parses a raw variable as `kind`, falling back to [`guess_value`].
fn parse_as(raw: &str, kind: Option<ValueKind>) -> Value {
    match kind {
        Some(ValueKind::String) => Value::String(raw.to_string()),
        Some(ValueKind::List) => match serde_json::from_str(raw) {
            Ok(Value::Array(items)) => Value::Array(items),
            _ => guess_value(raw),
        },
        _ => guess_value(raw),
    }
}

fn guess_value(raw: &str) -> Value {
    match raw.to_ascii_lowercase().as_str() {
        "true" => return Value::Bool(true),
        "false" => return Value::Bool(false),
        _ => {}
    }

    if looks_like_integer(raw) {
        if let Ok(i) = raw.parse::<i64>() {
            return Value::from(i);
        }
    }

    // Only dotted numbers are floats; "inf" and "1e3" stay strings.
    if raw.contains('.') {
        if let Some(n) = raw.parse::<f64>().ok().and_then(serde_json::Number::from_f64) {
            return Value::Number(n);
        }
    }

    Value::String(raw.to_string())
}

fn looks_like_integer(s: &str) -> bool {
    let s = s.strip_prefix('-').unwrap_or(s);
    !s.is_empty() && s.chars().all(|c| c.is_ascii_digit())
}
