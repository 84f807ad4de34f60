//! Core types: the payload value model and validation options.

use indexmap::IndexMap;

use crate::error::LoadError;

/// Label the violation paths are rooted at unless configured otherwise.
pub const DEFAULT_ROOT_LABEL: &str = "payload";

/// Returns the JSON type name for error messages.
pub fn json_type_name(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

/// A decoded payload.
///
/// Closed over the shapes the validator understands. Floating point numbers
/// are not part of the model and are rejected while decoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Null,
    Bool(bool),
    Integer(i64),
    String(String),
    Sequence(Vec<Value>),
    Mapping(IndexMap<String, Value>),
}

impl Value {
    /// Decode a JSON value, rooting error paths at [`DEFAULT_ROOT_LABEL`].
    ///
    /// # Errors
    ///
    /// Returns `LoadError::UnsupportedNumber` for numbers that do not fit an `i64`.
    pub fn from_json(json: &serde_json::Value) -> Result<Self, LoadError> {
        Self::decode(json, DEFAULT_ROOT_LABEL)
    }

    pub(crate) fn decode(json: &serde_json::Value, path: &str) -> Result<Self, LoadError> {
        Ok(match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(*b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Integer(i),
                None => {
                    return Err(LoadError::UnsupportedNumber {
                        path: path.to_string(),
                        number: n.to_string(),
                    })
                }
            },
            serde_json::Value::String(s) => Value::String(s.clone()),
            serde_json::Value::Array(items) => Value::Sequence(
                items
                    .iter()
                    .enumerate()
                    .map(|(idx, item)| Self::decode(item, &format!("{}[{}]", path, idx)))
                    .collect::<Result<_, _>>()?,
            ),
            serde_json::Value::Object(map) => Value::Mapping(
                map.iter()
                    .map(|(key, item)| {
                        Self::decode(item, &format!("{}.{}", path, key))
                            .map(|value| (key.clone(), value))
                    })
                    .collect::<Result<_, _>>()?,
            ),
        })
    }

    /// Returns the type name used in messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Integer(_) => "integer",
            Value::String(_) => "string",
            Value::Sequence(_) => "array",
            Value::Mapping(_) => "object",
        }
    }

    /// Look up a key if this is a mapping.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_mapping().and_then(|map| map.get(key))
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_sequence(&self) -> Option<&[Value]> {
        match self {
            Value::Sequence(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_mapping(&self) -> Option<&IndexMap<String, Value>> {
        match self {
            Value::Mapping(map) => Some(map),
            _ => None,
        }
    }

    /// Null, `false`, `0`, empty strings, and empty collections count as blank.
    pub fn is_blank(&self) -> bool {
        match self {
            Value::Null => true,
            Value::Bool(b) => !b,
            Value::Integer(i) => *i == 0,
            Value::String(s) => s.is_empty(),
            Value::Sequence(items) => items.is_empty(),
            Value::Mapping(map) => map.is_empty(),
        }
    }
}

impl From<&Value> for serde_json::Value {
    fn from(value: &Value) -> Self {
        match value {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Integer(i) => serde_json::Value::from(*i),
            Value::String(s) => serde_json::Value::String(s.clone()),
            Value::Sequence(items) => {
                serde_json::Value::Array(items.iter().map(serde_json::Value::from).collect())
            }
            Value::Mapping(map) => serde_json::Value::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), serde_json::Value::from(v)))
                    .collect(),
            ),
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", serde_json::Value::from(self))
    }
}

/// Options for a validation call.
#[derive(Debug, Clone)]
pub struct ValidateOptions {
    /// Label the violation paths start with (e.g. `payload`).
    pub root_label: String,
    /// Whether the semantic rules run after the structural pass.
    pub semantic_rules: bool,
}

impl Default for ValidateOptions {
    fn default() -> Self {
        Self {
            root_label: DEFAULT_ROOT_LABEL.to_string(),
            semantic_rules: true,
        }
    }
}

impl ValidateOptions {
    /// Create options with the default root label and semantic rules enabled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the label violation paths are rooted at.
    pub fn root_label(mut self, label: impl Into<String>) -> Self {
        self.root_label = label.into();
        self
    }

    /// Enable or disable the semantic rule layer.
    pub fn semantic_rules(mut self, enabled: bool) -> Self {
        self.semantic_rules = enabled;
        self
    }
}
