//! Named-field mapping produced by every codec
//!
//! The json codec keeps JSON types while the simple and bash codecs only
//! produce strings, so the typed accessors accept both representations.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::codec::CodecError;

/// Decoded command: field name to value
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fields(Map<String, Value>);

impl Fields {
    /// Create an empty field map
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a field, replacing any previous value
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    /// Builder-style insert
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    /// Raw value of a field
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over fields in key order
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    /// Borrow the underlying JSON object
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    /// String value of a field; numbers and booleans are stringified
    pub fn get_str(&self, key: &str) -> Option<String> {
        match self.0.get(key)? {
            Value::Null => None,
            value => Some(value_to_string(value)),
        }
    }

    /// String value of a mandatory field
    pub fn require_str(&self, key: &str) -> Result<String, CodecError> {
        self.get_str(key)
            .ok_or_else(|| CodecError::MissingField(key.to_string()))
    }

    /// Signed integer value of a field
    pub fn get_i32(&self, key: &str) -> Result<Option<i32>, CodecError> {
        let Some(value) = self.present(key) else {
            return Ok(None);
        };

        let parsed = match value {
            Value::Number(n) => n.as_i64().and_then(|n| i32::try_from(n).ok()),
            Value::String(s) => s.trim().parse::<i32>().ok(),
            _ => None,
        };

        parsed
            .map(Some)
            .ok_or_else(|| invalid(key, value, "an integer"))
    }

    /// Unsigned integer value of a field
    pub fn get_u32(&self, key: &str) -> Result<Option<u32>, CodecError> {
        let Some(value) = self.present(key) else {
            return Ok(None);
        };

        let parsed = match value {
            Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
            Value::String(s) => s.trim().parse::<u32>().ok(),
            _ => None,
        };

        parsed
            .map(Some)
            .ok_or_else(|| invalid(key, value, "a non-negative integer"))
    }

    /// Floating point value of a field
    pub fn get_f32(&self, key: &str) -> Result<Option<f32>, CodecError> {
        let Some(value) = self.present(key) else {
            return Ok(None);
        };

        let parsed = match value {
            Value::Number(n) => n.as_f64().map(|n| n as f32),
            Value::String(s) => s.trim().parse::<f32>().ok(),
            _ => None,
        };

        parsed
            .filter(|n| n.is_finite())
            .map(Some)
            .ok_or_else(|| invalid(key, value, "a number"))
    }

    /// Boolean value of a field
    ///
    /// Accepts `true/false`, `1/0` and `yes/no` in any case.
    pub fn get_bool(&self, key: &str) -> Result<Option<bool>, CodecError> {
        let Some(value) = self.present(key) else {
            return Ok(None);
        };

        let parsed = match value {
            Value::Bool(b) => Some(*b),
            Value::Number(n) => n.as_i64().map(|n| n != 0),
            Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" | "1" | "yes" => Some(true),
                "false" | "0" | "no" => Some(false),
                _ => None,
            },
            _ => None,
        };

        parsed
            .map(Some)
            .ok_or_else(|| invalid(key, value, "a boolean"))
    }

    /// A field counts as absent when missing, null or an empty string
    fn present(&self, key: &str) -> Option<&Value> {
        match self.0.get(key)? {
            Value::Null => None,
            Value::String(s) if s.is_empty() => None,
            value => Some(value),
        }
    }
}

impl From<Map<String, Value>> for Fields {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl FromIterator<(String, Value)> for Fields {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Render a value the way the text codecs write it
pub fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn invalid(field: &str, value: &Value, expected: &'static str) -> CodecError {
    CodecError::InvalidField {
        field: field.to_string(),
        value: value_to_string(value),
        expected,
    }
}
