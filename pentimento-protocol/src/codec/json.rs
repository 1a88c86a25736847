use serde_json::Value;

use super::{Codec, CodecError};
use crate::fields::Fields;

/// One JSON object per line
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn name(&self) -> &'static str {
        "json"
    }

    fn parse(&self, line: &str) -> Result<Fields, CodecError> {
        match serde_json::from_str::<Value>(line)? {
            Value::Object(map) => Ok(Fields::from(map)),
            other => Err(CodecError::malformed(
                self.name(),
                format!("expected an object, got {}", kind_of(&other)),
            )),
        }
    }

    fn unparse(&self, fields: &Fields) -> String {
        Value::Object(fields.as_map().clone()).to_string()
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
