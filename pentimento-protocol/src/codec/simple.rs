use serde_json::Value;

use super::{Codec, CodecError};
use crate::fields::{value_to_string, Fields};

/// Tab separated `key<TAB>value` pairs
///
/// Values never contain tabs or newlines; [`SimpleCodec::unparse`] replaces
/// them with spaces.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimpleCodec;

impl Codec for SimpleCodec {
    fn name(&self) -> &'static str {
        "simple"
    }

    fn parse(&self, line: &str) -> Result<Fields, CodecError> {
        let parts: Vec<&str> = line.split('\t').collect();
        if parts.len() % 2 != 0 {
            return Err(CodecError::malformed(
                self.name(),
                format!("expected key/value pairs, got {} columns", parts.len()),
            ));
        }

        Ok(parts
            .chunks_exact(2)
            .map(|pair| (pair[0].to_string(), Value::String(pair[1].to_string())))
            .collect())
    }

    fn unparse(&self, fields: &Fields) -> String {
        fields
            .iter()
            .flat_map(|(key, value)| [sanitize(key), sanitize(&value_to_string(value))])
            .collect::<Vec<_>>()
            .join("\t")
    }
}

fn sanitize(text: &str) -> String {
    text.replace(['\t', '\n', '\r'], " ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_pairs() {
        let fields = SimpleCodec
            .parse("action\tadd\tidentifier\tpreview\tx\t5")
            .unwrap();

        assert_eq!(fields.len(), 3);
        assert_eq!(fields.get_str("identifier").as_deref(), Some("preview"));
        assert_eq!(fields.get_i32("x").unwrap(), Some(5));
    }

    #[test]
    fn test_parse_odd_column_count() {
        let err = SimpleCodec.parse("action\tadd\tidentifier").unwrap_err();
        assert!(matches!(err, CodecError::Malformed { codec: "simple", .. }));
    }

    #[test]
    fn test_parse_keeps_spaces_in_values() {
        let fields = SimpleCodec.parse("path\t/tmp/my image.png").unwrap();
        assert_eq!(fields.get_str("path").as_deref(), Some("/tmp/my image.png"));
    }

    #[test]
    fn test_unparse_flattens_separators() {
        let fields = Fields::new()
            .with("message", "bad\tvalue\nhere")
            .with("type", "error");
        let line = SimpleCodec.unparse(&fields);

        assert_eq!(line, "message\tbad value here\ttype\terror");
        assert_eq!(SimpleCodec.parse(&line).unwrap().len(), 2);
    }
}
