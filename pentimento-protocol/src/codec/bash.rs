use serde_json::Value;

use super::{Codec, CodecError};
use crate::fields::{value_to_string, Fields};

/// Associative arrays as printed by `declare -p`
///
/// Input looks like `declare -A cmd=([action]="add" [x]="3")`. Everything
/// between the first `(` and the last `)` is split with shell word rules and
/// each `[key]=value` word becomes one field.
#[derive(Debug, Clone, Copy, Default)]
pub struct BashCodec;

impl Codec for BashCodec {
    fn name(&self) -> &'static str {
        "bash"
    }

    fn parse(&self, line: &str) -> Result<Fields, CodecError> {
        let body = match (line.find('('), line.rfind(')')) {
            (Some(start), Some(end)) if start < end => &line[start + 1..end],
            _ => {
                return Err(CodecError::malformed(
                    self.name(),
                    "expected an associative array in parentheses",
                ))
            }
        };

        let words = shell_words::split(body).map_err(|e| CodecError::malformed(self.name(), e))?;

        words
            .into_iter()
            .skip_while(|word| !word.starts_with('['))
            .map(|word| {
                let (key, value) = word
                    .split_once("]=")
                    .and_then(|(key, value)| Some((key.strip_prefix('[')?, value)))
                    .ok_or_else(|| {
                        CodecError::malformed(self.name(), format!("not a [key]=value pair: {word}"))
                    })?;
                Ok((key.to_string(), Value::String(value.to_string())))
            })
            .collect()
    }

    fn unparse(&self, fields: &Fields) -> String {
        fields
            .iter()
            .map(|(key, value)| {
                format!("[{}]={}", key, shell_words::quote(&value_to_string(value)))
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_declare_output() {
        let fields = BashCodec
            .parse(r#"declare -A cmd=([action]="add" [identifier]="preview" [x]="0" )"#)
            .unwrap();

        assert_eq!(fields.len(), 3);
        assert_eq!(fields.get_str("action").as_deref(), Some("add"));
        assert_eq!(fields.get_i32("x").unwrap(), Some(0));
    }

    #[test]
    fn test_parse_quoted_values() {
        let fields = BashCodec
            .parse(r#"declare -A cmd=([path]="/tmp/with space (1).png" [identifier]='a"b')"#)
            .unwrap();

        assert_eq!(
            fields.get_str("path").as_deref(),
            Some("/tmp/with space (1).png")
        );
        assert_eq!(fields.get_str("identifier").as_deref(), Some("a\"b"));
    }

    #[test]
    fn test_parse_without_parentheses() {
        let err = BashCodec.parse("declare -A cmd").unwrap_err();
        assert!(matches!(err, CodecError::Malformed { codec: "bash", .. }));
    }

    #[test]
    fn test_parse_unbalanced_quotes() {
        assert!(BashCodec.parse(r#"declare -A cmd=([path]="/tmp)"#).is_err());
    }

    #[test]
    fn test_parse_rejects_bare_word_after_pairs() {
        let err = BashCodec
            .parse(r#"declare -A cmd=([action]="add" stray)"#)
            .unwrap_err();
        assert!(err.to_string().contains("stray"));
    }

    #[test]
    fn test_unparse_quotes_values() {
        let fields = Fields::new()
            .with("message", "it's broken")
            .with("type", "error");
        let text = BashCodec.unparse(&fields);

        let words = shell_words::split(&text).unwrap();
        assert_eq!(words, vec!["[message]=it's broken", "[type]=error"]);
    }
}
