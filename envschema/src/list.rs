//! Delimited list values
//!
//! A single variable such as `FEATURE_FLAGS=Key-1;key-2;;incremental-build;`
//! decodes into `["key-1", "key-2", "incremental-build"]`: the text is
//! lowercased, split on the separator, and empty segments are dropped.

use crate::schema::Codec;
use serde_json::Value;

/// Default list separator
pub const SEPARATOR: char = ';';

/// Decode a `;`-separated string into lowercase tokens.
///
/// ```rust
/// assert_eq!(envschema::list::decode("A;b;;c;"), ["a", "b", "c"]);
/// assert!(envschema::list::decode("").is_empty());
/// ```
pub fn decode(raw: &str) -> Vec<String> {
    DelimitedList::default().split(raw)
}

/// Join tokens with `;`.
pub fn encode<S: AsRef<str>>(items: &[S]) -> String {
    DelimitedList::default().join(items)
}

/// Transform codec for delimited lists.
///
/// Plugged into a schema with [`Schema::string_list`](crate::Schema::string_list)
/// or [`Schema::delimited`](crate::Schema::delimited).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DelimitedList {
    separator: char,
}

impl DelimitedList {
    pub fn new(separator: char) -> Self {
        Self { separator }
    }

    pub fn separator(&self) -> char {
        self.separator
    }

    pub fn split(&self, raw: &str) -> Vec<String> {
        raw.to_lowercase()
            .split(self.separator)
            .filter(|segment| !segment.is_empty())
            .map(str::to_string)
            .collect()
    }

    pub fn join<S: AsRef<str>>(&self, items: &[S]) -> String {
        let mut buf = [0u8; 4];
        let separator: &str = self.separator.encode_utf8(&mut buf);
        items
            .iter()
            .map(AsRef::as_ref)
            .collect::<Vec<_>>()
            .join(separator)
    }
}

impl Default for DelimitedList {
    fn default() -> Self {
        Self::new(SEPARATOR)
    }
}

impl Codec for DelimitedList {
    fn decode(&self, value: Value) -> Result<Value, String> {
        match value {
            Value::String(raw) => Ok(Value::from(self.split(&raw))),
            other => Err(format!("Expected delimited string, got {other}")),
        }
    }

    fn encode(&self, value: Value) -> Result<Value, String> {
        let items: Vec<String> = serde_json::from_value(value)
            .map_err(|e| format!("Expected list of strings: {e}"))?;
        Ok(Value::String(self.join(&items)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_empty() {
        assert!(decode("").is_empty());
        assert!(decode(";;;").is_empty());
    }

    #[test]
    fn test_decode_drops_empty_segments() {
        assert_eq!(decode("a;b;;c;"), ["a", "b", "c"]);
    }

    #[test]
    fn test_decode_lowercases() {
        assert_eq!(decode("A;B"), ["a", "b"]);
        assert_eq!(
            decode("key-1;KEY-2;env-variable;enable-incremental-build;"),
            ["key-1", "key-2", "env-variable", "enable-incremental-build"]
        );
    }

    #[test]
    fn test_decode_keeps_inner_whitespace() {
        assert_eq!(decode(" a ;b"), [" a ", "b"]);
    }

    #[test]
    fn test_encode_then_decode_normalized_list() {
        let list = vec!["alpha".to_string(), "beta-2".to_string(), "x".to_string()];
        assert_eq!(encode(&list), "alpha;beta-2;x");
        assert_eq!(decode(&encode(&list)), list);
    }

    #[test]
    fn test_custom_separator() {
        let list = DelimitedList::new(',');
        assert_eq!(list.split("A,,b"), ["a", "b"]);
        assert_eq!(list.join(&["a", "b"]), "a,b");
    }

    #[test]
    fn test_codec_rejects_non_string() {
        let codec = DelimitedList::default();
        assert!(Codec::decode(&codec, json!(12)).is_err());
        assert_eq!(Codec::decode(&codec, json!("X;y")).unwrap(), json!(["x", "y"]));
        assert_eq!(Codec::encode(&codec, json!(["x", "y"])).unwrap(), json!("x;y"));
        assert!(Codec::encode(&codec, json!("x")).is_err());
    }
}
