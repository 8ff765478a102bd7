//! Environment parsing pipeline
//!
//! Priority order of the stages:
//! 1. Clean: drop variables the schema does not declare
//! 2. Default: inject declared defaults for absent variables
//! 3. Convert: coerce strings to the declared primitive types
//! 4. Check: validate the working copy
//! 5. Decode on success, diagnostics on failure

use crate::de;
use crate::diagnostics;
use crate::error::EnvError;
use crate::schema::Schema;
use crate::validate;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Value of a raw environment entry; `None` means the variable is absent.
pub trait RawValue {
    fn into_raw(self) -> Option<String>;
}

impl RawValue for String {
    fn into_raw(self) -> Option<String> {
        Some(self)
    }
}

impl RawValue for &String {
    fn into_raw(self) -> Option<String> {
        Some(self.clone())
    }
}

impl RawValue for &str {
    fn into_raw(self) -> Option<String> {
        Some(self.to_string())
    }
}

impl RawValue for Option<String> {
    fn into_raw(self) -> Option<String> {
        self
    }
}

impl RawValue for &Option<String> {
    fn into_raw(self) -> Option<String> {
        self.clone()
    }
}

impl RawValue for Option<&str> {
    fn into_raw(self) -> Option<String> {
        self.map(str::to_string)
    }
}

/// Parse `env` against `schema` and deserialize the result into `T`.
///
/// # Errors
///
/// - [`EnvError::Validation`] when the environment does not satisfy the schema
/// - [`EnvError::Fatal`] when the schema cannot be described by the diagnostics
///   or the decoded object does not fit `T`
///
/// # Example
///
/// ```rust
/// use envschema::{parse_env, Schema};
/// use serde::Deserialize;
///
/// #[derive(Deserialize)]
/// struct Config {
///     #[serde(rename = "FIELD_ONE")]
///     field_one: u32,
/// }
///
/// let schema = Schema::object().property("FIELD_ONE", Schema::number());
/// let config: Config = parse_env(&schema, [("FIELD_ONE", "123")])?;
/// assert_eq!(config.field_one, 123);
/// # Ok::<(), envschema::EnvError>(())
/// ```
pub fn parse_env<T, I, K, V>(schema: &Schema, env: I) -> Result<T, EnvError>
where
    T: DeserializeOwned,
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: RawValue,
{
    let value = parse_value(schema, env)?;
    serde_json::from_value(value).map_err(|e| {
        EnvError::fatal(format!(
            "decoded environment does not fit {}: {e}",
            std::any::type_name::<T>()
        ))
    })
}

/// Parse `env` against `schema` into a decoded JSON value.
///
/// `env` is only read. Every call works on its own copy.
pub fn parse_value<I, K, V>(schema: &Schema, env: I) -> Result<Value, EnvError>
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: RawValue,
{
    let mut working: Map<String, Value> = Map::new();
    for (key, value) in env {
        if let Some(value) = value.into_raw() {
            working.insert(key.as_ref().to_string(), Value::String(value));
        }
    }
    let raw_count = working.len();
    let mut value = Value::Object(working);

    validate::clean(schema, &mut value);
    validate::apply_defaults(schema, &mut value);
    let value = validate::convert(schema, value);
    tracing::trace!(
        raw = raw_count,
        declared = schema.properties().len(),
        "environment cleaned, defaulted and converted"
    );

    if validate::check(schema, &value) {
        return match de::decode(schema, value) {
            Ok(decoded) => {
                tracing::debug!("environment parsed");
                Ok(decoded)
            }
            Err(e) => {
                tracing::debug!(path = %e.path, "transform decode failed");
                Err(EnvError::Validation {
                    message: format!(
                        "'{}': {} received '{}' instead",
                        e.path,
                        e.message,
                        validate::display_value(&e.value)
                    ),
                    causes: vec![e.path],
                })
            }
        };
    }

    let failures = validate::errors(schema, &value);
    let Some(first) = failures.first() else {
        return Err(EnvError::fatal("unable to fetch environment variables"));
    };

    let err = diagnostics::build(first)?;
    tracing::debug!(causes = ?err.causes(), "environment failed validation");
    Err(err)
}

/// Run every transform codec in reverse, turning a decoded value back into
/// its raw form.
///
/// A codec that rejects the value is reported as a validation error at the
/// transform's path.
pub fn encode_value(schema: &Schema, value: Value) -> Result<Value, EnvError> {
    de::encode(schema, value).map_err(|e| EnvError::Validation {
        message: e.to_string(),
        causes: vec![e.path],
    })
}

/// Encode a decoded value back into raw environment strings.
///
/// Transform encoders run first; strings are kept verbatim, nested objects
/// become JSON text and other scalars their JSON form. `null` entries are
/// skipped.
pub fn to_env_map(schema: &Schema, value: Value) -> Result<BTreeMap<String, String>, EnvError> {
    let map = de::into_object(encode_value(schema, value)?)?;

    Ok(map
        .into_iter()
        .filter(|(_, value)| !value.is_null())
        .map(|(key, value)| {
            let raw = match value {
                Value::String(text) => text,
                other => other.to_string(),
            };
            (key, raw)
        })
        .collect())
}

/// Snapshot of the process environment.
///
/// Variables whose name or value is not valid Unicode are skipped. The parser
/// never reads the process environment on its own; pass this snapshot
/// explicitly.
pub fn process_env() -> BTreeMap<String, String> {
    std::env::vars_os()
        .filter_map(|(key, value)| Some((key.into_string().ok()?, value.into_string().ok()?)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashMap;

    #[test]
    fn test_encode_value_joins_lists() {
        let schema = Schema::object().property("FLAGS", Schema::string_list());
        let encoded = encode_value(&schema, json!({"FLAGS": ["a", "b"]})).unwrap();
        assert_eq!(encoded, json!({"FLAGS": "a;b"}));

        let err = encode_value(&schema, json!({"FLAGS": 3})).unwrap_err();
        assert_eq!(err.causes(), ["/FLAGS".to_string()]);
    }

    #[test]
    fn test_parse_number_field() {
        let schema = Schema::object().property("FIELD_ONE", Schema::number());
        let value = parse_value(&schema, [("FIELD_ONE", "123")]).unwrap();
        assert_eq!(value, json!({"FIELD_ONE": 123}));
        assert!(value["FIELD_ONE"].is_number());
    }

    #[test]
    fn test_parse_string_field() {
        let schema = Schema::object().property("FIELD_ONE", Schema::string());
        let value = parse_value(&schema, [("FIELD_ONE", "string content")]).unwrap();
        assert_eq!(value["FIELD_ONE"], "string content");
    }

    #[test]
    fn test_invalid_number_reports_received_value() {
        let schema = Schema::object().property("FIELD_ONE", Schema::number());
        let err = parse_value(&schema, [("FIELD_ONE", "abc")]).unwrap_err();

        let message = err.to_string();
        assert!(message.contains("FIELD_ONE"));
        assert!(message.contains("'abc'"));
        assert!(!message.contains("expected:"));
        assert_eq!(err.causes(), ["/FIELD_ONE".to_string()]);
    }

    #[test]
    fn test_absent_entries_are_ignored() {
        let schema = Schema::object().property("PORT", Schema::number().with_default(80));
        let env = [("PORT", None::<String>), ("OTHER", Some("x".to_string()))];
        let value = parse_value(&schema, env).unwrap();
        assert_eq!(value, json!({"PORT": 80}));
    }

    #[test]
    fn test_caller_map_is_untouched() {
        let schema = Schema::object()
            .property("PORT", Schema::number())
            .property("MODE", Schema::string().with_default("dev"));
        let mut env = HashMap::new();
        env.insert("PORT".to_string(), "8080".to_string());
        env.insert("HOME".to_string(), "/root".to_string());
        let before = env.clone();

        parse_value(&schema, &env).unwrap();
        assert_eq!(env, before);

        env.insert("PORT".to_string(), "bad".to_string());
        let before = env.clone();
        parse_value(&schema, &env).unwrap_err();
        assert_eq!(env, before);
    }

    #[test]
    fn test_transform_decode_failure_is_validation_error() {
        #[derive(Debug)]
        struct Reject;

        impl crate::schema::Codec for Reject {
            fn decode(&self, _value: Value) -> Result<Value, String> {
                Err("not accepted".to_string())
            }

            fn encode(&self, value: Value) -> Result<Value, String> {
                Ok(value)
            }
        }

        let schema = Schema::object().property("KEY", Schema::transform(Schema::string(), Reject));
        let err = parse_value(&schema, [("KEY", "v")]).unwrap_err();
        assert_eq!(err.to_string(), "'/KEY': not accepted received 'v' instead");
        assert_eq!(err.causes(), ["/KEY".to_string()]);
    }

    #[test]
    fn test_type_mismatch_is_fatal() {
        let schema = Schema::object().property("NAME", Schema::string());
        let err = parse_env::<HashMap<String, u32>, _, _, _>(&schema, [("NAME", "x")]).unwrap_err();
        assert!(err.is_fatal());
    }

    #[test]
    fn test_to_env_map_round_trips() {
        let schema = Schema::object()
            .property("FLAGS", Schema::string_list())
            .property("PORT", Schema::number())
            .property("DEBUG", Schema::boolean())
            .optional_property("TOKEN", Schema::string());
        let env = [("FLAGS", "a;b"), ("PORT", "8080"), ("DEBUG", "true")];
        let value = parse_value(&schema, env).unwrap();

        let raw = to_env_map(&schema, value.clone()).unwrap();
        assert_eq!(raw.get("FLAGS").map(String::as_str), Some("a;b"));
        assert_eq!(raw.get("PORT").map(String::as_str), Some("8080"));
        assert_eq!(raw.get("DEBUG").map(String::as_str), Some("true"));
        assert!(!raw.contains_key("TOKEN"));
        assert_eq!(parse_value(&schema, &raw).unwrap(), value);
    }
}
