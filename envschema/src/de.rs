//! Decoding and encoding of checked values
//!
//! [`decode`] runs the transform codecs over a value that already passed
//! [`check`](crate::validate::check). [`encode`] is the inverse. The remaining
//! functions are used by `#[derive(EnvSchema)]` generated code.

use crate::error::EnvError;
use crate::schema::{Schema, Shape};
use crate::validate::check;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

/// A transform codec rejected a value.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("'{path}': {message}")]
pub struct TransformError {
    pub path: String,
    pub message: String,
    pub value: Value,
}

/// Apply transform decoders bottom-up.
pub fn decode(schema: &Schema, value: Value) -> Result<Value, TransformError> {
    decode_at(schema, value, "")
}

fn decode_at(schema: &Schema, value: Value, path: &str) -> Result<Value, TransformError> {
    match &schema.shape {
        Shape::Transform { inner, codec } => {
            let value = decode_at(inner, value, path)?;
            codec.decode(value.clone()).map_err(|message| TransformError {
                path: path.to_string(),
                message,
                value,
            })
        }
        Shape::Object(properties) => match value {
            Value::Object(mut map) => {
                for property in properties {
                    if let Some(child) = map.remove(&property.name) {
                        let child_path = format!("{path}/{}", property.name);
                        let decoded = decode_at(&property.schema, child, &child_path)?;
                        map.insert(property.name.clone(), decoded);
                    }
                }
                Ok(Value::Object(map))
            }
            other => Ok(other),
        },
        Shape::Union(alternatives) => {
            match alternatives.iter().find(|alternative| check(alternative, &value)) {
                Some(alternative) => decode_at(alternative, value, path),
                None => Ok(value),
            }
        }
        _ => Ok(value),
    }
}

/// Apply transform encoders top-down, producing a value that decodes back to
/// `value`.
pub fn encode(schema: &Schema, value: Value) -> Result<Value, TransformError> {
    encode_at(schema, value, "")
}

fn encode_at(schema: &Schema, value: Value, path: &str) -> Result<Value, TransformError> {
    match &schema.shape {
        Shape::Transform { inner, codec } => {
            let encoded = codec.encode(value.clone()).map_err(|message| TransformError {
                path: path.to_string(),
                message,
                value,
            })?;
            encode_at(inner, encoded, path)
        }
        Shape::Object(properties) => match value {
            Value::Object(mut map) => {
                for property in properties {
                    if let Some(child) = map.remove(&property.name) {
                        let child_path = format!("{path}/{}", property.name);
                        let encoded = encode_at(&property.schema, child, &child_path)?;
                        map.insert(property.name.clone(), encoded);
                    }
                }
                Ok(Value::Object(map))
            }
            other => Ok(other),
        },
        Shape::Union(alternatives) => {
            for alternative in alternatives {
                if let Ok(encoded) = encode_at(alternative, value.clone(), path) {
                    if check(alternative, &encoded) {
                        return Ok(encoded);
                    }
                }
            }
            Ok(value)
        }
        _ => Ok(value),
    }
}

/// Serialize a default value into the schema (used by macro-generated code)
#[doc(hidden)]
pub fn default_value<T: Serialize>(value: T) -> Value {
    serde_json::to_value(value).unwrap_or(Value::Null)
}

/// Raw form of a list default (used by macro-generated code)
///
/// A default given as a list of strings is joined so that it decodes back to
/// the same list. Other values are returned unchanged.
#[doc(hidden)]
pub fn list_default(value: Value) -> Value {
    match serde_json::from_value::<Vec<String>>(value.clone()) {
        Ok(items) => Value::String(crate::list::encode(&items)),
        Err(_) => value,
    }
}

/// Unwrap a decoded object (used by macro-generated code)
#[doc(hidden)]
pub fn into_object(value: Value) -> Result<Map<String, Value>, EnvError> {
    match value {
        Value::Object(map) => Ok(map),
        other => Err(EnvError::fatal(format!(
            "decoded value is not an object: {other}"
        ))),
    }
}

/// Take a decoded field out of the object (used by macro-generated code)
///
/// Absent fields are read as `null`, which deserializes into `None` for
/// `Option<T>` fields.
#[doc(hidden)]
pub fn field<T>(map: &mut Map<String, Value>, name: &str) -> Result<T, EnvError>
where
    T: DeserializeOwned,
{
    let value = take(map, name);
    serde_json::from_value(value).map_err(|e| EnvError::type_mismatch::<T>(name, e))
}

/// Take a raw field value out of the object (used by macro-generated code)
#[doc(hidden)]
pub fn take(map: &mut Map<String, Value>, name: &str) -> Value {
    map.remove(name).unwrap_or(Value::Null)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn schema() -> Schema {
        Schema::object()
            .property("FLAGS", Schema::string_list())
            .property("PORT", Schema::number())
            .property(
                "MODE",
                Schema::union([Schema::literal("a"), Schema::string_list()]),
            )
    }

    #[test]
    fn test_decode_applies_transforms() {
        let value = json!({"FLAGS": "X;y;", "PORT": 1, "MODE": "a"});
        let decoded = decode(&schema(), value).unwrap();
        assert_eq!(decoded, json!({"FLAGS": ["x", "y"], "PORT": 1, "MODE": "a"}));
    }

    #[test]
    fn test_decode_union_uses_first_matching_alternative() {
        let value = json!({"FLAGS": "", "PORT": 1, "MODE": "b;C"});
        let decoded = decode(&schema(), value).unwrap();
        assert_eq!(decoded["MODE"], json!(["b", "c"]));
        assert_eq!(decoded["FLAGS"], json!([]));
    }

    #[test]
    fn test_decode_error_carries_path() {
        let err = decode(&schema(), json!({"FLAGS": 3})).unwrap_err();
        assert_eq!(err.path, "/FLAGS");
        assert_eq!(err.value, json!(3));
    }

    #[test]
    fn test_encode_inverts_decode() {
        let decoded = json!({"FLAGS": ["x", "y"], "PORT": 1, "MODE": "a"});
        let encoded = encode(&schema(), decoded.clone()).unwrap();
        assert_eq!(encoded, json!({"FLAGS": "x;y", "PORT": 1, "MODE": "a"}));
        assert_eq!(decode(&schema(), encoded).unwrap(), decoded);
    }

    #[test]
    fn test_field_helpers() {
        let mut map = into_object(json!({"PORT": 8080, "NAME": "svc"})).unwrap();
        let port: u16 = field(&mut map, "PORT").unwrap();
        let token: Option<String> = field(&mut map, "TOKEN").unwrap();
        assert_eq!(port, 8080);
        assert_eq!(token, None);

        let err = field::<bool>(&mut map, "NAME").unwrap_err();
        assert!(err.is_fatal());
    }

    #[test]
    fn test_into_object_rejects_scalars() {
        assert!(into_object(json!("x")).is_err());
    }

    #[test]
    fn test_default_value() {
        assert_eq!(default_value(10u32), json!(10));
        assert_eq!(default_value("127.0.0.1:8080".to_string()), json!("127.0.0.1:8080"));
    }

    #[test]
    fn test_list_default_is_joined() {
        assert_eq!(list_default(json!(["a", "b"])), json!("a;b"));
        assert_eq!(list_default(json!([])), json!(""));
        assert_eq!(list_default(json!("x;y")), json!("x;y"));
    }
}
