//! Schema engine: clean, default, convert, check and error reporting
//!
//! These primitives operate on an owned `serde_json::Value` working copy and
//! never touch the schema. The parser runs them in a fixed order; they are
//! public so a caller can drive the stages by hand.

use crate::schema::{Property, Schema, Shape};
use serde_json::{Map, Number, Value};

/// Failure reported by [`errors`].
///
/// A failure with a non-empty `errors` list is composite: each entry is the
/// failure list of one offending variable.
#[derive(Debug, Clone)]
pub struct ValidationFailure<'s> {
    /// JSON-pointer style path, e.g. `/DATABASE_URL`
    pub path: String,
    pub message: String,
    /// Offending value; `None` when the variable is absent
    pub value: Option<Value>,
    /// Schema node that rejected the value
    pub schema: &'s Schema,
    pub errors: Vec<Vec<ValidationFailure<'s>>>,
}

impl<'s> ValidationFailure<'s> {
    fn leaf(path: &str, message: impl Into<String>, value: Option<&Value>, schema: &'s Schema) -> Self {
        Self {
            path: path.to_string(),
            message: message.into(),
            value: value.cloned(),
            schema,
            errors: Vec::new(),
        }
    }

    pub fn is_composite(&self) -> bool {
        !self.errors.is_empty()
    }
}

/// Remove every key the schema does not declare. Never fails.
pub fn clean(schema: &Schema, value: &mut Value) {
    match (&schema.shape, value) {
        (Shape::Object(properties), Value::Object(map)) => {
            map.retain(|key, _| properties.iter().any(|p| &p.name == key));
            for property in properties {
                if let Some(child) = map.get_mut(&property.name) {
                    clean(&property.schema, child);
                }
            }
        }
        (Shape::Transform { inner, .. }, value) => clean(inner, value),
        _ => {}
    }
}

/// Inject declared defaults for absent properties.
pub fn apply_defaults(schema: &Schema, value: &mut Value) {
    match (&schema.shape, value) {
        (Shape::Object(properties), Value::Object(map)) => {
            for property in properties {
                match map.get_mut(&property.name) {
                    Some(child) => apply_defaults(&property.schema, child),
                    None => {
                        if let Some(default) = property.schema.default_value() {
                            map.insert(property.name.clone(), default.clone());
                        }
                    }
                }
            }
        }
        (Shape::Transform { inner, .. }, value) => apply_defaults(inner, value),
        _ => {}
    }
}

/// Coerce raw values toward the declared primitive types.
///
/// Values that cannot be coerced are returned unchanged so that [`check`]
/// reports them.
pub fn convert(schema: &Schema, value: Value) -> Value {
    match &schema.shape {
        Shape::String { .. } => convert_string(value),
        Shape::Number { .. } => convert_number(value),
        Shape::Boolean => convert_boolean(value),
        Shape::Literal(constant) => match constant {
            Value::String(_) => convert_string(value),
            Value::Number(_) => convert_number(value),
            Value::Bool(_) => convert_boolean(value),
            _ => value,
        },
        Shape::Union(alternatives) => {
            for alternative in alternatives {
                let converted = convert(alternative, value.clone());
                if check(alternative, &converted) {
                    return converted;
                }
            }
            value
        }
        Shape::Object(properties) => convert_object(schema, properties, value),
        Shape::Transform { inner, .. } => convert(inner, value),
    }
}

fn convert_object(schema: &Schema, properties: &[Property], value: Value) -> Value {
    let mut value = match value {
        // Nested objects arrive as JSON text in a single variable
        Value::String(text) if text.trim_start().starts_with('{') => {
            match serde_json::from_str::<Value>(&text) {
                Ok(mut parsed @ Value::Object(_)) => {
                    clean(schema, &mut parsed);
                    apply_defaults(schema, &mut parsed);
                    parsed
                }
                _ => Value::String(text),
            }
        }
        other => other,
    };

    if let Value::Object(map) = &mut value {
        for property in properties {
            if let Some(child) = map.remove(&property.name) {
                map.insert(property.name.clone(), convert(&property.schema, child));
            }
        }
    }
    value
}

fn convert_string(value: Value) -> Value {
    match value {
        Value::Number(n) => Value::String(n.to_string()),
        Value::Bool(b) => Value::String(b.to_string()),
        other => other,
    }
}

fn convert_number(value: Value) -> Value {
    match value {
        Value::String(text) => parse_number(&text).unwrap_or(Value::String(text)),
        Value::Bool(b) => Value::from(u8::from(b)),
        other => other,
    }
}

fn parse_number(text: &str) -> Option<Value> {
    let text = text.trim();
    if let Ok(i) = text.parse::<i64>() {
        return Some(Value::from(i));
    }
    if let Ok(u) = text.parse::<u64>() {
        return Some(Value::from(u));
    }
    let f = text.parse::<f64>().ok().filter(|f| f.is_finite())?;
    // Keep integral values integral so they deserialize into integer types
    if f.fract() == 0.0 && f.abs() < 9_007_199_254_740_992.0 {
        return Some(Value::from(f as i64));
    }
    Number::from_f64(f).map(Value::Number)
}

fn convert_boolean(value: Value) -> Value {
    match value {
        Value::String(text) => match text.trim().to_ascii_lowercase().as_str() {
            "true" | "1" => Value::Bool(true),
            "false" | "0" => Value::Bool(false),
            _ => Value::String(text),
        },
        Value::Number(n) if n.as_f64() == Some(1.0) => Value::Bool(true),
        Value::Number(n) if n.as_f64() == Some(0.0) => Value::Bool(false),
        other => other,
    }
}

/// Whether `value` satisfies `schema`.
pub fn check(schema: &Schema, value: &Value) -> bool {
    collect(schema, Some(value), "").is_empty()
}

/// Failures of `value` against `schema`, in schema declaration order.
///
/// When two or more properties of an object fail, they are reported as one
/// composite failure at the object's path.
pub fn errors<'s>(schema: &'s Schema, value: &Value) -> Vec<ValidationFailure<'s>> {
    collect(schema, Some(value), "")
}

fn collect<'s>(schema: &'s Schema, value: Option<&Value>, path: &str) -> Vec<ValidationFailure<'s>> {
    let Some(value) = value else {
        return vec![ValidationFailure::leaf(
            path,
            "Expected required property",
            None,
            schema,
        )];
    };
    let fail = |message: String| vec![ValidationFailure::leaf(path, message, Some(value), schema)];

    match &schema.shape {
        Shape::String {
            min_length,
            max_length,
        } => {
            let Value::String(text) = value else {
                return fail("Expected string".to_string());
            };
            let length = text.chars().count();
            if let Some(min) = min_length.filter(|min| length < *min) {
                return fail(format!("Expected string length greater or equal to {min}"));
            }
            if let Some(max) = max_length.filter(|max| length > *max) {
                return fail(format!("Expected string length less or equal to {max}"));
            }
            Vec::new()
        }
        Shape::Number {
            minimum,
            maximum,
            integer,
            range,
        } => {
            let expected = if *integer { "Expected integer" } else { "Expected number" };
            let Some(n) = value.as_f64() else {
                return fail(expected.to_string());
            };
            if *integer && n.fract() != 0.0 {
                return fail(expected.to_string());
            }
            if let Some((low, high)) = range {
                match exact_integer(value) {
                    Some(i) if i < *low => {
                        return fail(format!("Expected number to be greater or equal to {low}"))
                    }
                    Some(i) if i > *high => {
                        return fail(format!("Expected number to be less or equal to {high}"))
                    }
                    Some(_) => {}
                    None if n < 0.0 => {
                        return fail(format!("Expected number to be greater or equal to {low}"))
                    }
                    None => return fail(format!("Expected number to be less or equal to {high}")),
                }
            }
            if let Some(min) = minimum.filter(|min| n < *min) {
                return fail(format!("Expected number to be greater or equal to {min}"));
            }
            if let Some(max) = maximum.filter(|max| n > *max) {
                return fail(format!("Expected number to be less or equal to {max}"));
            }
            Vec::new()
        }
        Shape::Boolean => match value {
            Value::Bool(_) => Vec::new(),
            _ => fail("Expected boolean".to_string()),
        },
        Shape::Literal(constant) => {
            if literal_matches(constant, value) {
                Vec::new()
            } else {
                fail(format!("Expected '{}'", display_value(constant)))
            }
        }
        Shape::Union(alternatives) => {
            if alternatives
                .iter()
                .any(|alternative| collect(alternative, Some(value), path).is_empty())
            {
                Vec::new()
            } else {
                fail("Expected union value".to_string())
            }
        }
        Shape::Object(properties) => {
            let Value::Object(map) = value else {
                return fail("Expected object".to_string());
            };
            collect_object(schema, properties, map, value, path)
        }
        Shape::Transform { inner, .. } => {
            let mut failures = collect(inner, Some(value), path);
            // Report against the transform node so its metadata reaches the diagnostics
            for failure in &mut failures {
                if std::ptr::eq(failure.schema, &**inner) {
                    failure.schema = schema;
                }
            }
            failures
        }
    }
}

fn collect_object<'s>(
    schema: &'s Schema,
    properties: &'s [Property],
    map: &Map<String, Value>,
    value: &Value,
    path: &str,
) -> Vec<ValidationFailure<'s>> {
    let mut groups: Vec<Vec<ValidationFailure<'s>>> = properties
        .iter()
        .filter(|property| !(property.optional && !map.contains_key(&property.name)))
        .map(|property| {
            let child_path = format!("{path}/{}", property.name);
            collect(&property.schema, map.get(&property.name), &child_path)
        })
        .filter(|group| !group.is_empty())
        .collect();

    match groups.len() {
        0 => Vec::new(),
        1 => groups.pop().unwrap_or_default(),
        _ => {
            let mut flattened = Vec::with_capacity(groups.len());
            for mut group in groups {
                if group.len() == 1 && group[0].is_composite() {
                    flattened.append(&mut group[0].errors);
                } else {
                    flattened.push(group);
                }
            }
            vec![ValidationFailure {
                path: path.to_string(),
                message: "Expected object properties to match schema".to_string(),
                value: Some(value.clone()),
                schema,
                errors: flattened,
            }]
        }
    }
}

/// Exact integer value of a JSON number.
///
/// Floats only qualify below 2^53, where they are still exact; larger ones
/// cannot be decoded into an integer type.
fn exact_integer(value: &Value) -> Option<i128> {
    if let Some(i) = value.as_i64() {
        return Some(i128::from(i));
    }
    if let Some(u) = value.as_u64() {
        return Some(i128::from(u));
    }
    value
        .as_f64()
        .filter(|f| f.fract() == 0.0 && f.abs() < 9_007_199_254_740_992.0)
        .map(|f| f as i128)
}

fn literal_matches(constant: &Value, value: &Value) -> bool {
    match (constant, value) {
        (Value::Number(a), Value::Number(b)) => a.as_f64() == b.as_f64(),
        _ => constant == value,
    }
}

/// Render a value the way diagnostics quote it: strings verbatim, everything
/// else as compact JSON.
pub(crate) fn display_value(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}
