//! Aggregated, human-readable validation diagnostics
//!
//! Given the first failure reported by the check stage, [`build`] produces one
//! [`EnvError::Validation`] whose message lists every offending variable:
//!
//! ```text
//! '/NODE_ENV': Expected union value received 'staging' instead
//! > expected: development, production
//! > examples: development, production
//! ```

use crate::error::EnvError;
use crate::schema::{Kind, Schema};
use crate::validate::{display_value, ValidationFailure};
use serde_json::Value;

/// Build the aggregated error for `failure`.
///
/// Returns `Ok` with the validation error, or `Err` with a fatal error when the
/// failing schema node has a shape the diagnostics cannot describe.
pub fn build(failure: &ValidationFailure<'_>) -> Result<EnvError, EnvError> {
    let mut lines = Vec::new();
    let mut causes = Vec::new();

    if failure.is_composite() {
        for detail in failure.errors.iter().filter_map(|group| group.first()) {
            lines.push(received_line(&detail.path, &detail.message, detail.value.as_ref()));
            push_cause(&mut causes, &detail.path);
        }
    } else {
        let schema = failure.schema;
        let expected = expected_values(schema)?;

        lines.push(received_line(&failure.path, &failure.message, failure.value.as_ref()));
        if let Some(description) = schema.description() {
            lines.push(format!("> description: {description}"));
        }
        if let Some(expected) = expected {
            lines.push(format!("> expected: {}", expected.join(", ")));
        }
        if let Some(examples) = schema.examples() {
            lines.push(format!("> examples: {}", join_values(examples)));
        }
        push_cause(&mut causes, &failure.path);
    }

    Ok(EnvError::Validation {
        message: lines.join("\n"),
        causes,
    })
}

/// Values a leaf node accepts, or `None` when the kind has no enumerable set.
fn expected_values(schema: &Schema) -> Result<Option<Vec<String>>, EnvError> {
    match schema.kind() {
        Kind::Boolean => Ok(Some(vec!["true".to_string(), "false".to_string()])),
        Kind::Number | Kind::String => Ok(None),
        Kind::Union => schema
            .alternatives()
            .iter()
            .map(|alternative| match alternative.literal_value() {
                Some(constant) => Ok(display_value(constant)),
                None => Err(EnvError::fatal(format!(
                    "unsupported union alternative of kind '{}': only literal alternatives can be described",
                    alternative.kind()
                ))),
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Some),
        Kind::Transform => match schema.inner() {
            Some(inner) => expected_values(inner),
            None => Err(EnvError::fatal("transform node without inner schema")),
        },
        kind => Err(EnvError::fatal(format!("unknown kind: '{kind}'"))),
    }
}

fn received_line(path: &str, message: &str, value: Option<&Value>) -> String {
    match value {
        Some(value) => format!("'{path}': {message} received '{}' instead", display_value(value)),
        None => format!("'{path}': {message} received '' (nothing) instead"),
    }
}

fn join_values(values: &[Value]) -> String {
    values.iter().map(display_value).collect::<Vec<_>>().join(", ")
}

fn push_cause(causes: &mut Vec<String>, path: &str) {
    if !causes.iter().any(|cause| cause == path) {
        causes.push(path.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validate::errors;
    use serde_json::json;

    fn first_error(schema: &Schema, value: Value) -> EnvError {
        let failures = errors(schema, &value);
        build(&failures[0]).unwrap()
    }

    fn lines(err: &EnvError) -> Vec<String> {
        err.to_string().lines().map(str::to_string).collect()
    }

    #[test]
    fn test_boolean_lists_true_and_false() {
        let schema = Schema::object().property("DEBUG", Schema::boolean());
        let err = first_error(&schema, json!({"DEBUG": "maybe"}));

        assert_eq!(
            lines(&err),
            [
                "'/DEBUG': Expected boolean received 'maybe' instead",
                "> expected: true, false",
            ]
        );
        assert_eq!(err.causes(), ["/DEBUG".to_string()]);
    }

    #[test]
    fn test_number_has_no_expected_line() {
        let schema = Schema::object().property("FIELD_ONE", Schema::number());
        let err = first_error(&schema, json!({"FIELD_ONE": "abc"}));

        assert_eq!(
            err.to_string(),
            "'/FIELD_ONE': Expected number received 'abc' instead"
        );
    }

    #[test]
    fn test_union_lists_literals_in_order() {
        let schema = Schema::object().property(
            "NODE_ENV",
            Schema::union([Schema::literal("development"), Schema::literal("production")])
                .with_description("runtime mode")
                .with_examples(["development", "production"]),
        );
        let err = first_error(&schema, json!({"NODE_ENV": "staging"}));

        assert_eq!(
            lines(&err),
            [
                "'/NODE_ENV': Expected union value received 'staging' instead",
                "> description: runtime mode",
                "> expected: development, production",
                "> examples: development, production",
            ]
        );
    }

    #[test]
    fn test_missing_value_is_marked_nothing() {
        let schema = Schema::object()
            .property("DATABASE_URL", Schema::string().with_examples(["postgresql://localhost/db"]));
        let err = first_error(&schema, json!({}));

        assert_eq!(
            lines(&err),
            [
                "'/DATABASE_URL': Expected required property received '' (nothing) instead",
                "> examples: postgresql://localhost/db",
            ]
        );
    }

    #[test]
    fn test_transform_is_described_by_inner_kind() {
        let schema = Schema::object().property(
            "FEATURE_FLAGS",
            Schema::string_list().with_description("semicolon separated flags"),
        );
        let err = first_error(&schema, json!({}));

        assert_eq!(
            lines(&err),
            [
                "'/FEATURE_FLAGS': Expected required property received '' (nothing) instead",
                "> description: semicolon separated flags",
            ]
        );
    }

    #[test]
    fn test_composite_aggregates_every_variable() {
        let schema = Schema::object()
            .property("PORT", Schema::number().with_description("ignored in composite mode"))
            .property("DEBUG", Schema::boolean())
            .property("NAME", Schema::string());
        let err = first_error(&schema, json!({"PORT": "abc", "DEBUG": "maybe"}));

        assert_eq!(
            lines(&err),
            [
                "'/PORT': Expected number received 'abc' instead",
                "'/DEBUG': Expected boolean received 'maybe' instead",
                "'/NAME': Expected required property received '' (nothing) instead",
            ]
        );
        assert_eq!(err.causes(), ["/PORT", "/DEBUG", "/NAME"].map(String::from));
    }

    #[test]
    fn test_composite_skips_empty_groups_and_dedups_causes() {
        let schema = Schema::string();
        let detail = ValidationFailure {
            path: "/A".to_string(),
            message: "Expected string".to_string(),
            value: Some(json!(1)),
            schema: &schema,
            errors: Vec::new(),
        };
        let failure = ValidationFailure {
            path: String::new(),
            message: "Expected object properties to match schema".to_string(),
            value: None,
            schema: &schema,
            errors: vec![vec![detail.clone()], Vec::new(), vec![detail]],
        };

        let err = build(&failure).unwrap();
        assert_eq!(err.to_string().lines().count(), 2);
        assert_eq!(err.causes(), ["/A".to_string()]);
    }

    #[test]
    fn test_non_literal_union_alternative_is_fatal() {
        let schema = Schema::object()
            .property("MODE", Schema::union([Schema::literal("a"), Schema::number()]));
        let failures = errors(&schema, &json!({"MODE": "b"}));

        let err = build(&failures[0]).unwrap_err();
        assert!(err.is_fatal());
    }

    #[test]
    fn test_unknown_kind_is_fatal() {
        let schema = Schema::object().property("MODE", Schema::literal("on"));
        let failures = errors(&schema, &json!({"MODE": "off"}));

        let err = build(&failures[0]).unwrap_err();
        assert_eq!(err, EnvError::fatal("unknown kind: 'literal'"));
    }
}
