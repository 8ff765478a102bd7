//! Declarative schema descriptors
//!
//! A [`Schema`] is an immutable tree describing the expected shape of the
//! configuration. Every node carries an explicit [`Kind`] tag set when the node
//! is constructed, plus optional metadata (`default`, `description`,
//! `examples`) used by the parser and by the diagnostics.
//!
//! ```rust
//! use envschema::Schema;
//!
//! let schema = Schema::object()
//!     .property(
//!         "NODE_ENV",
//!         Schema::union([Schema::literal("development"), Schema::literal("production")])
//!             .with_default("development"),
//!     )
//!     .property("SERVER_PORT", Schema::integer().with_default(2049))
//!     .property("FEATURE_FLAGS", Schema::string_list().with_default(""));
//!
//! assert_eq!(schema.properties().len(), 3);
//! ```

use crate::list::DelimitedList;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Category of a schema node.
///
/// This is a closed set. Code that needs to branch on the category of a node
/// matches on this enum directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    String,
    Number,
    Boolean,
    Literal,
    Union,
    Object,
    Transform,
}

impl Kind {
    /// Lowercase name of the kind
    pub fn as_str(&self) -> &'static str {
        match self {
            Kind::String => "string",
            Kind::Number => "number",
            Kind::Boolean => "boolean",
            Kind::Literal => "literal",
            Kind::Union => "union",
            Kind::Object => "object",
            Kind::Transform => "transform",
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Paired decode/encode functions attached to a transform node.
///
/// `decode` turns a checked value of the inner schema into its final
/// representation. `encode` is the inverse, used when re-serializing.
pub trait Codec: fmt::Debug + Send + Sync {
    /// Convert a validated raw value into its decoded form
    fn decode(&self, value: Value) -> Result<Value, String>;

    /// Convert a decoded value back into the raw form
    fn encode(&self, value: Value) -> Result<Value, String>;
}

/// Named child of an object node.
#[derive(Debug, Clone)]
pub struct Property {
    pub(crate) name: String,
    pub(crate) schema: Schema,
    pub(crate) optional: bool,
}

impl Property {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Optional properties may be absent without failing the check.
    pub fn is_optional(&self) -> bool {
        self.optional
    }
}

#[derive(Debug, Clone)]
pub(crate) enum Shape {
    String {
        min_length: Option<usize>,
        max_length: Option<usize>,
    },
    Number {
        minimum: Option<f64>,
        maximum: Option<f64>,
        integer: bool,
        range: Option<(i128, i128)>,
    },
    Boolean,
    Literal(Value),
    Union(Vec<Schema>),
    Object(Vec<Property>),
    Transform {
        inner: Box<Schema>,
        codec: Arc<dyn Codec>,
    },
}

/// Node of a schema tree.
///
/// Schemas are cheap to clone and safe to share between threads.
#[derive(Debug, Clone)]
pub struct Schema {
    pub(crate) shape: Shape,
    default: Option<Value>,
    description: Option<String>,
    examples: Option<Vec<Value>>,
}

impl Schema {
    fn from_shape(shape: Shape) -> Self {
        Self {
            shape,
            default: None,
            description: None,
            examples: None,
        }
    }

    pub fn string() -> Self {
        Self::from_shape(Shape::String {
            min_length: None,
            max_length: None,
        })
    }

    pub fn number() -> Self {
        Self::from_shape(Shape::Number {
            minimum: None,
            maximum: None,
            integer: false,
            range: None,
        })
    }

    /// Number node that only accepts integral values.
    ///
    /// The node's kind is still [`Kind::Number`].
    pub fn integer() -> Self {
        Self::from_shape(Shape::Number {
            minimum: None,
            maximum: None,
            integer: true,
            range: None,
        })
    }

    pub fn boolean() -> Self {
        Self::from_shape(Shape::Boolean)
    }

    /// Node matching exactly one constant (string, number or boolean).
    pub fn literal(value: impl Into<Value>) -> Self {
        Self::from_shape(Shape::Literal(value.into()))
    }

    /// Node matching any of the alternatives, tried in declaration order.
    pub fn union(alternatives: impl IntoIterator<Item = Schema>) -> Self {
        Self::from_shape(Shape::Union(alternatives.into_iter().collect()))
    }

    /// Object node without properties; add them with [`Schema::property`].
    pub fn object() -> Self {
        Self::from_shape(Shape::Object(Vec::new()))
    }

    /// Node validated as `inner` and decoded through `codec`.
    pub fn transform(inner: Schema, codec: impl Codec + 'static) -> Self {
        Self::from_shape(Shape::Transform {
            inner: Box::new(inner),
            codec: Arc::new(codec),
        })
    }

    /// Semicolon-separated list of lowercase tokens.
    ///
    /// See [`DelimitedList`] for the decoding rules.
    pub fn string_list() -> Self {
        Self::transform(Self::string(), DelimitedList::default())
    }

    /// List of lowercase tokens separated by `separator`.
    pub fn delimited(separator: char) -> Self {
        Self::transform(Self::string(), DelimitedList::new(separator))
    }

    /// Add a required property. Ignored unless this is an object node.
    pub fn property(self, name: impl Into<String>, schema: Schema) -> Self {
        self.push_property(name.into(), schema, false)
    }

    /// Add a property that may be absent. Ignored unless this is an object node.
    pub fn optional_property(self, name: impl Into<String>, schema: Schema) -> Self {
        self.push_property(name.into(), schema, true)
    }

    fn push_property(mut self, name: String, schema: Schema, optional: bool) -> Self {
        if let Shape::Object(properties) = &mut self.shape {
            properties.retain(|p| p.name != name);
            properties.push(Property {
                name,
                schema,
                optional,
            });
        }
        self
    }

    /// Value injected when the variable is absent.
    ///
    /// Defaults are injected before coercion, so they may be given either in
    /// raw string form or already typed.
    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_examples<I, V>(mut self, examples: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.examples = Some(examples.into_iter().map(Into::into).collect());
        self
    }

    /// Minimum length in characters. Ignored unless this is a string node.
    pub fn min_length(mut self, length: usize) -> Self {
        if let Shape::String { min_length, .. } = &mut self.shape {
            *min_length = Some(length);
        }
        self
    }

    /// Maximum length in characters. Ignored unless this is a string node.
    pub fn max_length(mut self, length: usize) -> Self {
        if let Shape::String { max_length, .. } = &mut self.shape {
            *max_length = Some(length);
        }
        self
    }

    /// Inclusive lower bound. Ignored unless this is a number node.
    pub fn minimum(mut self, bound: f64) -> Self {
        if let Shape::Number { minimum, .. } = &mut self.shape {
            *minimum = Some(bound);
        }
        self
    }

    /// Inclusive upper bound. Ignored unless this is a number node.
    pub fn maximum(mut self, bound: f64) -> Self {
        if let Shape::Number { maximum, .. } = &mut self.shape {
            *maximum = Some(bound);
        }
        self
    }

    /// Inclusive integer bounds, compared without going through `f64`.
    ///
    /// Decoded integers are at most 64 bits wide, so the bounds are clamped to
    /// `i64::MIN..=u64::MAX`. Ignored unless this is a number node.
    pub fn integer_range(mut self, low: i128, high: i128) -> Self {
        if let Shape::Number { range, .. } = &mut self.shape {
            *range = Some((
                low.max(i128::from(i64::MIN)),
                high.min(i128::from(u64::MAX)),
            ));
        }
        self
    }

    pub fn kind(&self) -> Kind {
        match &self.shape {
            Shape::String { .. } => Kind::String,
            Shape::Number { .. } => Kind::Number,
            Shape::Boolean => Kind::Boolean,
            Shape::Literal(_) => Kind::Literal,
            Shape::Union(_) => Kind::Union,
            Shape::Object(_) => Kind::Object,
            Shape::Transform { .. } => Kind::Transform,
        }
    }

    pub fn default_value(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn examples(&self) -> Option<&[Value]> {
        self.examples.as_deref()
    }

    /// Constant of a literal node
    pub fn literal_value(&self) -> Option<&Value> {
        match &self.shape {
            Shape::Literal(value) => Some(value),
            _ => None,
        }
    }

    /// Alternatives of a union node; empty for other kinds.
    pub fn alternatives(&self) -> &[Schema] {
        match &self.shape {
            Shape::Union(alternatives) => alternatives,
            _ => &[],
        }
    }

    /// Properties of an object node; empty for other kinds.
    pub fn properties(&self) -> &[Property] {
        match &self.shape {
            Shape::Object(properties) => properties,
            _ => &[],
        }
    }

    /// Inner schema of a transform node
    pub fn inner(&self) -> Option<&Schema> {
        match &self.shape {
            Shape::Transform { inner, .. } => Some(inner),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_kind_tags() {
        assert_eq!(Schema::string().kind(), Kind::String);
        assert_eq!(Schema::integer().kind(), Kind::Number);
        assert_eq!(Schema::literal(true).kind(), Kind::Literal);
        assert_eq!(Schema::string_list().kind(), Kind::Transform);
        assert_eq!(
            Schema::string_list().inner().map(Schema::kind),
            Some(Kind::String)
        );
        assert_eq!(Kind::Union.to_string(), "union");
    }

    #[test]
    fn test_metadata() {
        let schema = Schema::number()
            .with_default(2049)
            .with_description("listen port")
            .with_examples([3000, 5000]);

        assert_eq!(schema.default_value(), Some(&json!(2049)));
        assert_eq!(schema.description(), Some("listen port"));
        assert_eq!(schema.examples(), Some(&[json!(3000), json!(5000)][..]));
    }

    #[test]
    fn test_properties_keep_declaration_order() {
        let schema = Schema::object()
            .property("B", Schema::string())
            .optional_property("A", Schema::number())
            .property("C", Schema::boolean());

        let names: Vec<_> = schema.properties().iter().map(Property::name).collect();
        assert_eq!(names, ["B", "A", "C"]);
        assert!(schema.properties()[1].is_optional());
    }

    #[test]
    fn test_redeclared_property_replaces_previous() {
        let schema = Schema::object()
            .property("PORT", Schema::string())
            .property("PORT", Schema::number());

        assert_eq!(schema.properties().len(), 1);
        assert_eq!(schema.properties()[0].schema().kind(), Kind::Number);
    }

    #[test]
    fn test_kind_specific_builders_ignore_other_kinds() {
        let schema = Schema::boolean().min_length(3).property("X", Schema::string());
        assert_eq!(schema.kind(), Kind::Boolean);
        assert!(schema.properties().is_empty());
    }

    #[test]
    fn test_integer_range_is_clamped_to_64_bits() {
        let schema = Schema::integer().integer_range(i128::MIN, i128::MAX);
        let Shape::Number { range, .. } = &schema.shape else {
            panic!("expected a number node");
        };
        assert_eq!(
            *range,
            Some((i128::from(i64::MIN), i128::from(u64::MAX)))
        );
    }

    #[test]
    fn test_schema_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Schema>();
    }
}
