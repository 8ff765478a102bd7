//! Schema-validated environment variable parsing
//!
//! `envschema` turns an untyped, string-keyed environment into a typed
//! configuration object. Variables are validated and coerced against a
//! declarative [`Schema`]; when they do not fit, every offending variable is
//! reported in one aggregated, human-readable error.
//!
//! # Features
//!
//! - **Declarative**: build a [`Schema`] by hand or with `#[derive(EnvSchema)]`
//! - **Defaults and coercion**: absent variables get declared defaults, strings
//!   are coerced to numbers and booleans
//! - **Delimited lists**: `FLAGS=a;B;;c` decodes to `["a", "b", "c"]`
//! - **Readable diagnostics**: expected values, descriptions and examples for
//!   each failing variable
//! - **Explicit input**: the environment is always passed in, never read
//!   behind your back
//!
//! # Pipeline
//!
//! Parsing runs clean → default → convert → check over an owned copy of the
//! input, then decodes on success. The caller gets either a fully valid
//! object or an [`EnvError`], never a partially populated value.
//!
//! # Example
//!
//! ```rust
//! use envschema::{parse_value, Schema};
//!
//! let schema = Schema::object()
//!     .property("DEBUG", Schema::boolean().with_default(true))
//!     .property("SERVER_PORT", Schema::integer().with_default(2049))
//!     .property("FEATURE_FLAGS", Schema::string_list());
//!
//! let env = [("FEATURE_FLAGS", "Beta;metrics;"), ("UNRELATED", "ignored")];
//! let value = parse_value(&schema, env)?;
//!
//! assert_eq!(value["DEBUG"], true);
//! assert_eq!(value["SERVER_PORT"], 2049);
//! assert_eq!(value["FEATURE_FLAGS"], serde_json::json!(["beta", "metrics"]));
//! # Ok::<(), envschema::EnvError>(())
//! ```
//!
//! # Diagnostics
//!
//! ```rust
//! use envschema::Schema;
//!
//! let schema = Schema::object().property(
//!     "NODE_ENV",
//!     Schema::union([Schema::literal("development"), Schema::literal("production")]),
//! );
//!
//! let err = envschema::parse_value(&schema, [("NODE_ENV", "staging")]).unwrap_err();
//! assert_eq!(
//!     err.to_string(),
//!     "'/NODE_ENV': Expected union value received 'staging' instead\n\
//!      > expected: development, production"
//! );
//! assert_eq!(err.causes(), ["/NODE_ENV".to_string()]);
//! ```
//!
//! # Deriving a schema
//!
//! ```rust
//! use envschema::EnvSchema;
//!
//! #[derive(Debug, EnvSchema)]
//! struct Config {
//!     /// Connection string of the primary database
//!     #[env(min_length = 12)]
//!     pub database_url: String,
//!
//!     #[env(default = 8080)]
//!     pub port: u16,
//!
//!     #[env(list, default = "")]
//!     pub feature_flags: Vec<String>,
//! }
//!
//! # fn main() -> anyhow::Result<()> {
//! let config = Config::from_env_map([("DATABASE_URL", "postgres://localhost/db")])?;
//! assert_eq!(config.port, 8080);
//! assert!(config.feature_flags.is_empty());
//! # Ok(())
//! # }
//! ```

#[doc(hidden)]
pub mod de;

pub mod diagnostics;
mod error;
pub mod list;
mod parser;
mod schema;
pub mod validate;

pub use envschema_derive::EnvSchema;
pub use error::EnvError;
pub use list::DelimitedList;
pub use parser::{encode_value, parse_env, parse_value, process_env, to_env_map, RawValue};
pub use schema::{Codec, Kind, Property, Schema};

// Re-export for macro-generated code
#[doc(hidden)]
pub use serde_json;

/// Types that describe their own environment schema.
///
/// Usually implemented with `#[derive(EnvSchema)]`.
pub trait EnvSchema: Sized {
    /// Schema of the environment this type is parsed from
    fn schema() -> Schema;

    /// Build the value from a decoded object produced by [`parse_value`]
    ///
    /// # Errors
    ///
    /// Returns [`EnvError::Fatal`] when the decoded object does not fit the type.
    fn from_decoded(value: serde_json::Value) -> Result<Self, EnvError>;

    /// Parse an explicit environment mapping.
    fn from_env_map<I, K, V>(env: I) -> Result<Self, EnvError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: RawValue,
    {
        let value = parse_value(&Self::schema(), env)?;
        Self::from_decoded(value)
    }

    /// Parse a snapshot of the process environment.
    ///
    /// # Errors
    ///
    /// - Variables do not satisfy the schema
    /// - The schema has a shape the diagnostics cannot describe
    fn from_env() -> Result<Self, EnvError> {
        Self::from_env_map(process_env())
    }
}
