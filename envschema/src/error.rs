//! Error types for schema-validated environment parsing

/// Errors that can occur when parsing an environment against a schema.
///
/// The two variants separate "the environment is wrong" from "the program is
/// wrong":
/// - [`EnvError::Validation`] is recoverable. The caller decides whether to abort
///   startup or do something else.
/// - [`EnvError::Fatal`] signals a malformed schema or a broken engine contract.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EnvError {
    /// The schema or the validation engine violated its own contract.
    ///
    /// Occurs for unsupported schema shapes met while building diagnostics
    /// (unknown kinds, non-literal union alternatives), when a failed check
    /// yields no failure detail, or when the decoded object does not fit the
    /// requested Rust type.
    #[error("fatal: {reason}")]
    Fatal {
        /// Description of the defect
        reason: String,
    },

    /// The environment does not satisfy the schema.
    ///
    /// The display text is the full multi-line diagnostic. The offending
    /// variable paths are kept apart in `causes`.
    ///
    /// Each line reads `'<path>': <message> received '<value>' instead`. An
    /// absent variable renders as `received '' (nothing) instead`. The
    /// `> expected:` and `> examples:` lines join their values with `, `.
    #[error("{message}")]
    Validation {
        /// Diagnostic lines joined with `\n`
        message: String,
        /// Unique failing variable paths, in the order they were reported
        causes: Vec<String>,
    },
}

impl EnvError {
    /// Create a fatal defect error
    pub fn fatal(reason: impl Into<String>) -> Self {
        Self::Fatal {
            reason: reason.into(),
        }
    }

    /// Failing variable paths; empty for fatal errors.
    pub fn causes(&self) -> &[String] {
        match self {
            Self::Validation { causes, .. } => causes,
            Self::Fatal { .. } => &[],
        }
    }

    /// Whether this error is a defect rather than a bad environment
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Fatal { .. })
    }

    /// Create a field-level type mismatch error (used by macro-generated code)
    #[doc(hidden)]
    pub fn type_mismatch<T>(name: &str, message: impl std::fmt::Display) -> Self {
        Self::fatal(format!(
            "decoded value of '{name}' does not fit {}: {message}",
            std::any::type_name::<T>()
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_displays_message_only() {
        let err = EnvError::Validation {
            message: "'/PORT': Expected number received 'abc' instead".to_string(),
            causes: vec!["/PORT".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "'/PORT': Expected number received 'abc' instead"
        );
        assert_eq!(err.causes(), ["/PORT".to_string()]);
        assert!(!err.is_fatal());
    }

    #[test]
    fn test_fatal_has_no_causes() {
        let err = EnvError::fatal("unknown kind: 'object'");
        assert!(err.is_fatal());
        assert!(err.causes().is_empty());
        assert_eq!(err.to_string(), "fatal: unknown kind: 'object'");
    }

    #[test]
    fn test_type_mismatch_contains_type_info() {
        let err = EnvError::type_mismatch::<u16>("PORT", "invalid type");
        match err {
            EnvError::Fatal { reason } => {
                assert!(reason.contains("u16"));
                assert!(reason.contains("PORT"));
            }
            _ => panic!("Expected Fatal error"),
        }
    }
}
