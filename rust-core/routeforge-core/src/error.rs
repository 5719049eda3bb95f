//! # Error Handling
//!
//! Centralized error types for routeforge.
//! Uses `thiserror` for ergonomic error definitions.
//!
//! Two families live here:
//!
//! - [`Error`] - fatal problems raised while building a route (bad templates,
//!   uncompilable sub-patterns, unknown transforms) or loading configuration.
//! - [`Mismatch`] - the ordinary "this route does not apply" outcome of
//!   matching or generating. It is a value, not a fault: callers move on to
//!   the next route.

use thiserror::Error;

/// Result type alias for routeforge operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types for route construction and configuration
#[derive(Error, Debug)]
pub enum Error {
    /// A template or user-declared sub-pattern cannot be compiled
    #[error("Malformed route pattern: {pattern}: {reason}")]
    MalformedPattern {
        /// The offending template, token or regex
        pattern: String,
        /// Reason for invalidity
        reason: String,
    },

    /// A modifier or formatter refers to a transform that is not registered
    #[error("Unknown transform `{name}` for key `{key}`")]
    UnknownTransform {
        /// The route key the transform was bound to
        key: String,
        /// The transform name that failed to resolve
        name: String,
    },

    /// An HTTP method string could not be recognized
    #[error("Invalid HTTP method: {method}")]
    InvalidMethod {
        /// The rejected method string
        method: String,
    },

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub(crate) fn malformed(pattern: impl Into<String>, reason: impl ToString) -> Self {
        Self::MalformedPattern {
            pattern: pattern.into(),
            reason: reason.to_string(),
        }
    }
}

/// Why a route declined a path or a parameter set
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Mismatch {
    /// The path does not satisfy the compiled pattern
    #[error("path does not satisfy the route pattern")]
    NoStructuralMatch,

    /// A `meta` or `match` requirement failed
    #[error("constraint `{key}` is not satisfied")]
    ConstraintMismatch {
        /// The constrained parameter
        key: String,
    },

    /// A declared key could not be resolved from options or defaults
    #[error("no value for declared key `{key}`")]
    MissingKey {
        /// The unresolved key
        key: String,
    },

    /// An option is not covered by `match`, the route keys or the scope
    #[error("option `{key}` is not accepted by this route")]
    SurplusKey {
        /// The surplus option name
        key: String,
    },

    /// A value fails the sub-pattern declared for its key
    #[error("value for `{key}` violates its sub-pattern")]
    SubPatternViolation {
        /// The key whose value was rejected
        key: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_malformed_pattern_error() {
        let err = Error::malformed("/{:id:[0-9+}", "unclosed character class");
        let message = err.to_string();
        assert!(message.contains("/{:id:[0-9+}"));
        assert!(message.contains("unclosed character class"));
    }

    #[test]
    fn test_unknown_transform_error() {
        let err = Error::UnknownTransform {
            key: "controller".to_string(),
            name: "shout".to_string(),
        };
        assert!(err.to_string().contains("shout"));
        assert!(err.to_string().contains("controller"));
    }

    #[test]
    fn test_mismatch_names_key() {
        let m = Mismatch::SurplusKey {
            key: "page".to_string(),
        };
        assert!(m.to_string().contains("page"));
        assert_eq!(
            Mismatch::NoStructuralMatch.to_string(),
            "path does not satisfy the route pattern"
        );
    }
}
