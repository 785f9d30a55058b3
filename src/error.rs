// ABOUTME: Error taxonomy for the tokenizer, parser and evaluator

use crate::value::Value;
use thiserror::Error;

// ===== Arity constant strings (eliminates allocations in error paths) =====
pub const ARITY_ONE: &str = "1";
pub const ARITY_TWO: &str = "2";
pub const ARITY_THREE: &str = "3";
pub const ARITY_AT_LEAST_ONE: &str = "at least 1";

/// A value-or-name a binding-target error is anchored on.
#[derive(Debug, Clone, PartialEq)]
pub enum BindingTargetRef {
    Name(String),
    Expression(String),
}

impl std::fmt::Display for BindingTargetRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BindingTargetRef::Name(n) => write!(f, "\"{n}\""),
            BindingTargetRef::Expression(e) => write!(f, "{e}"),
        }
    }
}

#[derive(Error, Debug, Clone)]
pub enum EvalError {
    /// Tokenizer/parser failure. Carries the offset of the offending character.
    #[error("{description} at {position}")]
    SyntaxError { position: usize, description: String },

    /// Unresolved identifier lookup.
    #[error("undefined name: {0}")]
    NameError(String),

    /// Attribute not found on a value, or an attribute operation the value
    /// system rejected.
    #[error("'{attribute}' not found on {object}")]
    AttributeError { object: String, attribute: String },

    /// Attempt to bind/unbind a keyword, rebind a constant, use an
    /// attribute where disallowed, use a nested target where disallowed,
    /// or bind varargs to an unsuitable slot.
    #[error("{}", format_binding_target_error(.target, .why))]
    InvalidBindingTargetError {
        target: BindingTargetRef,
        why: Option<String>,
    },

    /// Structural mismatch: too many/too few values, no suitable overload,
    /// variadic rebinding attempted.
    #[error("{0}")]
    InvalidBindingError(String),

    /// A value is not of the shape an operation required.
    #[error("{0}")]
    ValueError(String),

    /// Wrong argument count for a special form.
    #[error("{}", format_arity_error(.what, .expected, .actual))]
    ArityError {
        what: String,
        expected: Option<String>,
        actual: Option<usize>,
    },

    /// Reserved for context-specific keyword misuse.
    #[error("invalid keyword usage")]
    InvalidKeywordUsageError,

    /// A value explicitly raised via the `raise` predefined callable. Carries
    /// the raised value itself (not just its rendering) so `run-catching`'s
    /// handler receives the original value, per spec §7 "Recoverable vs
    /// fatal".
    #[error("raised: {0:?}")]
    Raised(Value),

    /// A host collaborator rejected an operation outside the core's
    /// vocabulary (e.g. module not found, call on a non-callable).
    #[error("{0}")]
    HostError(String),

    /// Wraps the originating error plus the position of the expression
    /// whose evaluation surfaced it.
    #[error("{cause} at {position}")]
    EvaluationError {
        cause: Box<EvalError>,
        position: usize,
    },
}

fn format_binding_target_error(target: &BindingTargetRef, why: &Option<String>) -> String {
    let mut prefix = why.clone().unwrap_or_else(|| "cannot bind to".to_string());
    if !prefix.ends_with(' ') {
        prefix.push(' ');
    }
    format!("{prefix}{target}")
}

fn format_arity_error(what: &str, expected: &Option<String>, actual: &Option<usize>) -> String {
    match (expected, actual) {
        (Some(e), Some(a)) => format!("{what}: expected {e} argument(s), got {a}"),
        (Some(e), None) => format!("{what}: expected {e} argument(s)"),
        (None, Some(a)) => format!("{what}: got {a} argument(s)"),
        (None, None) => what.to_string(),
    }
}

impl EvalError {
    pub fn syntax(position: usize, description: impl Into<String>) -> Self {
        EvalError::SyntaxError {
            position,
            description: description.into(),
        }
    }

    pub fn invalid_binding_target(target: impl Into<String>, why: impl Into<String>) -> Self {
        EvalError::InvalidBindingTargetError {
            target: BindingTargetRef::Name(target.into()),
            why: Some(why.into()),
        }
    }

    pub fn invalid_binding_target_expr(target: impl Into<String>, why: impl Into<String>) -> Self {
        EvalError::InvalidBindingTargetError {
            target: BindingTargetRef::Expression(target.into()),
            why: Some(why.into()),
        }
    }

    pub fn arity(what: impl Into<String>, expected: impl Into<String>, actual: usize) -> Self {
        EvalError::ArityError {
            what: what.into(),
            expected: Some(expected.into()),
            actual: Some(actual),
        }
    }

    /// Wraps a non-`EvaluationError` as an `EvaluationError` anchored at
    /// `position`. A pre-tagged `EvaluationError` bubbles unchanged, per
    /// spec §7's propagation policy.
    pub fn at_position(self, position: usize) -> Self {
        match self {
            EvalError::EvaluationError { .. } => self,
            other => EvalError::EvaluationError {
                cause: Box::new(other),
                position,
            },
        }
    }

    /// Re-anchors an already-tagged `EvaluationError` at a new (outer,
    /// call-site) position, used by `Symbolic` application re-entry so
    /// the reported position is the call site, not the callee's body.
    pub fn rethrow_at_call_site(self, call_site: usize) -> Self {
        match self {
            EvalError::EvaluationError { cause, .. } => EvalError::EvaluationError {
                cause,
                position: call_site,
            },
            other => other.at_position(call_site),
        }
    }

    /// Unwraps an `EvaluationError` into its `(cause, position)`, for
    /// host-level drivers that want to render the originating error.
    pub fn unwrap_evaluation(self) -> (EvalError, usize) {
        match self {
            EvalError::EvaluationError { cause, position } => (*cause, position),
            other => (other, 0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arity_error_formats_with_both_counts() {
        let e = EvalError::arity("if", "3", 2);
        assert_eq!(e.to_string(), "if: expected 3 argument(s), got 2");
    }

    #[test]
    fn invalid_binding_target_defaults_prefix() {
        let e = EvalError::InvalidBindingTargetError {
            target: BindingTargetRef::Name("None".to_string()),
            why: None,
        };
        assert_eq!(e.to_string(), "cannot bind to \"None\"");
    }

    #[test]
    fn evaluation_error_wraps_once() {
        let inner = EvalError::NameError("x".to_string());
        let wrapped = inner.at_position(5);
        let wrapped_again = wrapped.clone().at_position(9);
        match wrapped_again {
            EvalError::EvaluationError { position, .. } => assert_eq!(position, 5),
            _ => panic!("expected EvaluationError"),
        }
    }

    #[test]
    fn rethrow_at_call_site_overwrites_position() {
        let inner = EvalError::NameError("x".to_string()).at_position(5);
        let rethrown = inner.rethrow_at_call_site(42);
        match rethrown {
            EvalError::EvaluationError { position, .. } => assert_eq!(position, 42),
            _ => panic!("expected EvaluationError"),
        }
    }
}
