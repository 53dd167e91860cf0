//! The five-kind error taxonomy the core distinguishes.
//!
//! Construction-time errors ([`EngineError::InvalidArgument`],
//! [`EngineError::TypeMismatch`]) are raised by node constructors and are
//! unrecoverable at that call site. Evaluation-time errors
//! ([`EngineError::ShapeMismatch`], [`EngineError::EvaluationFailure`],
//! [`EngineError::InternalInvariantViolation`]) abort the evaluation; no
//! partial `Block` is ever returned to the caller.

use std::fmt;

use crate::value::ValueKind;

/// Errors the core can raise, either at node construction or during
/// `evaluate`.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// A constructor argument was out of the operator's valid range, e.g.
    /// `window < 2` for variance, `alpha` outside `(0, 1)` for EMA, or
    /// `throttle(_, n <= 0)`.
    #[error("invalid argument: {message}")]
    InvalidArgument { message: String },

    /// Two values or node types were combined but are not compatible,
    /// e.g. arithmetic between a scalar and a vector node, or a
    /// covariance matrix whose input dimension changed across ticks.
    #[error("type mismatch: expected {expected}, found {found}")]
    TypeMismatch { expected: String, found: String },

    /// A vector/matrix-valued input changed shape at runtime.
    #[error("shape mismatch: expected {expected:?}, found {found:?}")]
    ShapeMismatch {
        expected: ValueKind,
        found: ValueKind,
    },

    /// A downstream combiner failed; the error is surfaced verbatim.
    #[error("evaluation failure: {source}")]
    EvaluationFailure {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// A core invariant was violated, e.g. a source `Block` whose knot
    /// times are not strictly increasing. Always fatal.
    #[error("internal invariant violation: {message}")]
    InternalInvariantViolation { message: String },
}

/// A combiner produced a non-finite value (e.g. division by zero). This is
/// the one place a `Value` combiner can fail mid-evaluation rather than at
/// node construction, so it is boxed into [`EngineError::EvaluationFailure`]
/// rather than given its own top-level variant.
#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct NonFiniteResult(pub String);

impl EngineError {
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        EngineError::InvalidArgument {
            message: message.into(),
        }
    }

    pub fn evaluation_failure(source: impl std::error::Error + Send + Sync + 'static) -> Self {
        EngineError::EvaluationFailure {
            source: Box::new(source),
        }
    }

    pub fn type_mismatch(expected: impl fmt::Display, found: impl fmt::Display) -> Self {
        EngineError::TypeMismatch {
            expected: expected.to_string(),
            found: found.to_string(),
        }
    }

    pub fn shape_mismatch(expected: ValueKind, found: ValueKind) -> Self {
        EngineError::ShapeMismatch { expected, found }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        EngineError::InternalInvariantViolation {
            message: message.into(),
        }
    }
}

pub type EngineResult<T> = Result<T, EngineError>;
