//! [`Value`] is the single data type that flows through every [`Block`](crate::block::Block)
//! in the graph, mirroring the role renoir's `NoirType`/`NoirData` pair plays
//! in its pipeline: a tagged union of a bare scalar and a fixed-dimension
//! row of scalars, so that the common scalar case avoids allocating a
//! one-element vector.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

/// A value carried by a knot. Either a plain `f64`, or a fixed-dimension
/// vector of `f64` (used by the covariance-matrix operator and any other
/// vector-valued node).
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub enum Value {
    Scalar(f64),
    Vector(Vec<f64>),
}

/// The shape of a [`Value`], without its contents. Returned by
/// `value_type(node)` and used to detect shape drift.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Scalar,
    Vector(usize),
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueKind::Scalar => write!(f, "scalar"),
            ValueKind::Vector(n) => write!(f, "vector[{n}]"),
        }
    }
}

impl Value {
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Scalar(_) => ValueKind::Scalar,
            Value::Vector(v) => ValueKind::Vector(v.len()),
        }
    }

    pub fn as_scalar(&self) -> EngineResult<f64> {
        match self {
            Value::Scalar(x) => Ok(*x),
            Value::Vector(_) => Err(EngineError::type_mismatch("scalar", self.kind())),
        }
    }

    pub fn as_vector(&self) -> EngineResult<&[f64]> {
        match self {
            Value::Vector(v) => Ok(v),
            Value::Scalar(_) => Err(EngineError::type_mismatch("vector", self.kind())),
        }
    }

    /// Combine two values elementwise with `f`, failing if shapes differ.
    pub fn zip_with(&self, other: &Value, f: impl Fn(f64, f64) -> f64) -> EngineResult<Value> {
        match (self, other) {
            (Value::Scalar(a), Value::Scalar(b)) => Ok(Value::Scalar(f(*a, *b))),
            (Value::Vector(a), Value::Vector(b)) => {
                if a.len() != b.len() {
                    return Err(EngineError::shape_mismatch(self.kind(), other.kind()));
                }
                Ok(Value::Vector(
                    a.iter().zip(b.iter()).map(|(x, y)| f(*x, *y)).collect(),
                ))
            }
            _ => Err(EngineError::type_mismatch(self.kind(), other.kind())),
        }
    }

    pub fn map(&self, f: impl Fn(f64) -> f64) -> Value {
        match self {
            Value::Scalar(x) => Value::Scalar(f(*x)),
            Value::Vector(v) => Value::Vector(v.iter().map(|x| f(*x)).collect()),
        }
    }

    pub fn add(&self, other: &Value) -> EngineResult<Value> {
        self.zip_with(other, |a, b| a + b)
    }

    pub fn sub(&self, other: &Value) -> EngineResult<Value> {
        self.zip_with(other, |a, b| a - b)
    }

    pub fn mul(&self, other: &Value) -> EngineResult<Value> {
        self.zip_with(other, |a, b| a * b)
    }

    /// Elementwise division. Unlike `add`/`sub`/`mul`, division can fail at
    /// evaluation time on values that type-check fine (a live knot divided
    /// by a live zero knot): the result is checked for non-finite entries
    /// and surfaced as [`EngineError::EvaluationFailure`] rather than
    /// silently producing `inf`/`NaN`.
    pub fn div(&self, other: &Value) -> EngineResult<Value> {
        let result = self.zip_with(other, |a, b| a / b)?;
        result.check_finite()?;
        Ok(result)
    }

    fn check_finite(&self) -> EngineResult<()> {
        let all_finite = match self {
            Value::Scalar(x) => x.is_finite(),
            Value::Vector(v) => v.iter().all(|x| x.is_finite()),
        };
        if all_finite {
            Ok(())
        } else {
            Err(EngineError::evaluation_failure(crate::error::NonFiniteResult(format!(
                "division produced a non-finite value: {self:?}"
            ))))
        }
    }

    pub fn scale(&self, factor: f64) -> Value {
        self.map(|x| x * factor)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Scalar(x)
    }
}

impl From<Vec<f64>> for Value {
    fn from(v: Vec<f64>) -> Self {
        Value::Vector(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_arithmetic() {
        let a = Value::Scalar(2.0);
        let b = Value::Scalar(3.0);
        assert_eq!(a.add(&b).unwrap(), Value::Scalar(5.0));
        assert_eq!(a.mul(&b).unwrap(), Value::Scalar(6.0));
    }

    #[test]
    fn vector_shape_mismatch() {
        let a = Value::Vector(vec![1.0, 2.0]);
        let b = Value::Vector(vec![1.0, 2.0, 3.0]);
        assert!(a.add(&b).is_err());
    }

    #[test]
    fn scalar_vector_type_mismatch() {
        let a = Value::Scalar(1.0);
        let b = Value::Vector(vec![1.0]);
        assert!(a.add(&b).is_err());
    }

    #[test]
    fn division_by_zero_is_evaluation_failure() {
        let a = Value::Scalar(1.0);
        let b = Value::Scalar(0.0);
        assert!(matches!(
            a.div(&b),
            Err(EngineError::EvaluationFailure { .. })
        ));
    }

    #[test]
    fn zero_over_zero_is_evaluation_failure() {
        let a = Value::Scalar(0.0);
        let b = Value::Scalar(0.0);
        assert!(matches!(
            a.div(&b),
            Err(EngineError::EvaluationFailure { .. })
        ));
    }

    #[test]
    fn ordinary_division_succeeds() {
        let a = Value::Scalar(6.0);
        let b = Value::Scalar(3.0);
        assert_eq!(a.div(&b).unwrap(), Value::Scalar(2.0));
    }
}
