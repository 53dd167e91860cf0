//! [`Block`]: an immutable, time-ordered batch of knots produced by a single
//! node over a single `[t_start, t_end)` evaluation interval.

use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::timestamp::Timestamp;

/// An ordered sequence of `(time, value)` knots. Invariant: `times` is
/// strictly increasing and `times.len() == values.len()`. Empty blocks are
/// valid. Once constructed a `Block` is never mutated.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Block<T> {
    times: Vec<Timestamp>,
    values: Vec<T>,
}

impl<T> Block<T> {
    /// Build a block from time-ordered knots, checking the strictly-
    /// increasing invariant. Violating it is an
    /// [`EngineError::InternalInvariantViolation`]: a source producing
    /// non-monotonic knots is a bug in that source, not user error.
    pub fn new(times: Vec<Timestamp>, values: Vec<T>) -> Result<Self, EngineError> {
        if times.len() != values.len() {
            return Err(EngineError::internal(format!(
                "block times/values length mismatch: {} times, {} values",
                times.len(),
                values.len()
            )));
        }
        for w in times.windows(2) {
            if w[0] >= w[1] {
                return Err(EngineError::internal(format!(
                    "block knot times are not strictly increasing: {:?} >= {:?}",
                    w[0], w[1]
                )));
            }
        }
        Ok(Block { times, values })
    }

    /// Build a block from already-trusted, already-ordered data without
    /// re-checking monotonicity. Used internally by operators that derive
    /// their output ordering from an already-validated input.
    pub fn new_unchecked(times: Vec<Timestamp>, values: Vec<T>) -> Self {
        debug_assert_eq!(times.len(), values.len());
        Block { times, values }
    }

    pub fn empty() -> Self {
        Block {
            times: Vec::new(),
            values: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn first(&self) -> Option<(Timestamp, &T)> {
        self.times.first().copied().zip(self.values.first())
    }

    pub fn last(&self) -> Option<(Timestamp, &T)> {
        self.times.last().copied().zip(self.values.last())
    }

    pub fn times(&self) -> &[Timestamp] {
        &self.times
    }

    pub fn values(&self) -> &[T] {
        &self.values
    }

    pub fn get(&self, index: usize) -> Option<(Timestamp, &T)> {
        self.times.get(index).copied().zip(self.values.get(index))
    }

    pub fn iter(&self) -> impl Iterator<Item = (Timestamp, &T)> {
        self.times.iter().copied().zip(self.values.iter())
    }
}

impl<T> Default for Block<T> {
    fn default() -> Self {
        Block::empty()
    }
}

/// An append-only builder used by operators while they produce a `Block`,
/// kept separate from `Block` itself so the finished block is immutable.
#[derive(Debug)]
pub struct BlockBuilder<T> {
    times: Vec<Timestamp>,
    values: Vec<T>,
}

impl<T> BlockBuilder<T> {
    pub fn new() -> Self {
        BlockBuilder {
            times: Vec::new(),
            values: Vec::new(),
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        BlockBuilder {
            times: Vec::with_capacity(capacity),
            values: Vec::with_capacity(capacity),
        }
    }

    /// Push a knot. Panics on non-monotonic times: every operator in this
    /// crate derives its emission times from already-ordered inputs, so a
    /// violation here is always an implementation bug, not recoverable user
    /// input.
    pub fn push(&mut self, time: Timestamp, value: T) {
        if let Some(&last) = self.times.last() {
            assert!(
                last < time,
                "BlockBuilder::push called with non-increasing time {:?} after {:?}",
                time,
                last
            );
        }
        self.times.push(time);
        self.values.push(value);
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    pub fn finish(self) -> Block<T> {
        Block::new_unchecked(self.times, self.values)
    }
}

impl<T> Default for BlockBuilder<T> {
    fn default() -> Self {
        BlockBuilder::new()
    }
}
