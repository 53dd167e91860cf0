//! The operator framework: a small, fixed vocabulary of
//! operator shapes — source, unary, binary-aligned, inception, fixed
//! window, time window — each type-parameterized (in spirit; concretely,
//! tagged) by the [`combine::StatKind`] it computes rather than given a
//! distinct Rust type per statistic, favoring a flatter, data-driven
//! dispatch: renoir's source expresses the analogous shapes through a deep
//! trait hierarchy (`Operator`, `DynOperator`, per-statistic structs in
//! `operator/mean.rs`, `operator/variance.rs`, ...); here the same ground
//! is covered by one [`OperatorKind`] enum plus [`combine::AccData`] as the
//! single generic accumulator.

pub mod arithmetic;
pub mod combine;
pub mod ema;
pub mod inception;
pub mod lag;
pub mod misc;
pub mod source;
pub mod stats;
pub mod swag;
pub mod twindow;
pub mod window;

use serde::{Deserialize, Serialize};

use crate::alignment::Alignment;
use crate::block::Block;
use crate::error::EngineResult;
use crate::identity::obtain_node;
use crate::node::Node;
use crate::value::{Value, ValueKind};

pub use combine::StatKind;

/// How a binary aligned operator combines its two latched inputs at each
/// emitted tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinaryCombine {
    Add,
    Sub,
    Mul,
    Div,
    /// Used to build `align(x, schedule)`: emit `x`'s latched value on
    /// `schedule`'s tick pattern.
    TakeLeft,
    TakeRight,
}

impl BinaryCombine {
    pub fn apply(self, left: &Value, right: &Value) -> crate::error::EngineResult<Value> {
        match self {
            BinaryCombine::Add => left.add(right),
            BinaryCombine::Sub => left.sub(right),
            BinaryCombine::Mul => left.mul(right),
            BinaryCombine::Div => left.div(right),
            BinaryCombine::TakeLeft => Ok(left.clone()),
            BinaryCombine::TakeRight => Ok(right.clone()),
        }
    }
}

/// Source node behavior: produces a `Block` directly from `[t_start,
/// t_end)`, no parents involved.
#[derive(Clone, Debug)]
pub enum SourceSpec {
    /// Ticks once, at `t_start`, forever the same value (spec S4).
    Constant(Value),
    /// Replays a pre-built block, clipped to `[t_start, t_end)`.
    Block(Block<Value>),
    /// Ticks every `period_millis`, starting at `t_start`, with a fixed
    /// value.
    Pulse { period_millis: i64, value: Value },
    /// Ticks every `period_millis` with an independent standard-normal
    /// draw. Keyed on a frozen `seed`; `run` clones a fresh `SmallRng` from
    /// that seed into per-evaluation state and never mutates the seed
    /// itself.
    Random { period_millis: i64, seed: u64 },
}

/// The behavior a [`crate::node::Node`] carries. A small, closed
/// vocabulary; every constructor in `operator::*` builds one of these and
/// hands it to [`crate::identity::obtain_node`].
#[derive(Clone, Debug)]
pub enum OperatorKind {
    Source(SourceSpec),
    Lag(usize),
    Throttle(usize),
    FirstKnot,
    CountKnots,
    Ema(f64),
    /// Elementwise square root, used internally to build `cor` from `cov`
    /// and `var` by composition.
    Sqrt,
    BinaryAligned {
        alignment: Alignment,
        initial: Option<(Value, Value)>,
        combine: BinaryCombine,
    },
    Inception {
        stat: StatKind,
        always_ticks: bool,
    },
    Window {
        stat: StatKind,
        size: usize,
        emit_early: bool,
    },
    TWindow {
        stat: StatKind,
        duration_millis: i64,
        emit_early: bool,
    },
}

/// Build the right error for two parents whose `ValueKind`s don't agree:
/// a `Scalar` paired with a `Vector` is a shape-agnostic `TypeMismatch`,
/// while two `Vector`s of differing length are a `ShapeMismatch` (same
/// distinction `Value::zip_with` draws at evaluation time in `value.rs`).
fn kind_mismatch(a: ValueKind, b: ValueKind) -> crate::error::EngineError {
    use crate::error::EngineError;
    match (a, b) {
        (ValueKind::Vector(_), ValueKind::Vector(_)) => EngineError::shape_mismatch(a, b),
        _ => EngineError::type_mismatch(format!("{a:?}"), format!("{b:?}")),
    }
}

fn value_bits(v: &Value) -> ValueKey {
    match v {
        Value::Scalar(x) => ValueKey::Scalar(x.to_bits()),
        Value::Vector(xs) => ValueKey::Vector(xs.iter().map(|x| x.to_bits()).collect()),
    }
}

#[derive(Clone, PartialEq, Eq, Hash, Debug)]
enum ValueKey {
    Scalar(u64),
    Vector(Vec<u64>),
}

#[derive(Clone, PartialEq, Eq, Hash, Debug)]
enum SourceKey {
    Constant(ValueKey),
    Block(Vec<(i64, ValueKey)>),
    Pulse { period_millis: i64, value: ValueKey },
    Random { period_millis: i64, seed: u64 },
}

/// The structural-equality key an [`OperatorKind`] reduces to for the
/// identity map: everything in [`OperatorKind`] that isn't already
/// `Eq + Hash` (bare `f64`s and [`Value`]s) gets converted to its bit
/// pattern. Two operators with the same `OpKey` are, by construction,
/// interchangeable.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub enum OpKey {
    Source(SourceKey),
    Lag(u64),
    Throttle(u64),
    FirstKnot,
    CountKnots,
    Ema(u64),
    Sqrt,
    BinaryAligned {
        alignment: Alignment,
        initial: Option<(ValueKey, ValueKey)>,
        combine: BinaryCombine,
    },
    Inception {
        stat: StatKind,
        always_ticks: bool,
    },
    Window {
        stat: StatKind,
        size: u64,
        emit_early: bool,
    },
    TWindow {
        stat: StatKind,
        duration_millis: i64,
        emit_early: bool,
    },
}

impl OperatorKind {
    pub fn op_key(&self) -> OpKey {
        match self {
            OperatorKind::Source(spec) => OpKey::Source(match spec {
                SourceSpec::Constant(v) => SourceKey::Constant(value_bits(v)),
                SourceSpec::Block(b) => SourceKey::Block(
                    b.iter()
                        .map(|(t, v)| (t.millis(), value_bits(v)))
                        .collect(),
                ),
                SourceSpec::Pulse {
                    period_millis,
                    value,
                } => SourceKey::Pulse {
                    period_millis: *period_millis,
                    value: value_bits(value),
                },
                SourceSpec::Random {
                    period_millis,
                    seed,
                } => SourceKey::Random {
                    period_millis: *period_millis,
                    seed: *seed,
                },
            }),
            OperatorKind::Lag(k) => OpKey::Lag(*k as u64),
            OperatorKind::Throttle(n) => OpKey::Throttle(*n as u64),
            OperatorKind::FirstKnot => OpKey::FirstKnot,
            OperatorKind::CountKnots => OpKey::CountKnots,
            OperatorKind::Ema(alpha) => OpKey::Ema(alpha.to_bits()),
            OperatorKind::Sqrt => OpKey::Sqrt,
            OperatorKind::BinaryAligned {
                alignment,
                initial,
                combine,
            } => OpKey::BinaryAligned {
                alignment: *alignment,
                initial: initial
                    .as_ref()
                    .map(|(l, r)| (value_bits(l), value_bits(r))),
                combine: *combine,
            },
            OperatorKind::Inception { stat, always_ticks } => OpKey::Inception {
                stat: *stat,
                always_ticks: *always_ticks,
            },
            OperatorKind::Window {
                stat,
                size,
                emit_early,
            } => OpKey::Window {
                stat: *stat,
                size: *size as u64,
                emit_early: *emit_early,
            },
            OperatorKind::TWindow {
                stat,
                duration_millis,
                emit_early,
            } => OpKey::TWindow {
                stat: *stat,
                duration_millis: *duration_millis,
                emit_early: *emit_early,
            },
        }
    }

    /// Infer this operator's output `ValueKind` from its parents' kinds.
    /// Called once at construction and cached on the `Node`.
    pub fn infer_value_kind(&self, parents: &[ValueKind]) -> crate::error::EngineResult<ValueKind> {
        use crate::error::EngineError;
        match self {
            OperatorKind::Source(SourceSpec::Constant(v)) => Ok(v.kind()),
            OperatorKind::Source(SourceSpec::Block(b)) => {
                Ok(b.first().map(|(_, v)| v.kind()).unwrap_or(ValueKind::Scalar))
            }
            OperatorKind::Source(SourceSpec::Pulse { value, .. }) => Ok(value.kind()),
            OperatorKind::Source(SourceSpec::Random { .. }) => Ok(ValueKind::Scalar),
            OperatorKind::Lag(_)
            | OperatorKind::Throttle(_)
            | OperatorKind::FirstKnot
            | OperatorKind::Ema(_)
            | OperatorKind::Sqrt => Ok(parents[0]),
            OperatorKind::CountKnots => Ok(ValueKind::Scalar),
            OperatorKind::BinaryAligned { combine, .. } => match combine {
                BinaryCombine::TakeLeft => Ok(parents[0]),
                BinaryCombine::TakeRight => Ok(parents[1]),
                _ => {
                    if parents[0] == parents[1] {
                        Ok(parents[0])
                    } else {
                        Err(kind_mismatch(parents[0], parents[1]))
                    }
                }
            },
            OperatorKind::Inception { stat, .. }
            | OperatorKind::Window { stat, .. }
            | OperatorKind::TWindow { stat, .. } => match stat {
                StatKind::CovMatrix { .. } => Ok(ValueKind::Vector(match parents[0] {
                    ValueKind::Vector(n) => n,
                    ValueKind::Scalar => {
                        return Err(EngineError::type_mismatch("vector", "scalar"))
                    }
                })),
                StatKind::Cov { .. } => {
                    if parents[0] == parents[1] {
                        Ok(parents[0])
                    } else {
                        Err(kind_mismatch(parents[0], parents[1]))
                    }
                }
                _ => Ok(parents[0]),
            },
        }
    }
}

/// Shared entry point for every binary-aligned constructor (arithmetic,
/// `align`, `cor`'s internal coalignment, `active_count`'s summands): build
/// a `BinaryAligned` node, inferring and checking its value kind from its
/// two parents before handing it to the identity map.
pub(crate) fn binary_aligned(
    left: Node,
    right: Node,
    alignment: Alignment,
    initial: Option<(Value, Value)>,
    combine: BinaryCombine,
) -> EngineResult<Node> {
    let kind = OperatorKind::BinaryAligned {
        alignment,
        initial,
        combine,
    };
    let value_kind = kind.infer_value_kind(&[left.value_kind, right.value_kind])?;
    Ok(obtain_node(vec![left, right], kind, value_kind))
}

// A node's per-step emission rule (whether a tick is unfiltered or gated)
// is, for every operator in this library, exactly `AccData::should_tick`:
// Sum/Prod/Mean are unconditionally unfiltered, Var/Cov/CovMatrix gate on
// `n > 1`. No operator here needs a user-supplied predicate beyond that, so
// no separate "facets" struct is threaded through `run`.
