//! Source node constructors and their `run` behavior:
//! the only operator shape with no parents, producing a `Block` directly
//! from `[t_start, t_end)` and (for the random source) a per-evaluation RNG
//! clone.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::block::{Block, BlockBuilder};
use crate::error::{EngineError, EngineResult};
use crate::identity::obtain_node;
use crate::node::Node;
use crate::operator::{OperatorKind, SourceSpec};
use crate::timestamp::Timestamp;
use crate::value::{Value, ValueKind};

/// A node that always ticks exactly once, at `t_start`, forever the same
/// value (spec S4).
pub fn constant(value: impl Into<Value>) -> Node {
    let value = value.into();
    let kind = value.kind();
    obtain_node(vec![], OperatorKind::Source(SourceSpec::Constant(value)), kind)
}

/// A node that replays a pre-built block, clipped to the evaluated
/// interval on each `run`.
pub fn from_block(block: Block<Value>) -> Node {
    let kind = block
        .first()
        .map(|(_, v)| v.kind())
        .unwrap_or(ValueKind::Scalar);
    obtain_node(vec![], OperatorKind::Source(SourceSpec::Block(block)), kind)
}

/// A node that ticks every `period_millis`, starting at `t_start`, with a
/// fixed value.
pub fn pulse(period_millis: i64, value: impl Into<Value>) -> EngineResult<Node> {
    if period_millis <= 0 {
        return Err(EngineError::invalid_argument(format!(
            "pulse period must be positive, got {period_millis}"
        )));
    }
    let value = value.into();
    let kind = value.kind();
    Ok(obtain_node(
        vec![],
        OperatorKind::Source(SourceSpec::Pulse {
            period_millis,
            value,
        }),
        kind,
    ))
}

/// A node that ticks every `period_millis` with an independent standard-
/// normal draw, keyed on a frozen `seed` (the seed,
/// not a live generator, is what participates in the identity key).
pub fn random(period_millis: i64, seed: u64) -> EngineResult<Node> {
    if period_millis <= 0 {
        return Err(EngineError::invalid_argument(format!(
            "random source period must be positive, got {period_millis}"
        )));
    }
    Ok(obtain_node(
        vec![],
        OperatorKind::Source(SourceSpec::Random {
            period_millis,
            seed,
        }),
        ValueKind::Scalar,
    ))
}

/// Per-evaluation state for a source node. Stateless for every source
/// except `Random`, whose RNG is cloned fresh from the frozen seed at the
/// start of each `evaluate` and never written back to the operator.
pub enum SourceState {
    Stateless,
    Random(SmallRng),
}

impl SourceState {
    pub fn new(spec: &SourceSpec) -> Self {
        match spec {
            SourceSpec::Random { seed, .. } => SourceState::Random(SmallRng::seed_from_u64(*seed)),
            _ => SourceState::Stateless,
        }
    }
}

/// Draw one standard-normal sample via Box-Muller, using two independent
/// uniform draws from `rng`.
fn standard_normal(rng: &mut SmallRng) -> f64 {
    let u1: f64 = rng.random_range(f64::EPSILON..1.0);
    let u2: f64 = rng.random();
    (-2.0 * u1.ln()).sqrt() * (std::f64::consts::TAU * u2).cos()
}

pub fn run(
    spec: &SourceSpec,
    state: &mut SourceState,
    t_start: Timestamp,
    t_end: Timestamp,
) -> EngineResult<Block<Value>> {
    let mut out = BlockBuilder::new();
    match spec {
        SourceSpec::Constant(v) => {
            if t_start < t_end {
                out.push(t_start, v.clone());
            }
        }
        SourceSpec::Block(block) => {
            for (t, v) in block.iter() {
                if t >= t_start && t < t_end {
                    out.push(t, v.clone());
                }
            }
        }
        SourceSpec::Pulse {
            period_millis,
            value,
        } => {
            let mut t = t_start;
            while t < t_end {
                out.push(t, value.clone());
                t = t + *period_millis;
            }
        }
        SourceSpec::Random { period_millis, .. } => {
            let rng = match state {
                SourceState::Random(rng) => rng,
                SourceState::Stateless => {
                    return Err(EngineError::internal(
                        "random source run called without Random state",
                    ))
                }
            };
            let mut t = t_start;
            while t < t_end {
                out.push(t, Value::Scalar(standard_normal(rng)));
                t = t + *period_millis;
            }
        }
    }
    Ok(out.finish())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(n: i64) -> Timestamp {
        Timestamp::from_millis(n)
    }

    #[test]
    fn constant_ticks_once_at_t_start() {
        let node = constant(3.0);
        let OperatorKind::Source(spec) = &node.kind else {
            panic!("expected source")
        };
        let mut state = SourceState::new(spec);
        let out = run(spec, &mut state, ts(0), ts(10)).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out.first().unwrap().0, ts(0));
    }

    #[test]
    fn pulse_rejects_nonpositive_period() {
        assert!(pulse(0, 1.0).is_err());
        assert!(pulse(-5, 1.0).is_err());
    }

    #[test]
    fn pulse_ticks_on_schedule() {
        let node = pulse(3, 1.0).unwrap();
        let OperatorKind::Source(spec) = &node.kind else {
            panic!("expected source")
        };
        let mut state = SourceState::new(spec);
        let out = run(spec, &mut state, ts(0), ts(10)).unwrap();
        let times: Vec<i64> = out.times().iter().map(|t| t.millis()).collect();
        assert_eq!(times, vec![0, 3, 6, 9]);
    }

    #[test]
    fn random_is_deterministic_given_same_seed() {
        let node = random(1, 42).unwrap();
        let OperatorKind::Source(spec) = &node.kind else {
            panic!("expected source")
        };
        let mut s1 = SourceState::new(spec);
        let mut s2 = SourceState::new(spec);
        let a = run(spec, &mut s1, ts(0), ts(5)).unwrap();
        let b = run(spec, &mut s2, ts(0), ts(5)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn constructor_is_idempotent_under_identity_map() {
        let a = constant(9.0);
        let b = constant(9.0);
        assert!(std::sync::Arc::ptr_eq(&a, &b));
    }
}
