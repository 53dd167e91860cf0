//! Exponential moving average: the one statistical combiner
//! that is *not* expressible as an associative fold over a per-event data
//! wrapper, so it gets its own small piece of state rather than routing
//! through [`crate::operator::combine::AccData`].

use crate::block::{Block, BlockBuilder};
use crate::error::{EngineError, EngineResult};
use crate::identity::obtain_node;
use crate::maybe::Maybe;
use crate::node::Node;
use crate::operator::OperatorKind;
use crate::value::Value;

/// `ema(x, alpha)`, alpha given directly. Requires `0 < alpha < 1`.
pub fn ema(x: Node, alpha: f64) -> EngineResult<Node> {
    if !(alpha > 0.0 && alpha < 1.0) {
        return Err(EngineError::invalid_argument(format!(
            "ema alpha must be in (0, 1), got {alpha}"
        )));
    }
    build(x, alpha)
}

/// `ema(x, span = w_eff)`: alpha derived from an effective window,
/// `alpha = 2 / (w_eff + 1)`. Requires `w_eff > 1`.
pub fn ema_span(x: Node, w_eff: f64) -> EngineResult<Node> {
    if !(w_eff > 1.0) {
        return Err(EngineError::invalid_argument(format!(
            "ema effective window must be > 1, got {w_eff}"
        )));
    }
    build(x, 2.0 / (w_eff + 1.0))
}

fn build(x: Node, alpha: f64) -> EngineResult<Node> {
    let value_kind = x.value_kind;
    Ok(obtain_node(vec![x], OperatorKind::Ema(alpha), value_kind))
}

#[derive(Clone, Debug, Default)]
pub struct EmaState {
    weighted_sum: Option<Value>,
    weighted_count: f64,
}

/// Run one EMA node. Ticks on every input tick (`always_ticks`): unlike
/// the window/inception statistics there is no "needs at least two
/// observations" gate.
pub fn run(alpha: f64, state: &mut EmaState, parent: &Block<Value>) -> EngineResult<Block<Value>> {
    let mut out = BlockBuilder::with_capacity(parent.len());
    for (t, v) in parent.iter() {
        let weighted_sum = match &state.weighted_sum {
            Some(prev) => v.add(&prev.scale(1.0 - alpha))?,
            None => v.clone(),
        };
        state.weighted_count = 1.0 + (1.0 - alpha) * state.weighted_count;
        state.weighted_sum = Some(weighted_sum);
        let extract = state
            .weighted_sum
            .as_ref()
            .expect("just assigned")
            .scale(1.0 / state.weighted_count);
        // EMA always ticks (`always_ticks`, spec.md §4.5): the per-step
        // decision is unconditionally `Some`, but still routed through
        // `Maybe` like every other operator's emission step.
        let tick: Maybe<Value> = Maybe::some(extract);
        if let Maybe::Some(value) = tick {
            out.push(t, value);
        }
    }
    Ok(out.finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timestamp::Timestamp;

    fn ts(n: i64) -> Timestamp {
        Timestamp::from_millis(n)
    }

    fn block(pairs: &[(i64, f64)]) -> Block<Value> {
        let mut b = BlockBuilder::new();
        for (t, v) in pairs {
            b.push(ts(*t), Value::Scalar(*v));
        }
        b.finish()
    }

    #[test]
    fn rejects_alpha_out_of_range() {
        let x = crate::operator::source::pulse(1, 1.0).unwrap();
        assert!(ema(x.clone(), 0.0).is_err());
        assert!(ema(x.clone(), 1.0).is_err());
        assert!(ema(x, -0.5).is_err());
    }

    #[test]
    fn rejects_span_at_or_below_one() {
        let x = crate::operator::source::pulse(1, 1.0).unwrap();
        assert!(ema_span(x.clone(), 1.0).is_err());
        assert!(ema_span(x, 0.5).is_err());
    }

    #[test]
    fn constant_stream_converges_immediately() {
        let input = block(&[(1, 5.0), (2, 5.0), (3, 5.0), (4, 5.0)]);
        let mut state = EmaState::default();
        let out = run(0.3, &mut state, &input).unwrap();
        for (_, v) in out.iter() {
            assert!((v.as_scalar().unwrap() - 5.0).abs() < 1e-9);
        }
    }

    #[test]
    fn tracks_a_step_change() {
        let input = block(&[(1, 0.0), (2, 0.0), (3, 10.0), (4, 10.0), (5, 10.0)]);
        let mut state = EmaState::default();
        let out = run(0.5, &mut state, &input).unwrap();
        let last = out.last().unwrap().1.as_scalar().unwrap();
        assert!(last > 5.0 && last < 10.0);
    }
}
