//! `lag(x, k)`: emits the value observed `k` ticks ago on `x`'s
//! own tick schedule, constant-folding through constant inputs.

use std::collections::VecDeque;

use crate::block::{Block, BlockBuilder};
use crate::error::EngineResult;
use crate::identity::obtain_node;
use crate::node::{constant_value, Node};
use crate::operator::{source, OperatorKind};
use crate::value::Value;

pub fn lag(x: Node, k: usize) -> Node {
    if let Some(v) = constant_value(&x) {
        return source::constant(v.clone());
    }
    let value_kind = x.value_kind;
    obtain_node(vec![x], OperatorKind::Lag(k), value_kind)
}

#[derive(Default)]
pub struct LagState {
    buffer: VecDeque<Value>,
}

pub fn run(k: usize, state: &mut LagState, parent: &Block<Value>) -> EngineResult<Block<Value>> {
    let mut out = BlockBuilder::with_capacity(parent.len());
    for (t, v) in parent.iter() {
        if k == 0 {
            out.push(t, v.clone());
            continue;
        }
        if state.buffer.len() == k {
            if let Some(old) = state.buffer.pop_front() {
                out.push(t, old);
            }
        }
        state.buffer.push_back(v.clone());
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
    fn lag_on_constant_folds_immediately() {
        let c = source::constant(1.0);
        let lagged = lag(c, 2);
        assert_eq!(constant_value(&lagged), Some(&Value::Scalar(1.0)));
    }

    #[test]
    fn lag_zero_is_identity() {
        let input = block(&[(1, 10.0), (2, 20.0)]);
        let mut state = LagState::default();
        let out = run(0, &mut state, &input).unwrap();
        assert_eq!(out, input);
    }

    #[test]
    fn lag_two_shifts_by_two_ticks() {
        let input = block(&[(1, 10.0), (2, 20.0), (3, 30.0), (4, 40.0)]);
        let mut state = LagState::default();
        let out = run(2, &mut state, &input).unwrap();
        let got: Vec<(i64, f64)> = out
            .iter()
            .map(|(t, v)| (t.millis(), v.as_scalar().unwrap()))
            .collect();
        assert_eq!(got, vec![(3, 10.0), (4, 20.0)]);
    }
}
