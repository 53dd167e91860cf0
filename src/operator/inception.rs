//! The inception operator: accumulates from the beginning of
//! the evaluated interval using [`AccData`] as its associative combiner.
//! State is a single `Option<AccData>` — `None` until the first input,
//! `Some` thereafter.

use crate::block::{Block, BlockBuilder};
use crate::error::EngineResult;
use crate::maybe::Maybe;
use crate::operator::combine::{AccData, StatKind};
use crate::value::Value;

#[derive(Clone, Debug, Default)]
pub struct InceptionState(pub Option<AccData>);

/// Run one inception node over its (already time-aligned, if more than
/// one) parent blocks.
pub fn run(
    stat: StatKind,
    always_ticks: bool,
    state: &mut InceptionState,
    parents: &[Block<Value>],
) -> EngineResult<Block<Value>> {
    let len = parents[0].len();
    let mut out = BlockBuilder::with_capacity(len);
    for i in 0..len {
        let inputs: Vec<Value> = parents.iter().map(|p| p.values()[i].clone()).collect();
        let time = parents[0].times()[i];
        let wrapped = AccData::wrap(stat, &inputs)?;
        let combined = match state.0.take() {
            Some(acc) => AccData::combine(&acc, &wrapped)?,
            None => wrapped,
        };
        state.0 = Some(combined);
        let acc = state.0.as_ref().expect("just assigned");
        if let Maybe::Some(value) = acc.step(always_ticks) {
            out.push(time, value);
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

    fn scalar_block(pairs: &[(i64, f64)]) -> Block<Value> {
        let mut b = BlockBuilder::new();
        for (t, v) in pairs {
            b.push(ts(*t), Value::Scalar(*v));
        }
        b.finish()
    }

    #[test]
    fn running_mean() {
        let input = scalar_block(&[(1, 2.0), (2, 4.0), (3, 6.0)]);
        let mut state = InceptionState::default();
        let out = run(StatKind::Mean, false, &mut state, &[input]).unwrap();
        let got: Vec<(i64, f64)> = out
            .iter()
            .map(|(t, v)| (t.millis(), v.as_scalar().unwrap()))
            .collect();
        assert_eq!(got, vec![(1, 2.0), (2, 3.0), (3, 4.0)]);
    }

    #[test]
    fn running_var_skips_first_tick() {
        let input = scalar_block(&[(1, 2.0), (2, 4.0), (3, 6.0)]);
        let mut state = InceptionState::default();
        let out = run(
            StatKind::Var { corrected: true },
            false,
            &mut state,
            &[input],
        )
        .unwrap();
        let got: Vec<(i64, f64)> = out
            .iter()
            .map(|(t, v)| (t.millis(), v.as_scalar().unwrap()))
            .collect();
        assert_eq!(got, vec![(2, 2.0), (3, 4.0)]);
    }
}
