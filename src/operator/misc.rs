//! Structural/alignment-composition constructors: `align`,
//! `coalign`, `first_knot`, `active_count`, `throttle`, `count_knots`.
//! `active_count` and `coalign` are built entirely from more primitive
//! constructors (`align`, arithmetic `add`) rather than introducing new
//! node kinds, since they are themselves compositions of simpler ones.

use crate::alignment::Alignment;
use crate::block::{Block, BlockBuilder};
use crate::error::{EngineError, EngineResult};
use crate::identity::obtain_node;
use crate::node::Node;
use crate::operator::{arithmetic, binary_aligned, source, BinaryCombine, OperatorKind};
use crate::value::{Value, ValueKind};

/// `align(x, schedule)`: emit `x`'s latched value on `schedule`'s tick
/// pattern. Built from the general binary-aligned machinery: tick
/// whenever the left (`schedule`) parent ticks (`Alignment::Left`),
/// carrying the right (`x`) parent's latched value (`TakeRight`).
pub fn align(x: Node, schedule: Node) -> EngineResult<Node> {
    binary_aligned(schedule, x, Alignment::Left, None, BinaryCombine::TakeRight)
}

/// Align every input in `xs` to a common tick schedule under `alignment`,
/// returning one aligned node per original input in the original order.
pub fn coalign(xs: Vec<Node>, alignment: Alignment) -> EngineResult<Vec<Node>> {
    if xs.is_empty() {
        return Err(EngineError::invalid_argument("coalign requires at least one input"));
    }
    if xs.len() == 1 {
        return Ok(xs);
    }

    let n = xs.len();
    let mut order: Vec<usize> = (0..n).collect();
    if alignment == Alignment::Left {
        // the first input's position in the fold is fixed; only the rest
        // get canonicalised, so `left(acc, x_0, ...)` always starts from
        // the caller's designated "left" stream.
        order[1..].sort_by_key(|&i| xs[i].id);
    } else {
        order.sort_by_key(|&i| xs[i].id);
    }

    let mut schedule = xs[order[0]].clone();
    for &i in &order[1..] {
        schedule = binary_aligned(schedule, xs[i].clone(), alignment, None, BinaryCombine::TakeLeft)?;
    }

    let mut aligned: Vec<Option<Node>> = (0..n).map(|_| None).collect();
    for (slot, x) in aligned.iter_mut().zip(xs.into_iter()) {
        *slot = Some(align(x, schedule.clone())?);
    }
    Ok(aligned.into_iter().map(|a| a.expect("every slot filled")).collect())
}

/// `first_knot(x)`: emits only `x`'s first tick, then silent forever.
pub fn first_knot(x: Node) -> Node {
    let value_kind = x.value_kind;
    obtain_node(vec![x], OperatorKind::FirstKnot, value_kind)
}

pub fn run_first_knot(parent: &Block<Value>) -> Block<Value> {
    match parent.first() {
        Some((t, v)) => Block::new_unchecked(vec![t], vec![v.clone()]),
        None => Block::empty(),
    }
}

/// `count_knots(x)`: running count of `x`'s ticks, `n := n + 1` per input
/// tick.
pub fn count_knots(x: Node) -> Node {
    obtain_node(vec![x], OperatorKind::CountKnots, ValueKind::Scalar)
}

pub fn run_count_knots(parent: &Block<Value>) -> Block<Value> {
    let mut out = BlockBuilder::with_capacity(parent.len());
    for (i, (t, _)) in parent.iter().enumerate() {
        out.push(t, Value::Scalar((i + 1) as f64));
    }
    out.finish()
}

/// `throttle(x, n)`: emits `x`'s knot at positions `0, n, 2n, …` on `x`'s
/// own tick schedule; `n == 1` is identity.
pub fn throttle(x: Node, n: usize) -> EngineResult<Node> {
    if n == 0 {
        return Err(EngineError::invalid_argument(format!(
            "throttle n must be >= 1, got {n}"
        )));
    }
    let value_kind = x.value_kind;
    Ok(obtain_node(vec![x], OperatorKind::Throttle(n), value_kind))
}

pub fn run_throttle(n: usize, parent: &Block<Value>) -> Block<Value> {
    let mut out = BlockBuilder::new();
    for (i, (t, v)) in parent.iter().enumerate() {
        if i % n == 0 {
            out.push(t, v.clone());
        }
    }
    out.finish()
}

/// `active_count(x_1, …, x_k)`: sum of `align(1, first_knot(x_i))` over
/// inputs — equals the number of inputs that have ticked at least once by
/// each aligned tick.
pub fn active_count(xs: Vec<Node>) -> EngineResult<Node> {
    if xs.is_empty() {
        return Err(EngineError::invalid_argument(
            "active_count requires at least one input",
        ));
    }
    let mut indicators = Vec::with_capacity(xs.len());
    for x in xs {
        let fk = first_knot(x);
        indicators.push(align(source::constant(1.0), fk)?);
    }
    let mut acc = indicators.remove(0);
    for indicator in indicators {
        acc = arithmetic::add(acc, indicator)?;
    }
    Ok(acc)
}
