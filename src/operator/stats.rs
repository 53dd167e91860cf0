//! Statistical node constructors: thin wrappers that pick
//! a [`StatKind`] and hand it to the generic inception/window/time-window
//! operator framework, applying the constant-propagation and argument-
//! validation rules required before a node is ever interned.

use crate::alignment::Alignment;
use crate::error::{EngineError, EngineResult};
use crate::identity::obtain_node;
use crate::node::{constant_value, Node};
use crate::operator::misc::coalign;
use crate::operator::{arithmetic, OperatorKind, StatKind};
use crate::value::ValueKind;

fn inception_node(stat: StatKind, parents: Vec<Node>) -> EngineResult<Node> {
    let kinds: Vec<ValueKind> = parents.iter().map(|p| p.value_kind).collect();
    let kind = OperatorKind::Inception {
        stat,
        always_ticks: false,
    };
    let value_kind = kind.infer_value_kind(&kinds)?;
    Ok(obtain_node(parents, kind, value_kind))
}

/// `sum(x)`, running from the start of the evaluated interval. A constant
/// input folds to itself: a constant only ever ticks once, so its running
/// sum never exceeds that single value.
pub fn sum(x: Node) -> Node {
    if let Some(v) = constant_value(&x) {
        return crate::operator::source::constant(v.clone());
    }
    inception_node(StatKind::Sum, vec![x]).expect("Sum never fails to type-check a single parent")
}

pub fn prod(x: Node) -> Node {
    if let Some(v) = constant_value(&x) {
        return crate::operator::source::constant(v.clone());
    }
    inception_node(StatKind::Prod, vec![x]).expect("Prod never fails to type-check a single parent")
}

pub fn mean(x: Node) -> Node {
    if let Some(v) = constant_value(&x) {
        return crate::operator::source::constant(v.clone());
    }
    inception_node(StatKind::Mean, vec![x]).expect("Mean never fails to type-check a single parent")
}

/// `var(x, corrected)`. Fails with `InvalidArgument` if `x` is a constant:
/// a constant ticks once, so variance (which needs at least two
/// observations) can never be defined for it.
pub fn var(x: Node, corrected: bool) -> EngineResult<Node> {
    if constant_value(&x).is_some() {
        return Err(EngineError::invalid_argument(
            "var of a constant node is never defined",
        ));
    }
    inception_node(StatKind::Var { corrected }, vec![x])
}

/// `cov(x, y, corrected)`, coaligning `x` and `y` onto a common tick
/// schedule first.
pub fn cov(x: Node, y: Node, corrected: bool) -> EngineResult<Node> {
    if constant_value(&x).is_some() && constant_value(&y).is_some() {
        return Err(EngineError::invalid_argument(
            "cov of two constant nodes is never defined",
        ));
    }
    let aligned = coalign(vec![x, y], Alignment::Union)?;
    cov_on_aligned(aligned[0].clone(), aligned[1].clone(), corrected)
}

fn cov_on_aligned(xa: Node, ya: Node, corrected: bool) -> EngineResult<Node> {
    inception_node(StatKind::Cov { corrected }, vec![xa, ya])
}

/// `cov_matrix(x, corrected)`: requires `x` to be vector-valued.
pub fn cov_matrix(x: Node, corrected: bool) -> EngineResult<Node> {
    if !matches!(x.value_kind, ValueKind::Vector(_)) {
        return Err(EngineError::type_mismatch("vector", x.value_kind));
    }
    if constant_value(&x).is_some() {
        return Err(EngineError::invalid_argument(
            "cov_matrix of a constant node is never defined",
        ));
    }
    inception_node(StatKind::CovMatrix { corrected }, vec![x])
}

/// `cor(x, y)`: `cov(x, y) / (std(x) * std(y))`, coaligning `x` and `y`
/// once and reusing that shared schedule for both the covariance and the
/// two variance computations — every `cor` overload funnels through here
/// rather than some bypassing straight to `cov`.
pub fn cor(x: Node, y: Node, corrected: bool) -> EngineResult<Node> {
    let aligned = coalign(vec![x, y], Alignment::Union)?;
    let (xa, ya) = (aligned[0].clone(), aligned[1].clone());
    let covariance = cov_on_aligned(xa.clone(), ya.clone(), corrected)?;
    let std_x = arithmetic::sqrt(var(xa, corrected)?);
    let std_y = arithmetic::sqrt(var(ya, corrected)?);
    let denom = arithmetic::mul(std_x, std_y)?;
    arithmetic::div(covariance, denom)
}

fn window_node(
    stat: StatKind,
    size: usize,
    emit_early: bool,
    parents: Vec<Node>,
) -> EngineResult<Node> {
    needs_at_least_two(&stat, size)?;
    let kinds: Vec<ValueKind> = parents.iter().map(|p| p.value_kind).collect();
    let kind = OperatorKind::Window {
        stat,
        size,
        emit_early,
    };
    let value_kind = kind.infer_value_kind(&kinds)?;
    Ok(obtain_node(parents, kind, value_kind))
}

fn twindow_node(
    stat: StatKind,
    duration_millis: i64,
    emit_early: bool,
    parents: Vec<Node>,
) -> EngineResult<Node> {
    if duration_millis <= 0 {
        return Err(EngineError::invalid_argument(format!(
            "time window duration must be positive, got {duration_millis}"
        )));
    }
    let kinds: Vec<ValueKind> = parents.iter().map(|p| p.value_kind).collect();
    let kind = OperatorKind::TWindow {
        stat,
        duration_millis,
        emit_early,
    };
    let value_kind = kind.infer_value_kind(&kinds)?;
    Ok(obtain_node(parents, kind, value_kind))
}

fn needs_at_least_two(stat: &StatKind, size: usize) -> EngineResult<()> {
    let minimum = match stat {
        StatKind::Var { .. } | StatKind::Cov { .. } | StatKind::CovMatrix { .. } => 2,
        StatKind::Sum | StatKind::Prod | StatKind::Mean => 1,
    };
    if size < minimum {
        return Err(EngineError::invalid_argument(format!(
            "window size {size} is too small for {stat:?}, need at least {minimum}"
        )));
    }
    Ok(())
}

/// Windowed univariate statistic (`Sum`/`Prod`/`Mean`/`Var`/`CovMatrix`)
/// over the `size` most recent ticks of `x`. Use [`cov_window`] for the
/// two-input `Cov` statistic.
pub fn window(x: Node, stat: StatKind, size: usize, emit_early: bool) -> EngineResult<Node> {
    if matches!(stat, StatKind::Cov { .. }) {
        return Err(EngineError::invalid_argument(
            "StatKind::Cov needs two inputs; use cov_window",
        ));
    }
    window_node(stat, size, emit_early, vec![x])
}

/// Windowed covariance of `x` and `y`, coaligned onto a common schedule
/// first.
pub fn cov_window(
    x: Node,
    y: Node,
    corrected: bool,
    size: usize,
    emit_early: bool,
) -> EngineResult<Node> {
    let aligned = coalign(vec![x, y], Alignment::Union)?;
    window_node(
        StatKind::Cov { corrected },
        size,
        emit_early,
        vec![aligned[0].clone(), aligned[1].clone()],
    )
}

/// Time-windowed univariate statistic, analogous to [`window`] but keyed
/// by a duration instead of a tick count.
pub fn twindow(
    x: Node,
    stat: StatKind,
    duration_millis: i64,
    emit_early: bool,
) -> EngineResult<Node> {
    if matches!(stat, StatKind::Cov { .. }) {
        return Err(EngineError::invalid_argument(
            "StatKind::Cov needs two inputs; use cov_twindow",
        ));
    }
    twindow_node(stat, duration_millis, emit_early, vec![x])
}

/// Time-windowed covariance of `x` and `y`, coaligned onto a common
/// schedule first.
pub fn cov_twindow(
    x: Node,
    y: Node,
    corrected: bool,
    duration_millis: i64,
    emit_early: bool,
) -> EngineResult<Node> {
    let aligned = coalign(vec![x, y], Alignment::Union)?;
    twindow_node(
        StatKind::Cov { corrected },
        duration_millis,
        emit_early,
        vec![aligned[0].clone(), aligned[1].clone()],
    )
}
