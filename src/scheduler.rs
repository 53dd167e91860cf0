//! The block-oriented evaluation scheduler: given a root node
//! and a half-open interval `[t_start, t_end)`, walk the DAG in
//! dependency order, threading freshly allocated per-node mutable state
//! through a single `run` call per node, and return the root's `Block`.
//!
//! Grounded on renoir's two-phase `Operator::setup`/`Operator::next`
//! scheduling split (`scheduler::ExecutionMetadata`): state is built once
//! per node ("setup"), then `run` plays the role of renoir's per-block
//! `next`, except here there is exactly one `run` per node per
//! `evaluate` — a single-batch evaluation.

use std::collections::HashMap;

use crate::alignment::{self, AlignmentState};
use crate::block::Block;
use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};
use crate::graph::topological_order;
use crate::node::{Node, NodeId};
use crate::operator::inception::InceptionState;
use crate::operator::twindow::TimeWindow;
use crate::operator::window::FixedWindow;
use crate::operator::{arithmetic, ema, inception, lag, misc, source, twindow, window, OperatorKind};
use crate::timestamp::Timestamp;
use crate::value::Value;

/// Per-node mutable scratch space, created fresh for one `evaluate` call
/// and dropped when it returns. One variant
/// per operator shape; nodes that carry no state between ticks (sqrt,
/// first_knot, throttle, count_knots) still get an entry so the dispatch
/// in [`run_node`] stays uniform.
enum NodeState {
    Source(source::SourceState),
    Lag(lag::LagState),
    Ema(ema::EmaState),
    BinaryAligned(AlignmentState),
    Inception(InceptionState),
    Window(FixedWindow),
    TWindow(TimeWindow),
    Stateless,
}

impl NodeState {
    fn new(kind: &OperatorKind) -> Self {
        match kind {
            OperatorKind::Source(spec) => NodeState::Source(source::SourceState::new(spec)),
            OperatorKind::Lag(_) => NodeState::Lag(lag::LagState::default()),
            OperatorKind::Ema(_) => NodeState::Ema(ema::EmaState::default()),
            OperatorKind::BinaryAligned { initial, .. } => {
                NodeState::BinaryAligned(AlignmentState::new(initial.clone()))
            }
            OperatorKind::Inception { .. } => NodeState::Inception(InceptionState::default()),
            OperatorKind::Window { stat, size, .. } => {
                NodeState::Window(FixedWindow::new(*stat, *size))
            }
            OperatorKind::TWindow {
                stat,
                duration_millis,
                ..
            } => NodeState::TWindow(TimeWindow::new(*stat, *duration_millis)),
            OperatorKind::Throttle(_)
            | OperatorKind::FirstKnot
            | OperatorKind::CountKnots
            | OperatorKind::Sqrt => NodeState::Stateless,
        }
    }
}

/// The per-evaluation container mapping node id to per-node state and,
/// once computed, to the node's `Block`. Dropped when `evaluate` returns;
/// nothing here survives across calls.
struct EvaluationState {
    node_state: HashMap<NodeId, NodeState>,
    blocks: HashMap<NodeId, Block<Value>>,
}

impl EvaluationState {
    fn new(order: &[Node]) -> Self {
        let node_state = order
            .iter()
            .map(|n| (n.id, NodeState::new(&n.kind)))
            .collect();
        EvaluationState {
            node_state,
            blocks: HashMap::with_capacity(order.len()),
        }
    }
}

/// Evaluate `root` over `[t_start, t_end)` using [`EngineConfig::default`].
pub fn evaluate(root: &Node, t_start: Timestamp, t_end: Timestamp) -> EngineResult<Block<Value>> {
    evaluate_with_config(root, t_start, t_end, &EngineConfig::default())
}

/// Evaluate `root` over `[t_start, t_end)`, subject to `config`.
///
/// 1. Enumerate all ancestors of `root` in topological order.
/// 2. Allocate a fresh [`EvaluationState`].
/// 3. Run each node exactly once, in order, over the already-computed
///    `Block`s of its parents.
/// 4. Return the root's `Block`.
pub fn evaluate_with_config(
    root: &Node,
    t_start: Timestamp,
    t_end: Timestamp,
    config: &EngineConfig,
) -> EngineResult<Block<Value>> {
    config.check_span(t_start, t_end)?;

    let span = tracing::info_span!("evaluate", root = root.id.0, t_start = t_start.millis(), t_end = t_end.millis());
    let _enter = span.enter();

    let order = topological_order(root);
    let mut state = EvaluationState::new(&order);

    for node in &order {
        tracing::trace!(node_id = node.id.0, "run");
        let parent_blocks: Vec<Block<Value>> = node
            .parents
            .iter()
            .map(|p| {
                state
                    .blocks
                    .get(&p.id)
                    .cloned()
                    .ok_or_else(|| EngineError::internal("parent evaluated out of order"))
            })
            .collect::<EngineResult<_>>()?;

        let node_state = state
            .node_state
            .get_mut(&node.id)
            .ok_or_else(|| EngineError::internal("missing per-node state"))?;

        let out = run_node(&node.kind, node_state, t_start, t_end, &parent_blocks)?;
        state.blocks.insert(node.id, out);
    }

    state
        .blocks
        .remove(&root.id)
        .ok_or_else(|| EngineError::internal("root node never ran"))
}

fn run_node(
    kind: &OperatorKind,
    state: &mut NodeState,
    t_start: Timestamp,
    t_end: Timestamp,
    parents: &[Block<Value>],
) -> EngineResult<Block<Value>> {
    match (kind, state) {
        (OperatorKind::Source(spec), NodeState::Source(s)) => {
            source::run(spec, s, t_start, t_end)
        }
        (OperatorKind::Lag(k), NodeState::Lag(s)) => lag::run(*k, s, &parents[0]),
        (OperatorKind::Ema(alpha), NodeState::Ema(s)) => ema::run(*alpha, s, &parents[0]),
        (OperatorKind::Sqrt, NodeState::Stateless) => Ok(arithmetic::run_sqrt(&parents[0])),
        (OperatorKind::FirstKnot, NodeState::Stateless) => Ok(misc::run_first_knot(&parents[0])),
        (OperatorKind::CountKnots, NodeState::Stateless) => Ok(misc::run_count_knots(&parents[0])),
        (OperatorKind::Throttle(n), NodeState::Stateless) => {
            Ok(misc::run_throttle(*n, &parents[0]))
        }
        (
            OperatorKind::BinaryAligned {
                alignment, combine, ..
            },
            NodeState::BinaryAligned(s),
        ) => alignment::merge(&parents[0], &parents[1], *alignment, s, |l, r| combine.apply(l, r)),
        (OperatorKind::Inception { stat, always_ticks }, NodeState::Inception(s)) => {
            inception::run(*stat, *always_ticks, s, parents)
        }
        (OperatorKind::Window { emit_early, .. }, NodeState::Window(s)) => {
            window::run(*emit_early, s, parents)
        }
        (OperatorKind::TWindow { emit_early, .. }, NodeState::TWindow(s)) => {
            twindow::run(*emit_early, s, parents)
        }
        _ => Err(EngineError::internal(
            "operator kind and per-node state disagree; this is a scheduler bug",
        )),
    }
}

/// The output `Value`'s [`crate::value::ValueKind`] of an already-
/// constructed node; cheap, since every constructor computes and caches
/// it at construction time.
pub fn value_type(node: &Node) -> crate::value::ValueKind {
    node.value_kind
}
