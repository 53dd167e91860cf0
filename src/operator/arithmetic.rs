//! Arithmetic node constructors: `+ - * /`
//! desugar to a `BinaryAligned` node under `UNION` alignment by default,
//! with scalar operands lifted to constant source nodes and constant
//! operands folded immediately.

use crate::alignment::Alignment;
use crate::block::Block;
use crate::error::EngineResult;
use crate::identity::obtain_node;
use crate::node::{constant_value, Node};
use crate::operator::{binary_aligned, source, BinaryCombine, OperatorKind};
use crate::value::Value;

/// Something that can appear as an arithmetic operand: an existing `Node`,
/// or a bare scalar lifted to a constant source.
pub trait IntoOperand {
    fn into_node(self) -> Node;
}

impl IntoOperand for Node {
    fn into_node(self) -> Node {
        self
    }
}

impl IntoOperand for f64 {
    fn into_node(self) -> Node {
        source::constant(self)
    }
}

fn fold_constants(op: BinaryCombine, left: &Node, right: &Node) -> Option<EngineResult<Node>> {
    let (lv, rv) = (constant_value(left)?, constant_value(right)?);
    let folded = op.apply(lv, rv);
    Some(folded.map(source::constant))
}

fn arithmetic(
    op: BinaryCombine,
    left: impl IntoOperand,
    right: impl IntoOperand,
    alignment: Alignment,
) -> EngineResult<Node> {
    let left = left.into_node();
    let right = right.into_node();
    if let Some(folded) = fold_constants(op, &left, &right) {
        return folded;
    }
    binary_aligned(left, right, alignment, None, op)
}

pub fn add(left: impl IntoOperand, right: impl IntoOperand) -> EngineResult<Node> {
    arithmetic(BinaryCombine::Add, left, right, Alignment::Union)
}

pub fn sub(left: impl IntoOperand, right: impl IntoOperand) -> EngineResult<Node> {
    arithmetic(BinaryCombine::Sub, left, right, Alignment::Union)
}

pub fn mul(left: impl IntoOperand, right: impl IntoOperand) -> EngineResult<Node> {
    arithmetic(BinaryCombine::Mul, left, right, Alignment::Union)
}

pub fn div(left: impl IntoOperand, right: impl IntoOperand) -> EngineResult<Node> {
    arithmetic(BinaryCombine::Div, left, right, Alignment::Union)
}

/// Same four operators under an explicitly chosen alignment, for callers
/// who don't want the `UNION` default.
pub fn add_aligned(left: Node, right: Node, alignment: Alignment) -> EngineResult<Node> {
    arithmetic(BinaryCombine::Add, left, right, alignment)
}

pub fn sub_aligned(left: Node, right: Node, alignment: Alignment) -> EngineResult<Node> {
    arithmetic(BinaryCombine::Sub, left, right, alignment)
}

pub fn mul_aligned(left: Node, right: Node, alignment: Alignment) -> EngineResult<Node> {
    arithmetic(BinaryCombine::Mul, left, right, alignment)
}

pub fn div_aligned(left: Node, right: Node, alignment: Alignment) -> EngineResult<Node> {
    arithmetic(BinaryCombine::Div, left, right, alignment)
}

/// Elementwise square root, used to build `cor` from `cov` and `var`.
/// Constant-folds like every other arithmetic constructor.
pub fn sqrt(x: Node) -> Node {
    if let Some(v) = constant_value(&x) {
        return source::constant(v.map(f64::sqrt));
    }
    let value_kind = x.value_kind;
    obtain_node(vec![x], OperatorKind::Sqrt, value_kind)
}

pub fn run_sqrt(parent: &Block<Value>) -> Block<Value> {
    let values: Vec<Value> = parent.values().iter().map(|v| v.map(f64::sqrt)).collect();
    Block::new_unchecked(parent.times().to_vec(), values)
}
