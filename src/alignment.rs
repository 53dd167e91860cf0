//! The alignment algebra over two irregularly-sampled streams.
//!
//! `AlignmentMerger` walks two already-computed `Block<Value>`s with a
//! classic two-pointer merge, picking the smaller of the two next
//! timestamps at each step (and advancing both pointers when they tie).
//! Per-side "latched" state — the most recently observed value, and
//! whether that side has ticked at all yet — is carried in
//! [`AlignmentState`] so that, within one `evaluate` call, a binary
//! operator's latch survives across... well, there is only one `run` per
//! node per `evaluate`, so in practice the latch is seeded once (optionally
//! from `initial_values`) and then walked forward in a single pass over
//! both parent blocks.

use serde::{Deserialize, Serialize};

use crate::block::{Block, BlockBuilder};
use crate::error::EngineResult;
use crate::timestamp::Timestamp;
use crate::value::Value;

/// Policy governing when a binary operator emits, given that its two
/// inputs tick on different schedules. Default is [`Alignment::Union`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Alignment {
    Union,
    Intersect,
    Left,
}

impl Default for Alignment {
    fn default() -> Self {
        Alignment::Union
    }
}

/// Per-side latch: the most recently observed value, and whether one has
/// ever been observed (bootstrapped by `initial_values`, or set on first
/// tick).
#[derive(Clone, Debug)]
struct Latch {
    value: Option<Value>,
}

impl Latch {
    fn seeded(initial: Option<Value>) -> Self {
        Latch { value: initial }
    }

    fn primed(&self) -> bool {
        self.value.is_some()
    }

    fn set(&mut self, v: Value) {
        self.value = Some(v);
    }

    fn get(&self) -> Option<&Value> {
        self.value.as_ref()
    }
}

/// Latched alignment state for one binary operator instance, for the
/// duration of one `run`.
#[derive(Clone, Debug)]
pub struct AlignmentState {
    left: Latch,
    right: Latch,
}

impl AlignmentState {
    pub fn new(initial: Option<(Value, Value)>) -> Self {
        match initial {
            Some((l, r)) => AlignmentState {
                left: Latch::seeded(Some(l)),
                right: Latch::seeded(Some(r)),
            },
            None => AlignmentState {
                left: Latch::seeded(None),
                right: Latch::seeded(None),
            },
        }
    }

    fn primed(&self) -> bool {
        self.left.primed() && self.right.primed()
    }
}

/// Merge `x` and `y` under `alignment`, combining the latched pair at each
/// emitted tick with `combine`. `state` carries the latch forward so a
/// caller evaluating the same operator over successive intervals (not done
/// within one `evaluate`, but supported by the primitive) keeps priming
/// information.
pub fn merge(
    x: &Block<Value>,
    y: &Block<Value>,
    alignment: Alignment,
    state: &mut AlignmentState,
    mut combine: impl FnMut(&Value, &Value) -> EngineResult<Value>,
) -> EngineResult<Block<Value>> {
    let xt = x.times();
    let yt = y.times();
    let mut i = 0usize;
    let mut j = 0usize;
    let mut out = BlockBuilder::new();

    while i < xt.len() || j < yt.len() {
        let take_x = j >= yt.len() || (i < xt.len() && xt[i] <= yt[j]);
        let take_y = i >= xt.len() || (j < yt.len() && yt[j] <= xt[i]);
        let tick_time: Timestamp = if take_x { xt[i] } else { yt[j] };

        if take_x {
            state.left.set(x.values()[i].clone());
        }
        if take_y {
            state.right.set(y.values()[j].clone());
        }

        let should_emit = match alignment {
            Alignment::Union => state.primed(),
            Alignment::Intersect => take_x && take_y && state.primed(),
            Alignment::Left => take_x && state.right.primed(),
        };

        if should_emit {
            let l = state.left.get().expect("left latch primed by should_emit");
            let r = state.right.get().expect("right latch primed by should_emit");
            out.push(tick_time, combine(l, r)?);
        }

        if take_x {
            i += 1;
        }
        if take_y {
            j += 1;
        }
    }

    Ok(out.finish())
}
