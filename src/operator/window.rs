//! The fixed-count window operator:
//! retains the `window` most recent inputs, folding them with [`AccData`]
//! via the amortized-O(1) two-stack queue in [`crate::operator::swag`].

use crate::block::{Block, BlockBuilder};
use crate::error::EngineResult;
use crate::maybe::Maybe;
use crate::operator::combine::{AccData, StatKind};
use crate::operator::swag::SwagQueue;
use crate::timestamp::Timestamp;
use crate::value::Value;

pub struct FixedWindow {
    stat: StatKind,
    capacity: usize,
    queue: SwagQueue<Timestamp>,
}

impl FixedWindow {
    pub fn new(stat: StatKind, capacity: usize) -> Self {
        FixedWindow {
            stat,
            capacity,
            queue: SwagQueue::new(),
        }
    }

    /// Push a new element, evicting the oldest if the window is already
    /// full.
    pub fn update(&mut self, time: Timestamp, inputs: &[Value]) -> EngineResult<()> {
        if self.queue.len() >= self.capacity {
            self.queue.pop_front()?;
        }
        let single = AccData::wrap(self.stat, inputs)?;
        self.queue.push(time, single)
    }

    /// The fold of all currently-retained elements, if any.
    pub fn value(&self) -> EngineResult<Option<AccData>> {
        self.queue.fold()
    }

    /// Whether the configured window count has been reached.
    pub fn full(&self) -> bool {
        self.queue.len() >= self.capacity
    }

    /// The per-step emission decision: `Maybe::Some(value)` iff
    /// (`emit_early` or `full()`) and the retained fold's own `should_tick`
    /// gate passes, `Maybe::None` otherwise.
    fn step(&self, emit_early: bool) -> EngineResult<Maybe<Value>> {
        if !(emit_early || self.full()) {
            return Ok(Maybe::none());
        }
        Ok(match self.value()? {
            Some(acc) => acc.step(false),
            None => Maybe::none(),
        })
    }
}

/// Run one fixed-count window node over its (already time-aligned, if more
/// than one) parent blocks. Emission rule: update, then tick
/// iff `always_ticks` OR (`emit_early` OR `full()`) AND `should_tick`.
pub fn run(
    emit_early: bool,
    state: &mut FixedWindow,
    parents: &[Block<Value>],
) -> EngineResult<Block<Value>> {
    let len = parents[0].len();
    let mut out = BlockBuilder::with_capacity(len);
    for i in 0..len {
        let inputs: Vec<Value> = parents.iter().map(|p| p.values()[i].clone()).collect();
        let time = parents[0].times()[i];
        state.update(time, &inputs)?;
        if let Maybe::Some(value) = state.step(emit_early)? {
            out.push(time, value);
        }
    }
    Ok(out.finish())
}
