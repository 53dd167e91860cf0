//! The time-window operator: identical contract to
//! [`crate::operator::window::FixedWindow`], but retention is governed by
//! "knot time within `window` duration of the most recent tick" rather than
//! a fixed count. Eviction still proceeds in monotonic arrival order, so
//! the same two-stack queue applies; only the eviction predicate differs.

use crate::block::{Block, BlockBuilder};
use crate::error::EngineResult;
use crate::maybe::Maybe;
use crate::operator::combine::{AccData, StatKind};
use crate::operator::swag::SwagQueue;
use crate::timestamp::Timestamp;
use crate::value::Value;

pub struct TimeWindow {
    stat: StatKind,
    duration_millis: i64,
    queue: SwagQueue<Timestamp>,
    /// The window is "full" the first time its retained span reaches
    /// `window`; once true it stays true (it can never un-reach that span
    /// as more recent ticks arrive).
    reached_full_span: bool,
}

impl TimeWindow {
    pub fn new(stat: StatKind, duration_millis: i64) -> Self {
        TimeWindow {
            stat,
            duration_millis,
            queue: SwagQueue::new(),
            reached_full_span: false,
        }
    }

    /// Push a new element at `time`, evicting every knot older than
    /// `time - window`. A knot about to be evicted proves the retained
    /// span has reached `window` (it was in range before this push and is
    /// now being pushed out), so `reached_full_span` is latched against
    /// the pre-eviction front, not whatever survives the loop.
    pub fn update(&mut self, time: Timestamp, inputs: &[Value]) -> EngineResult<()> {
        loop {
            match self.queue.front()? {
                Some(&oldest) if time - oldest >= self.duration_millis => {
                    self.reached_full_span = true;
                    self.queue.pop_front()?;
                }
                _ => break,
            }
        }
        let single = AccData::wrap(self.stat, inputs)?;
        self.queue.push(time, single)?;
        Ok(())
    }

    pub fn value(&self) -> EngineResult<Option<AccData>> {
        self.queue.fold()
    }

    pub fn full(&self) -> bool {
        self.reached_full_span
    }

    /// The per-step emission decision, identical in shape to
    /// [`crate::operator::window::FixedWindow::step`].
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

/// Run one time-window node over its (already time-aligned, if more than
/// one) parent blocks. Same emission rule as the fixed-count window.
pub fn run(
    emit_early: bool,
    state: &mut TimeWindow,
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
