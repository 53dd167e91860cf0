//! The "two stacks" sliding-window associative aggregation trick: a FIFO
//! queue that supports
//! `push`/`pop_front`/`fold of current contents` all in amortized O(1), for
//! any associative (not necessarily commutative) combiner.
//!
//! Classic construction (Tangwongsan et al.; spec calls it the
//! "De-Rijke monoid trick"): an `in` stack accumulates freshly pushed
//! elements with a running fold from the bottom of that stack upward; an
//! `out` stack holds the older elements, each entry's fold covering itself
//! and everything still above it (i.e. everything not yet popped,
//! chronologically). When `out` runs dry, the whole `in` stack is drained
//! onto it, which inverts push order into pop order while rebuilding each
//! level's fold in one pass.

use crate::error::EngineResult;
use crate::operator::combine::AccData;

struct Entry<T> {
    value: T,
    /// This element's own wrapped fold, never combined with a neighbor.
    single: AccData,
    /// For an `in`-stack entry: the fold of everything from the bottom of
    /// `in` up to and including this entry (chronological order). For an
    /// `out`-stack entry: the fold of this entry and everything above it
    /// in the stack (i.e. everything still pending, chronological order).
    fold: AccData,
}

/// Amortized-O(1) FIFO queue over `AccData` folds.
pub struct SwagQueue<T> {
    in_stack: Vec<Entry<T>>,
    out_stack: Vec<Entry<T>>,
}

impl<T> SwagQueue<T> {
    pub fn new() -> Self {
        SwagQueue {
            in_stack: Vec::new(),
            out_stack: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.in_stack.len() + self.out_stack.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Push a new (the newest) element along with its single-element fold.
    pub fn push(&mut self, value: T, single: AccData) -> EngineResult<()> {
        let fold = match self.in_stack.last() {
            Some(top) => AccData::combine(&top.fold, &single)?,
            None => single.clone(),
        };
        self.in_stack.push(Entry { value, single, fold });
        Ok(())
    }

    /// Evict the oldest element, if any, returning it.
    pub fn pop_front(&mut self) -> EngineResult<Option<T>> {
        if self.out_stack.is_empty() {
            self.rebalance()?;
        }
        Ok(self.out_stack.pop().map(|e| e.value))
    }

    /// Peek the oldest element without evicting it.
    pub fn front(&mut self) -> EngineResult<Option<&T>> {
        if self.out_stack.is_empty() {
            self.rebalance()?;
        }
        Ok(self.out_stack.last().map(|e| &e.value))
    }

    /// The fold of every retained element, in chronological (push) order.
    pub fn fold(&self) -> EngineResult<Option<AccData>> {
        match (self.out_stack.last(), self.in_stack.last()) {
            (None, None) => Ok(None),
            (Some(o), None) => Ok(Some(o.fold.clone())),
            (None, Some(i)) => Ok(Some(i.fold.clone())),
            (Some(o), Some(i)) => Ok(Some(AccData::combine(&o.fold, &i.fold)?)),
        }
    }

    fn rebalance(&mut self) -> EngineResult<()> {
        while let Some(entry) = self.in_stack.pop() {
            let fold = match self.out_stack.last() {
                Some(top) => AccData::combine(&entry.single, &top.fold)?,
                None => entry.single.clone(),
            };
            self.out_stack.push(Entry {
                value: entry.value,
                single: entry.single,
                fold,
            });
        }
        Ok(())
    }
}

impl<T> Default for SwagQueue<T> {
    fn default() -> Self {
        SwagQueue::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operator::combine::StatKind;
    use crate::value::Value;

    fn wrap(x: f64) -> AccData {
        AccData::wrap(StatKind::Sum, &[Value::Scalar(x)]).unwrap()
    }

    #[test]
    fn fold_matches_sum_regardless_of_eviction_pattern() {
        let mut q: SwagQueue<f64> = SwagQueue::new();
        for x in [1.0, 2.0, 3.0, 4.0, 5.0] {
            q.push(x, wrap(x)).unwrap();
        }
        // evict two, then push more, interleaving in/out traffic.
        assert_eq!(q.pop_front().unwrap(), Some(1.0));
        assert_eq!(q.pop_front().unwrap(), Some(2.0));
        q.push(6.0, wrap(6.0)).unwrap();
        let AccData::Sum(Value::Scalar(total)) = q.fold().unwrap().unwrap() else {
            panic!("expected Sum");
        };
        assert_eq!(total, 3.0 + 4.0 + 5.0 + 6.0);
        assert_eq!(q.len(), 4);
    }

    #[test]
    fn fifo_pop_order() {
        let mut q: SwagQueue<f64> = SwagQueue::new();
        for x in [10.0, 20.0, 30.0] {
            q.push(x, wrap(x)).unwrap();
        }
        assert_eq!(q.pop_front().unwrap(), Some(10.0));
        q.push(40.0, wrap(40.0)).unwrap();
        assert_eq!(q.pop_front().unwrap(), Some(20.0));
        assert_eq!(q.pop_front().unwrap(), Some(30.0));
        assert_eq!(q.pop_front().unwrap(), Some(40.0));
        assert_eq!(q.pop_front().unwrap(), None);
    }
}
