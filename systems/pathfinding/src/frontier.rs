//! Min-priority frontier used by the A* search.

use std::{cmp::Ordering, collections::BinaryHeap};

/// Entry queued for expansion.
///
/// The same node may be queued several times with different costs; entries
/// whose cost no longer matches the best known cost are discarded when popped.
#[derive(Clone, Copy, Debug)]
pub(crate) struct FrontierEntry {
    pub(crate) index: usize,
    pub(crate) cost: f32,
    priority: f32,
}

impl PartialEq for FrontierEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for FrontierEntry {}

impl PartialOrd for FrontierEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for FrontierEntry {
    // Reversed so the max-heap pops the lowest priority first.
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .priority
            .total_cmp(&self.priority)
            .then_with(|| other.index.cmp(&self.index))
    }
}

/// Binary min-heap keyed by estimated total cost.
#[derive(Debug, Default)]
pub(crate) struct Frontier {
    heap: BinaryHeap<FrontierEntry>,
}

impl Frontier {
    pub(crate) fn push(&mut self, index: usize, cost: f32, priority: f32) {
        self.heap.push(FrontierEntry {
            index,
            cost,
            priority,
        });
    }

    pub(crate) fn pop(&mut self) -> Option<FrontierEntry> {
        self.heap.pop()
    }

    pub(crate) fn clear(&mut self) {
        self.heap.clear();
    }
}
