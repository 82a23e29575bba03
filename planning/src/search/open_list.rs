//! C6's open list: a binary min-heap of `(priority, state id)` with no
//! decrease-key or removal support, tolerating multiple stale entries per
//! state — the "pop-then-verify status" idiom of §9.

use super::state_space::StateId;
use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// `(f, h)`, ascending lexicographic — smaller is higher priority.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct Priority {
    pub f: u32,
    pub h: u32,
}

#[derive(Eq, PartialEq)]
struct Entry {
    priority: Priority,
    state: StateId,
}

impl Ord for Entry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed: BinaryHeap is a max-heap, we want the smallest priority
        // out first, tie-broken by ascending state id (§5's ordering guarantee).
        (other.priority.f, other.priority.h, other.state.to_u32()).cmp(&(
            self.priority.f,
            self.priority.h,
            self.state.to_u32(),
        ))
    }
}

impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[derive(Default)]
pub struct OpenList {
    heap: BinaryHeap<Entry>,
}

impl OpenList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, priority: Priority, state: StateId) {
        self.heap.push(Entry { priority, state });
    }

    pub fn pop(&mut self) -> Option<(Priority, StateId)> {
        self.heap.pop().map(|e| (e.priority, e.state))
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}
