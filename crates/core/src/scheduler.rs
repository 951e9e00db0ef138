//! Scheduler module - virtual-time task queue
//!
//! Every delayed step of the engine (match checks, grace expiry, refills,
//! cascade falls, periodic scans) is a task in one queue keyed by due time.
//! Tasks due at the same millisecond run in the order they were scheduled.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

#[derive(Debug, Clone)]
struct Entry<T> {
    due_ms: u64,
    seq: u64,
    task: T,
}

impl<T> PartialEq for Entry<T> {
    fn eq(&self, other: &Self) -> bool {
        self.due_ms == other.due_ms && self.seq == other.seq
    }
}

impl<T> Eq for Entry<T> {}

impl<T> PartialOrd for Entry<T> {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for Entry<T> {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        (self.due_ms, self.seq).cmp(&(other.due_ms, other.seq))
    }
}

/// Min-heap of tasks ordered by `(due_ms, insertion order)`.
#[derive(Debug, Clone)]
pub struct Scheduler<T> {
    heap: BinaryHeap<Reverse<Entry<T>>>,
    next_seq: u64,
}

impl<T> Scheduler<T> {
    pub fn new() -> Self {
        Self {
            heap: BinaryHeap::new(),
            next_seq: 0,
        }
    }

    /// Schedule `task` to run `delay_ms` after `now_ms`.
    pub fn schedule(&mut self, now_ms: u64, delay_ms: u64, task: T) {
        let entry = Entry {
            due_ms: now_ms.saturating_add(delay_ms),
            seq: self.next_seq,
            task,
        };
        self.next_seq += 1;
        self.heap.push(Reverse(entry));
    }

    /// Pop the earliest task due at or before `until_ms`, with its due time.
    pub fn pop_due(&mut self, until_ms: u64) -> Option<(u64, T)> {
        if self.heap.peek()?.0.due_ms > until_ms {
            return None;
        }
        self.heap.pop().map(|Reverse(e)| (e.due_ms, e.task))
    }

    pub fn next_due(&self) -> Option<u64> {
        self.heap.peek().map(|Reverse(e)| e.due_ms)
    }

    /// Cancel everything.
    pub fn clear(&mut self) {
        self.heap.clear();
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Whether any pending task satisfies `pred`.
    pub fn any(&self, mut pred: impl FnMut(&T) -> bool) -> bool {
        self.heap.iter().any(|Reverse(e)| pred(&e.task))
    }
}

impl<T> Default for Scheduler<T> {
    fn default() -> Self {
        Self::new()
    }
}
