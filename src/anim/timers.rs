use std::cmp::Ordering;
use std::collections::BinaryHeap;

use super::token::CancelToken;

struct Entry<E> {
    due: f64,
    seq: u64,
    token: CancelToken,
    event: E,
}

impl<E> PartialEq for Entry<E> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl<E> Eq for Entry<E> {}

impl<E> PartialOrd for Entry<E> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<E> Ord for Entry<E> {
    // Reversed so the max-heap pops the earliest (due, seq) first.
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .due
            .total_cmp(&self.due)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

/// Virtual-clock timer queue. Entries whose token was cancelled are dropped
/// instead of fired.
pub struct TimerQueue<E> {
    heap: BinaryHeap<Entry<E>>,
    next_seq: u64,
}

impl<E> Default for TimerQueue<E> {
    fn default() -> Self {
        Self {
            heap: BinaryHeap::new(),
            next_seq: 0,
        }
    }
}

impl<E> TimerQueue<E> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, due: f64, token: &CancelToken, event: E) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.heap.push(Entry {
            due,
            seq,
            token: token.clone(),
            event,
        });
    }

    pub fn pop_due(&mut self, now: f64) -> Option<(f64, E)> {
        loop {
            let head = self.heap.peek()?;
            if head.token.is_cancelled() {
                self.heap.pop();
                continue;
            }
            if head.due > now {
                return None;
            }
            let entry = self.heap.pop()?;
            return Some((entry.due, entry.event));
        }
    }

    pub fn next_due(&self) -> Option<f64> {
        self.heap
            .iter()
            .filter(|e| !e.token.is_cancelled())
            .map(|e| e.due)
            .min_by(f64::total_cmp)
    }

    pub fn cancel_all(&mut self) {
        self.heap.clear();
    }

    pub fn pending(&self) -> usize {
        self.heap.iter().filter(|e| !e.token.is_cancelled()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.pending() == 0
    }
}
