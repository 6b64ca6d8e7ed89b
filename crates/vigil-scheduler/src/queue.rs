use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};
use std::sync::Mutex;
use std::time::Duration;

use chrono::{DateTime, Utc};
use vigil_domain::Pair;

/// One scheduled slot. Ordered by `due_at` first, then by `(check_id,
/// host_id)` lexical order for deterministic tie-breaking.
#[derive(Debug, Clone, PartialEq, Eq)]
struct DueEntry {
    due_at: DateTime<Utc>,
    pair: Pair,
}

impl Ord for DueEntry {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.due_at
            .cmp(&other.due_at)
            .then_with(|| self.pair.check_id.cmp(&other.pair.check_id))
            .then_with(|| self.pair.host_id.cmp(&other.pair.host_id))
    }
}

impl PartialOrd for DueEntry {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

/// A due-time priority queue over (host,check) pairs.
///
/// `due_at` tracks each pair's current canonical due time; heap entries are
/// popped lazily and discarded if stale (the pair was disabled or
/// rescheduled since the entry was pushed) rather than removed in place —
/// `BinaryHeap` has no efficient arbitrary removal.
#[derive(Debug, Default)]
pub struct PriorityQueue {
    inner: Mutex<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    heap: BinaryHeap<Reverse<DueEntry>>,
    due_at: HashMap<Pair, DateTime<Utc>>,
    /// The interval each pair was last scheduled with, kept only so the
    /// dispatcher can log a lag warning in terms of "how many intervals late".
    intervals: HashMap<Pair, Duration>,
}

/// A pair that became due, ready to hand to a worker.
#[derive(Debug, Clone, PartialEq)]
pub struct ReadyEntry {
    pub pair: Pair,
    pub due_at: DateTime<Utc>,
    pub interval: Duration,
}

impl PriorityQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enable(&self, pair: Pair, due_at: DateTime<Utc>, interval: Duration) {
        let mut inner = self.inner.lock().expect("scheduler queue lock poisoned");
        inner.due_at.insert(pair.clone(), due_at);
        inner.intervals.insert(pair.clone(), interval);
        inner.heap.push(Reverse(DueEntry { due_at, pair }));
    }

    pub fn disable(&self, pair: &Pair) {
        let mut inner = self.inner.lock().expect("scheduler queue lock poisoned");
        inner.due_at.remove(pair);
        inner.intervals.remove(pair);
    }

    /// Equivalent to `enable` — reschedule just replaces the canonical due
    /// time, making the pair's outstanding heap entries stale.
    pub fn reschedule(&self, pair: Pair, due_at: DateTime<Utc>, interval: Duration) {
        self.enable(pair, due_at, interval);
    }

    pub fn contains(&self, pair: &Pair) -> bool {
        self.inner.lock().expect("scheduler queue lock poisoned").due_at.contains_key(pair)
    }

    /// Peek the next canonical due time across all live pairs, skipping stale
    /// heap entries as it goes.
    pub fn next_due_at(&self) -> Option<DateTime<Utc>> {
        let mut inner = self.inner.lock().expect("scheduler queue lock poisoned");
        loop {
            let Reverse(top) = inner.heap.peek()?.clone();
            match inner.due_at.get(&top.pair) {
                Some(canonical) if *canonical == top.due_at => return Some(top.due_at),
                _ => {
                    inner.heap.pop();
                }
            }
        }
    }

    /// Pop every live entry due at or before `now`.
    pub fn drain_ready(&self, now: DateTime<Utc>) -> Vec<ReadyEntry> {
        let mut inner = self.inner.lock().expect("scheduler queue lock poisoned");
        let mut ready = Vec::new();
        loop {
            let Some(Reverse(top)) = inner.heap.peek().cloned() else { break };
            if top.due_at > now {
                break;
            }
            inner.heap.pop();
            match inner.due_at.get(&top.pair) {
                Some(canonical) if *canonical == top.due_at => {
                    let interval = inner.intervals.remove(&top.pair).unwrap_or(Duration::from_secs(60));
                    inner.due_at.remove(&top.pair);
                    ready.push(ReadyEntry { pair: top.pair, due_at: top.due_at, interval });
                }
                _ => continue, // stale: disabled or superseded by a later reschedule
            }
        }
        ready
    }

    pub fn len(&self) -> usize {
        self.inner.lock().expect("scheduler queue lock poisoned").due_at.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
