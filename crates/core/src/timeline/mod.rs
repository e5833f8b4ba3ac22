//! Virtual time and deferred transitions.
//!
//! The engine never reads a wall clock. Hosts pass frame timestamps in, and
//! deferred work is expressed as "fire at T unless cancelled" entries that
//! become due when the clock reaches T.

use serde::{Deserialize, Serialize};

/// Monotonic millisecond clock driven by incoming timestamps.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClock {
    pub now_ms: u64,
}

impl SessionClock {
    pub fn reset(&mut self, now_ms: u64) {
        self.now_ms = now_ms;
    }

    /// Moves the clock forward to `now_ms`; earlier timestamps are ignored so
    /// the clock never runs backwards.
    pub fn advance_to(&mut self, now_ms: u64) -> u64 {
        self.now_ms = self.now_ms.max(now_ms);
        self.now_ms
    }
}

/// Handle returned by [`Scheduler::schedule`], used to cancel the entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimerId(u64);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduledEvent<E> {
    pub id: TimerId,
    pub due_ms: u64,
    pub payload: E,
}

/// One-shot timers ordered by due time.
#[derive(Debug)]
pub struct Scheduler<E> {
    events: Vec<ScheduledEvent<E>>,
    next_id: u64,
}

impl<E> Default for Scheduler<E> {
    fn default() -> Self {
        Self {
            events: Vec::new(),
            next_id: 0,
        }
    }
}

impl<E> Scheduler<E> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, due_ms: u64, payload: E) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        self.events.push(ScheduledEvent { id, due_ms, payload });
        // Stable sort keeps insertion order among equal due times.
        self.events.sort_by_key(|event| event.due_ms);
        id
    }

    /// Cancels a pending entry. Returns `false` if it already fired or was
    /// cancelled before.
    pub fn cancel(&mut self, id: TimerId) -> bool {
        let before = self.events.len();
        self.events.retain(|event| event.id != id);
        self.events.len() != before
    }

    pub fn cancel_all(&mut self) {
        self.events.clear();
    }

    pub fn is_pending(&self, id: TimerId) -> bool {
        self.events.iter().any(|event| event.id == id)
    }

    pub fn pending(&self) -> usize {
        self.events.len()
    }

    pub fn next_due(&self) -> Option<u64> {
        self.events.first().map(|event| event.due_ms)
    }

    /// Removes and returns every entry due at or before `now_ms`, earliest
    /// first.
    pub fn take_due(&mut self, now_ms: u64) -> Vec<ScheduledEvent<E>> {
        let split = self
            .events
            .iter()
            .position(|event| event.due_ms > now_ms)
            .unwrap_or(self.events.len());
        self.events.drain(..split).collect()
    }
}
