//! Deadline-ordered wait queue for sleeping computations.
//!
//! Pending deadlines live in a `BTreeMap` keyed by `(Instant, sequence)`:
//! ordered by expiry with a monotonically increasing sequence number, so
//! simultaneous deadlines resolve in insertion order, deterministically.
//! Insert, cancel and minimum queries are all logarithmic.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use std::task::Waker;
use std::time::{Duration, Instant};

/// Shared handle to the runtime's timer queue, cloned into sleep futures.
pub(crate) type TimerHandle = Arc<Mutex<TimerQueue>>;

/// Identifies one scheduled deadline so it can be cancelled later.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct TimerKey {
    deadline: Instant,
    sequence: u64,
}

pub(crate) struct TimerQueue {
    entries: BTreeMap<(Instant, u64), Waker>,
    next_sequence: u64,
}

impl TimerQueue {
    pub(crate) fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
            next_sequence: 0,
        }
    }

    /// Schedules `waker` to be woken once `deadline` has passed.
    pub(crate) fn schedule(&mut self, deadline: Instant, waker: Waker) -> TimerKey {
        let sequence = self.next_sequence;
        self.next_sequence += 1;

        self.entries.insert((deadline, sequence), waker);

        log::trace!("timers: scheduled #{sequence} ({} pending)", self.entries.len());

        TimerKey { deadline, sequence }
    }

    /// Removes a pending deadline before it elapses.
    ///
    /// Used when the owning computation is abandoned, e.g. a losing race
    /// branch. A no-op if the deadline already fired.
    pub(crate) fn cancel(&mut self, key: &TimerKey) -> bool {
        self.entries.remove(&(key.deadline, key.sequence)).is_some()
    }

    /// Wakes every elapsed deadline and bounds the next wait.
    ///
    /// Repeatedly pops the minimum entry while its deadline is due, waking
    /// its continuation. Returns the remaining duration until the next
    /// pending deadline, or `None` when no timers are pending (no bound:
    /// the reactor may wait indefinitely).
    pub(crate) fn tick(&mut self) -> Option<Duration> {
        loop {
            let (&(deadline, _), _) = self.entries.first_key_value()?;
            let now = Instant::now();

            if deadline > now {
                return Some(deadline - now);
            }

            let ((_, sequence), waker) = self.entries.pop_first().expect("minimum entry exists");
            log::trace!("timers: #{sequence} elapsed");
            waker.wake();
        }
    }
}
