//! Sleep futures backed by the deadline-ordered timer queue.
//!
//! [`sleep_for`] converts a relative duration to an absolute deadline at
//! construction time; [`sleep_until`] takes the deadline directly. The
//! sleeping computation is suspended until the runtime's timer sweep wakes
//! it, never busy-polled.

use crate::runtime::current_timers;
use crate::timer::queue::{TimerHandle, TimerKey};

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::{Duration, Instant};

/// A future that completes once its deadline has passed.
///
/// Dropping a pending sleep cancels its timer node synchronously, so an
/// abandoned sleeper (a losing race branch, a cancelled task) leaves no
/// dangling entry behind.
pub struct Sleep {
    deadline: Instant,
    timers: TimerHandle,
    key: Option<TimerKey>,
}

/// Suspends the calling computation for `duration`.
///
/// A zero duration completes on first poll without registering a timer.
///
/// # Panics
/// Panics if called outside of a runtime context: the timer handle is
/// captured at construction, before the first poll.
pub fn sleep_for(duration: Duration) -> Sleep {
    sleep_until(Instant::now() + duration)
}

/// Suspends the calling computation until `deadline`.
///
/// A deadline already in the past completes on first poll without
/// registering a timer.
///
/// # Panics
/// Panics if called outside of a runtime context: the timer handle is
/// captured at construction, before the first poll.
pub fn sleep_until(deadline: Instant) -> Sleep {
    Sleep {
        deadline,
        timers: current_timers(),
        key: None,
    }
}

impl Future for Sleep {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        if Instant::now() >= self.deadline {
            // Normally the sweep already removed the node; cancel covers
            // the case of a wake from elsewhere before the deadline fired.
            if let Some(key) = self.key.take() {
                self.timers.lock().unwrap().cancel(&key);
            }

            return Poll::Ready(());
        }

        if self.key.is_none() {
            let key = self
                .timers
                .lock()
                .unwrap()
                .schedule(self.deadline, cx.waker().clone());
            self.key = Some(key);
        }

        Poll::Pending
    }
}

impl Drop for Sleep {
    fn drop(&mut self) {
        if let Some(key) = self.key.take() {
            self.timers.lock().unwrap().cancel(&key);
        }
    }
}
