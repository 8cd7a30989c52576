//! Thread-local runtime context.
//!
//! Every `block_on` installs the runtime's task queue, reactor handle, and
//! timer handle in thread-local storage so that `Task::spawn`,
//! `wait_for_readiness`, and `sleep_for` work without threading an explicit
//! runtime reference through user code. The previous context is restored on
//! exit, which keeps nested `block_on` calls well behaved.

use crate::reactor::core::ReactorHandle;
use crate::runtime::queue::TaskQueue;
use crate::timer::queue::TimerHandle;

use std::cell::RefCell;
use std::sync::Arc;

thread_local! {
    static CURRENT_QUEUE: RefCell<Option<Arc<TaskQueue>>> = const { RefCell::new(None) };
    static CURRENT_REACTOR: RefCell<Option<ReactorHandle>> = const { RefCell::new(None) };
    static CURRENT_TIMERS: RefCell<Option<TimerHandle>> = const { RefCell::new(None) };
}

/// Enters a runtime context for the duration of `function`.
pub(crate) fn enter_context<F, R>(
    queue: Arc<TaskQueue>,
    reactor: ReactorHandle,
    timers: TimerHandle,
    function: F,
) -> R
where
    F: FnOnce() -> R,
{
    CURRENT_QUEUE.with(|current_queue| {
        CURRENT_REACTOR.with(|current_reactor| {
            CURRENT_TIMERS.with(|current_timers| {
                let previous_queue = current_queue.borrow_mut().replace(queue);
                let previous_reactor = current_reactor.borrow_mut().replace(reactor);
                let previous_timers = current_timers.borrow_mut().replace(timers);

                let result = function();

                *current_queue.borrow_mut() = previous_queue;
                *current_reactor.borrow_mut() = previous_reactor;
                *current_timers.borrow_mut() = previous_timers;

                result
            })
        })
    })
}

/// Returns the current ready queue, or `None` outside a runtime context.
pub(crate) fn current_queue() -> Option<Arc<TaskQueue>> {
    CURRENT_QUEUE.with(|current| current.borrow().clone())
}

/// Returns the current reactor handle.
///
/// # Panics
/// Panics outside of a runtime context: readiness waits only make sense
/// within `Runtime::block_on`.
pub(crate) fn current_reactor() -> ReactorHandle {
    CURRENT_REACTOR.with(|current| {
        current
            .borrow()
            .clone()
            .expect("no reactor in current context: readiness waits must run under Runtime::block_on")
    })
}

/// Returns the current timer handle.
///
/// # Panics
/// Panics outside of a runtime context.
pub(crate) fn current_timers() -> TimerHandle {
    CURRENT_TIMERS.with(|current| {
        current
            .borrow()
            .clone()
            .expect("no timers in current context: sleeps must run under Runtime::block_on")
    })
}
