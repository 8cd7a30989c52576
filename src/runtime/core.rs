//! The driver loop: alternates the timer sweep and the reactor wait until
//! the root computation completes.
//!
//! Per iteration the loop polls the root future, drains the ready queue,
//! sweeps expired timers (collecting the next-deadline bound), and only
//! then blocks in the reactor with that bound. When neither a timer nor an
//! armed descriptor nor a queued task remains while the root is still
//! pending, nothing can ever wake the runtime again; the loop panics
//! rather than blocking forever.

use crate::reactor::core::{Reactor, ReactorHandle};
use crate::runtime::context::enter_context;
use crate::runtime::executor::Executor;
use crate::runtime::queue::TaskQueue;
use crate::task::Task;
use crate::timer::queue::{TimerHandle, TimerQueue};

use std::future::Future;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use std::time::Duration;

/// Single-threaded async runtime: executor, epoll reactor, timer queue.
pub struct Runtime {
    queue: Arc<TaskQueue>,
    executor: Executor,
    reactor: ReactorHandle,
    timers: TimerHandle,
}

impl Runtime {
    /// Creates a runtime with the default reactor event capacity.
    ///
    /// # Panics
    /// Panics if the epoll instance cannot be created.
    pub fn new() -> Self {
        Self::with_event_capacity(64)
    }

    pub(crate) fn with_event_capacity(event_capacity: usize) -> Self {
        let queue = Arc::new(TaskQueue::new());
        let executor = Executor::new(queue.clone());
        let reactor = Reactor::new(event_capacity).expect("failed to create epoll instance");

        Self {
            queue,
            executor,
            reactor: Arc::new(Mutex::new(reactor)),
            timers: Arc::new(Mutex::new(TimerQueue::new())),
        }
    }

    /// Enqueues a background task before or between `block_on` calls.
    ///
    /// The task runs once `block_on` drains the ready queue.
    pub fn spawn<F: Future<Output = ()> + 'static>(&self, future: F) {
        let task = Task::new(future, self.queue.clone());
        self.queue.push(task);
    }

    /// Runs the root computation to completion and returns its output.
    ///
    /// Establishes the runtime context so the spawned computation tree can
    /// use `Task::spawn`, `sleep_for`, and `wait_for_readiness` without an
    /// explicit runtime reference. A failure of the root computation is its
    /// output value (`F::Output` is typically a `Result`); it propagates to
    /// the caller unchanged.
    ///
    /// # Panics
    /// Panics when the runtime is starved: the root future is pending but
    /// no timer, no armed descriptor, and no queued task remains to wake it.
    pub fn block_on<F: Future>(&mut self, future: F) -> F::Output {
        let queue = self.queue.clone();
        let reactor = self.reactor.clone();
        let timers = self.timers.clone();

        enter_context(queue, reactor, timers, || {
            let mut future = Box::pin(future);

            // Root waker: sets a notification flag instead of queueing,
            // the loop polls the root itself.
            let mut notified = false;
            fn clone(ptr: *const ()) -> std::task::RawWaker {
                std::task::RawWaker::new(ptr, &VTABLE)
            }
            fn wake(ptr: *const ()) {
                unsafe {
                    *(ptr as *mut bool) = true;
                }
            }
            fn wake_by_ref(ptr: *const ()) {
                unsafe {
                    *(ptr as *mut bool) = true;
                }
            }
            fn drop(_: *const ()) {}
            static VTABLE: std::task::RawWakerVTable =
                std::task::RawWakerVTable::new(clone, wake, wake_by_ref, drop);
            let raw = std::task::RawWaker::new(&mut notified as *mut bool as *const (), &VTABLE);
            let waker = unsafe { std::task::Waker::from_raw(raw) };
            let mut cx = Context::from_waker(&waker);

            loop {
                if let Poll::Ready(value) = future.as_mut().poll(&mut cx) {
                    // Give already-queued tasks their final chance to run.
                    self.executor.run();
                    return value;
                }

                self.executor.run();

                // Opportunistic I/O poll so a busy task tree cannot starve
                // readiness delivery.
                self.poll_reactor(Some(Duration::ZERO));

                // Sweep expired timers; the remainder bounds the wait below.
                let bound = self.timers.lock().unwrap().tick();

                if notified {
                    notified = false;
                    continue;
                }

                if !self.queue.is_empty() {
                    continue;
                }

                let armed = self.reactor.lock().unwrap().has_registrations();
                if bound.is_none() && !armed {
                    panic!(
                        "runtime starved: root future is pending but no timer, \
                         registration, or queued task remains to wake it"
                    );
                }

                // Block until a descriptor fires or the next deadline is
                // due. With no armed descriptors epoll_wait still serves
                // as the timer sleep. A pure timeout loops back into tick.
                let fired = self.poll_reactor(bound);
                if !fired {
                    log::trace!("runtime: woke on timeout");
                }
            }
        })
    }

    fn poll_reactor(&self, timeout: Option<Duration>) -> bool {
        self.reactor
            .lock()
            .unwrap()
            .poll(timeout)
            .expect("epoll_wait failed")
    }
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new()
    }
}
