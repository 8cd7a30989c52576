//! The suspendable-computation core: tasks, join handles, cancellation.
//!
//! A task owns exactly one suspended-or-running computation together with
//! its result slot and the wakers of whoever awaits it. Spawning creates
//! the task in a suspended state; the executor performs the first poll.
//!
//! # Spawning
//!
//! Tasks are spawned with [`Task::spawn`] from within an async context:
//!
//! ```ignore
//! use uniloop::Task;
//!
//! async fn spawn_example() {
//!     let handle = Task::spawn(async { 42 });
//!     let value = handle.await;
//!     assert_eq!(value, 42);
//! }
//! ```
//!
//! # Cancellation
//!
//! Dropping a [`JoinHandle`] before completion tears the computation down:
//! its future is dropped synchronously, which releases any reactor
//! registration or timer node it holds. Call [`JoinHandle::detach`] (or
//! [`launch`]) for fire-and-forget tasks that should keep running.
//!
//! # How completion resumes the waiter
//!
//! 1. A future is wrapped in a [`Task`] and enqueued
//! 2. The executor polls it with a waker that re-enqueues on wake
//! 3. On `Poll::Ready` the value lands in the result slot and every
//!    waiter waker fires
//! 4. Waiters re-queue rather than being polled inline, so arbitrarily
//!    long completion chains never grow the call stack

use crate::runtime::{TaskQueue, current_queue, make_waker};

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll, Waker};

/// Control block of one spawned computation.
///
/// # Internals
///
/// - `future`: the suspended computation, `None` once completed or cancelled
/// - `result`: the produced value, taken exactly once by the join handle
/// - `queue`: the ready queue used to re-schedule on wake
/// - `completed`: set when the result lands
/// - `waiters`: wakers of computations awaiting this one
pub struct Task<T> {
    future: Mutex<Option<Pin<Box<dyn Future<Output = T>>>>>,
    result: Mutex<Option<T>>,
    pub(crate) queue: Arc<TaskQueue>,
    completed: AtomicBool,
    waiters: Mutex<Vec<Waker>>,
}

// The runtime is single-threaded; the Mutex fields exist to satisfy the
// Waker contract, not for cross-thread sharing. The future itself never
// leaves the runtime thread.
unsafe impl<T> Send for Task<T> {}
unsafe impl<T> Sync for Task<T> {}

impl<T: 'static> Task<T> {
    pub(crate) fn new<F>(future: F, queue: Arc<TaskQueue>) -> Arc<Self>
    where
        F: Future<Output = T> + 'static,
    {
        Arc::new(Task {
            future: Mutex::new(Some(Box::pin(future))),
            result: Mutex::new(None),
            queue,
            completed: AtomicBool::new(false),
            waiters: Mutex::new(Vec::new()),
        })
    }

    /// Polls the task's future once.
    ///
    /// A pending future is stored back for later polling. A ready future
    /// fills the result slot, marks the task completed, and wakes every
    /// waiter. Cancelled or already-completed tasks have an empty future
    /// slot and are a no-op, which is what makes stray wakes harmless:
    /// a continuation resumes at most once.
    pub fn poll(self: &Arc<Self>) {
        let waker = make_waker(self.clone(), self.queue.clone());
        let mut context = Context::from_waker(&waker);

        let mut future_slot = self.future.lock().unwrap();

        if let Some(mut future) = future_slot.take() {
            match future.as_mut().poll(&mut context) {
                Poll::Pending => {
                    *future_slot = Some(future);
                }
                Poll::Ready(value) => {
                    *self.result.lock().unwrap() = Some(value);
                    self.completed.store(true, Ordering::Release);

                    let mut waiters = self.waiters.lock().unwrap();
                    for waiter in waiters.drain(..) {
                        waiter.wake();
                    }
                }
            }
        }
    }

    /// Spawns a task on the current runtime and returns its [`JoinHandle`].
    ///
    /// The task starts suspended and is first polled by the executor, never
    /// inline. Await the handle to retrieve the result, detach it to let
    /// the task run unsupervised, or drop it to cancel the task.
    ///
    /// # Panics
    /// Panics if called outside of a runtime context (i.e. not within an
    /// async block running under [`Runtime::block_on`]).
    ///
    /// [`Runtime::block_on`]: crate::runtime::Runtime::block_on
    pub fn spawn<F>(future: F) -> JoinHandle<T>
    where
        F: Future<Output = T> + 'static,
    {
        let queue = current_queue().expect("Task::spawn() called outside of a runtime context");

        let task: Arc<Task<T>> = Task::new(future, queue.clone());
        let runnable: Arc<dyn Runnable> = task.clone();

        queue.push(runnable);

        JoinHandle {
            task,
            detached: false,
        }
    }
}

impl<T> Task<T> {
    /// Tears down a still-pending computation.
    ///
    /// Dropping the future releases whatever it holds: readiness futures
    /// deregister their descriptor, sleeps cancel their timer node, nested
    /// handles cancel their own tasks. If the task already completed this
    /// does nothing. A queued-but-cancelled task is skipped by the
    /// executor (empty future slot).
    fn cancel(&self) {
        let future = self.future.lock().unwrap().take();
        drop(future);
    }

    fn is_completed(&self) -> bool {
        self.completed.load(Ordering::Acquire)
    }
}

/// Trait object interface the executor uses to poll heterogeneous tasks.
pub(crate) trait Runnable: Send + Sync {
    fn poll(self: Arc<Self>);
}

impl<T: 'static> Runnable for Task<T> {
    fn poll(self: Arc<Self>) {
        Task::poll(&self);
    }
}

/// Owner of one spawned computation.
///
/// Awaiting the handle yields the task's result. The handle is consumed by
/// the await, so a result is retrievable exactly once by construction.
/// Dropping the handle before completion cancels the task and releases any
/// reactor or timer state it holds.
pub struct JoinHandle<T> {
    task: Arc<Task<T>>,
    detached: bool,
}

impl<T> JoinHandle<T> {
    /// Lets the task keep running with no owner watching it.
    pub fn detach(mut self) {
        self.detached = true;
    }
}

impl<T> Future for JoinHandle<T> {
    type Output = T;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        if self.task.is_completed() {
            let result = self
                .task
                .result
                .lock()
                .unwrap()
                .take()
                .expect("task result already taken");

            return Poll::Ready(result);
        }

        let mut waiters = self.task.waiters.lock().unwrap();
        waiters.push(cx.waker().clone());

        Poll::Pending
    }
}

impl<T> Drop for JoinHandle<T> {
    fn drop(&mut self) {
        if !self.detached && !self.task.is_completed() {
            self.task.cancel();
        }
    }
}

/// Fire-and-forget launch of a computation on the current runtime.
///
/// Equivalent to `Task::spawn(future).detach()`.
///
/// # Panics
/// Panics if called outside of a runtime context.
pub fn launch<F>(future: F)
where
    F: Future<Output = ()> + 'static,
{
    Task::spawn(future).detach();
}
