//! FIFO ready queue feeding the executor.
//!
//! Wakes never poll a task inline; they push it here and the executor
//! drains the queue, so completion chains stay iterative.

use crate::task::Runnable;

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// FIFO queue of tasks ready to be polled.
pub(crate) struct TaskQueue {
    queue: Mutex<VecDeque<Arc<dyn Runnable>>>,
}

impl TaskQueue {
    pub(crate) fn new() -> Self {
        Self {
            queue: Mutex::new(VecDeque::new()),
        }
    }

    /// Enqueues a task to be polled, in FIFO order.
    pub(crate) fn push(&self, task: Arc<dyn Runnable>) {
        self.queue.lock().unwrap().push_back(task);
    }

    /// Dequeues the next ready task, if any.
    pub(crate) fn pop(&self) -> Option<Arc<dyn Runnable>> {
        self.queue.lock().unwrap().pop_front()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.queue.lock().unwrap().is_empty()
    }
}
