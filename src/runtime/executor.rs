//! Drains the ready queue, polling each task once per wake.

use crate::runtime::queue::TaskQueue;

use std::sync::Arc;

pub(crate) struct Executor {
    queue: Arc<TaskQueue>,
}

impl Executor {
    pub(crate) fn new(queue: Arc<TaskQueue>) -> Self {
        Self { queue }
    }

    /// Polls queued tasks until the queue is empty.
    ///
    /// Tasks re-queued by their own waker during the drain (yield_now,
    /// completions waking waiters) are processed in the same call.
    pub(crate) fn run(&self) {
        while let Some(task) = self.queue.pop() {
            task.poll();
        }
    }
}
