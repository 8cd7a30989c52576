//! Waker implementation for task wake-up notifications.
//!
//! Implements the standard Rust task waking protocol with RawWaker and
//! RawWakerVTable. Waking re-enqueues the task on the ready queue; it
//! never polls inline, which is what keeps resumption chains iterative.

use crate::runtime::queue::TaskQueue;
use crate::task::Runnable;

use std::sync::Arc;
use std::task::{RawWaker, RawWakerVTable, Waker};

/// Re-queues its task when awakened.
struct TaskWaker {
    task: Arc<dyn Runnable>,
    queue: Arc<TaskQueue>,
}

impl TaskWaker {
    fn wake(self: &Arc<Self>) {
        self.queue.push(self.task.clone());
    }

    fn clone_raw(ptr: *const ()) -> RawWaker {
        unsafe {
            let arc = Arc::<TaskWaker>::from_raw(ptr as *const TaskWaker);
            let cloned = arc.clone();
            std::mem::forget(arc);
            RawWaker::new(Arc::into_raw(cloned) as *const (), &Self::VTABLE)
        }
    }

    fn wake_raw(ptr: *const ()) {
        unsafe {
            let arc = Arc::<TaskWaker>::from_raw(ptr as *const TaskWaker);
            arc.wake();
        }
    }

    fn wake_by_ref_raw(ptr: *const ()) {
        unsafe {
            let arc = Arc::<TaskWaker>::from_raw(ptr as *const TaskWaker);
            arc.wake();
            let _ = Arc::into_raw(arc);
        }
    }

    fn drop_raw(ptr: *const ()) {
        unsafe {
            Arc::<TaskWaker>::from_raw(ptr as *const TaskWaker);
        }
    }

    const VTABLE: RawWakerVTable = RawWakerVTable::new(
        Self::clone_raw,
        Self::wake_raw,
        Self::wake_by_ref_raw,
        Self::drop_raw,
    );
}

/// Creates a Waker that re-queues `task` on `queue` when called.
pub(crate) fn make_waker(task: Arc<dyn Runnable>, queue: Arc<TaskQueue>) -> Waker {
    let waker = Arc::new(TaskWaker { task, queue });
    let raw = RawWaker::new(Arc::into_raw(waker) as *const (), &TaskWaker::VTABLE);
    unsafe { Waker::from_raw(raw) }
}
