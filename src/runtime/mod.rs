//! Runtime subsystem modules.

pub(crate) mod context;
mod core;
pub(crate) mod executor;
pub(crate) mod queue;
pub(crate) mod waker;
pub mod yield_now;

pub(crate) use context::{current_queue, current_reactor, current_timers};
pub use core::Runtime;
pub(crate) use queue::TaskQueue;
pub(crate) use waker::make_waker;
