//! Minimal single-threaded async runtime for Linux.
//!
//! One OS thread, non-blocking file descriptors, cooperative scheduling:
//! a computation owns the thread until it suspends on I/O readiness, a
//! deadline, or a combinator, or completes.
//!
//! # Architecture
//!
//! - **Runtime**: driver loop alternating the timer sweep and the epoll
//!   wait via `block_on`
//! - **Task**: wraps a future with its result slot and waiter linkage;
//!   dropping a `JoinHandle` cancels the task and releases its
//!   registrations
//! - **Reactor**: one-shot epoll registrations, at most one per descriptor,
//!   record-then-resume event batches
//! - **Timers**: deadline-ordered queue with deterministic insertion-order
//!   tie-breaking
//! - **Combinators**: `join_all` (all branches, results in launch order)
//!   and `race_first` (first branch wins, losers cancelled)

mod builder;
mod combinator;
mod reactor;
mod runtime;
mod syscall;
mod task;
mod timer;

pub use builder::RuntimeBuilder;
pub use combinator::join::{JoinAll, TryJoinAll, join_all, try_join_all};
pub use combinator::race::{RaceFirst, race_first};
pub use reactor::event::{Interest, Ready};
pub use reactor::future::{Readiness, wait_for_readiness};
pub use runtime::Runtime;
pub use runtime::yield_now::yield_now;
pub use syscall::{check_ret, check_ret_would_block, set_nonblocking, try_read};
pub use task::{JoinHandle, Task, launch};
pub use timer::sleep::{Sleep, sleep_for, sleep_until};
