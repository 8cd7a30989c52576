//! Event-driven I/O reactor module.
//!
//! Linux epoll backs the readiness multiplexer. It includes:
//! - [`core`]: the reactor itself (registration table, one-shot arming, poll)
//! - [`event`]: interest and readiness masks plus epoll syscall wrappers
//! - [`future`]: the readiness future suspending a computation on a descriptor

pub(crate) mod core;
pub mod event;
pub mod future;
