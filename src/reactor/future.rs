//! Readiness future for non-blocking file descriptors.
//!
//! [`wait_for_readiness`] suspends the calling computation until the
//! operating system reports the requested interest on a descriptor, then
//! resolves with the observed event mask. The registration is one-shot:
//! waiting again requires a fresh call.
//!
//! # Examples
//!
//! ```ignore
//! use uniloop::{Interest, try_read, wait_for_readiness};
//!
//! async fn read_some(fd: i32, buffer: &mut [u8]) -> std::io::Result<usize> {
//!     let ready = wait_for_readiness(fd, Interest::READABLE).await?;
//!     assert!(ready.is_readable() || ready.is_closed());
//!
//!     try_read(fd, buffer)
//! }
//! ```

use crate::reactor::core::ReactorHandle;
use crate::reactor::event::{Interest, Ready};
use crate::runtime::current_reactor;

use std::future::Future;
use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};

/// Future returned by [`wait_for_readiness`].
///
/// Registers with the reactor on first poll and resolves once the
/// descriptor fires. Dropping the future before it fires deregisters the
/// descriptor synchronously, so a late event can never resume freed state.
pub struct Readiness {
    file_descriptor: i32,
    interest: Interest,
    reactor: ReactorHandle,
    registered: bool,
}

/// Suspends until `file_descriptor` reports readiness for `interest`.
///
/// Resolves with the observed [`Ready`] mask. Fails if the descriptor is
/// already armed (one registration per descriptor) or if arming it fails
/// at the OS level.
///
/// # Panics
/// Panics if called outside of a runtime context: the reactor handle is
/// captured at construction, before the first poll.
pub fn wait_for_readiness(file_descriptor: i32, interest: Interest) -> Readiness {
    Readiness {
        file_descriptor,
        interest,
        reactor: current_reactor(),
        registered: false,
    }
}

impl Future for Readiness {
    type Output = io::Result<Ready>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.as_mut().get_mut();
        let mut reactor = this.reactor.lock().unwrap();

        if this.registered {
            return match reactor.take_ready(this.file_descriptor) {
                Some(ready) => {
                    this.registered = false;
                    Poll::Ready(Ok(ready))
                }
                // Spurious wake: the registration is still armed.
                None => Poll::Pending,
            };
        }

        match reactor.register(this.file_descriptor, this.interest, cx.waker().clone()) {
            Ok(()) => {
                this.registered = true;
                Poll::Pending
            }
            Err(error) => Poll::Ready(Err(error)),
        }
    }
}

impl Drop for Readiness {
    fn drop(&mut self) {
        if self.registered {
            self.reactor
                .lock()
                .unwrap()
                .deregister(self.file_descriptor);
        }
    }
}
