//! The readiness multiplexer: one epoll instance plus a registration table.
//!
//! Registrations are strictly one file descriptor to one waiting computation.
//! Arming uses `EPOLLONESHOT`, so the kernel disarms a descriptor after its
//! first delivery and the owning future must re-register before waiting
//! again. Each `poll` batch records every observed event mask before waking
//! any continuation, so a woken task re-arming a descriptor cannot corrupt
//! the batch being iterated.

use crate::reactor::event::{self, Interest, Ready};
use crate::syscall::check_ret;

use libc::epoll_event;
use std::collections::HashMap;
use std::io;
use std::sync::{Arc, Mutex};
use std::task::Waker;
use std::time::Duration;

/// Shared handle to the runtime's reactor, cloned into readiness futures.
pub(crate) type ReactorHandle = Arc<Mutex<Reactor>>;

/// Lifecycle of a single registration.
///
/// `Armed` means the kernel may still deliver an event. `Fired` means the
/// event mask has been recorded and the kernel side is already disarmed;
/// the entry lingers until the owning future collects the mask or is
/// dropped. Cancellation removes the entry outright.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum RegistrationState {
    Armed,
    Fired,
}

struct Registration {
    waker: Waker,
    ready: Ready,
    state: RegistrationState,
}

pub(crate) struct Reactor {
    epoll: i32,
    events: Vec<epoll_event>,
    registrations: HashMap<i32, Registration>,
}

impl Reactor {
    pub(crate) fn new(event_capacity: usize) -> io::Result<Self> {
        let epoll = check_ret(unsafe { libc::epoll_create1(libc::EPOLL_CLOEXEC) } as i64)? as i32;

        Ok(Self {
            epoll,
            events: vec![epoll_event { events: 0, u64: 0 }; event_capacity.max(1)],
            registrations: HashMap::new(),
        })
    }

    /// Arms `file_descriptor` for `interest` and associates it with `waker`.
    ///
    /// At most one live registration may exist per descriptor, and a fired
    /// registration stays live (and owned by its waiter) until the waiter
    /// collects the mask or is dropped. Arming a descriptor with any live
    /// registration fails with [`io::ErrorKind::AlreadyExists`].
    pub(crate) fn register(
        &mut self,
        file_descriptor: i32,
        interest: Interest,
        waker: Waker,
    ) -> io::Result<()> {
        // A fired entry still belongs to the waiter that armed it; letting a
        // second waiter overwrite it would discard the recorded mask.
        if self.registrations.contains_key(&file_descriptor) {
            return Err(io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!("file descriptor {file_descriptor} already has a live registration"),
            ));
        }

        if let Err(error) = event::epoll_add(self.epoll, file_descriptor, interest) {
            // The kernel remembers descriptors whose one-shot fired after we
            // dropped the table entry; fall back to MOD.
            if error.raw_os_error() == Some(libc::EEXIST) {
                event::epoll_modify(self.epoll, file_descriptor, interest)?;
            } else {
                return Err(error);
            }
        }

        log::trace!("reactor: armed fd {file_descriptor}");

        self.registrations.insert(
            file_descriptor,
            Registration {
                waker,
                ready: Ready::default(),
                state: RegistrationState::Armed,
            },
        );

        Ok(())
    }

    /// Removes a registration, disarming the kernel side.
    ///
    /// Safe to call during teardown even if the registration already fired
    /// or the descriptor was never armed: unknown descriptors are a no-op
    /// and a missing kernel entry is ignored.
    pub(crate) fn deregister(&mut self, file_descriptor: i32) {
        if self.registrations.remove(&file_descriptor).is_none() {
            return;
        }

        log::trace!("reactor: deregistered fd {file_descriptor}");

        if let Err(error) = event::epoll_delete(self.epoll, file_descriptor) {
            // ENOENT: a fired one-shot the kernel already forgot about.
            if error.raw_os_error() != Some(libc::ENOENT) {
                log::debug!("reactor: EPOLL_CTL_DEL on fd {file_descriptor} failed: {error}");
            }
        }
    }

    /// Collects the recorded event mask for a fired registration.
    ///
    /// Returns `None` while the registration is still armed (spurious wake)
    /// or unknown. Collecting consumes the table entry; the descriptor must
    /// be re-registered before the next wait.
    pub(crate) fn take_ready(&mut self, file_descriptor: i32) -> Option<Ready> {
        match self.registrations.get(&file_descriptor) {
            Some(registration) if registration.state == RegistrationState::Fired => {
                let registration = self.registrations.remove(&file_descriptor)?;
                Some(registration.ready)
            }
            _ => None,
        }
    }

    /// True while any descriptor is armed and could still produce an event.
    pub(crate) fn has_registrations(&self) -> bool {
        self.registrations
            .values()
            .any(|registration| registration.state == RegistrationState::Armed)
    }

    /// Blocks until a registered descriptor becomes ready or `timeout`
    /// elapses; `None` blocks indefinitely.
    ///
    /// Runs in two passes over the batch: first every fired descriptor has
    /// its observed mask recorded and its registration marked fired, then
    /// every fired continuation is woken. Returns `false` on pure timeout.
    pub(crate) fn poll(&mut self, timeout: Option<Duration>) -> io::Result<bool> {
        let timeout_ms = match timeout {
            // Round up so a sub-millisecond remainder cannot spin.
            Some(duration) => duration
                .as_nanos()
                .div_ceil(1_000_000)
                .min(i32::MAX as u128) as i32,
            None => -1,
        };

        let count = event::epoll_wait(self.epoll, &mut self.events, timeout_ms)?;
        if count == 0 {
            return Ok(false);
        }

        // Record pass: store the masks before waking anything.
        let mut fired = Vec::with_capacity(count);
        for event in &self.events[..count] {
            let file_descriptor = event.u64 as i32;

            if let Some(registration) = self.registrations.get_mut(&file_descriptor) {
                registration.ready.merge(Ready::from_epoll(event.events));
                registration.state = RegistrationState::Fired;
                fired.push(registration.waker.clone());
            }
        }

        log::trace!("reactor: {} descriptor(s) fired", fired.len());

        // Resume pass: wakers only push onto the ready queue, so re-arms
        // from resumed tasks cannot touch the batch iterated above.
        for waker in fired {
            waker.wake();
        }

        Ok(true)
    }
}

impl Drop for Reactor {
    fn drop(&mut self) {
        unsafe { libc::close(self.epoll) };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pipe() -> (i32, i32) {
        let mut fds = [0i32; 2];
        assert_eq!(unsafe { libc::pipe(fds.as_mut_ptr()) }, 0);
        (fds[0], fds[1])
    }

    #[test]
    fn register_twice_fails_deterministically() {
        let mut reactor = Reactor::new(8).unwrap();
        let (read_end, write_end) = pipe();

        reactor
            .register(read_end, Interest::READABLE, Waker::noop().clone())
            .unwrap();
        let err = reactor
            .register(read_end, Interest::READABLE, Waker::noop().clone())
            .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::AlreadyExists);

        unsafe {
            libc::close(read_end);
            libc::close(write_end);
        }
    }

    #[test]
    fn deregister_is_idempotent() {
        let mut reactor = Reactor::new(8).unwrap();
        let (read_end, write_end) = pipe();

        reactor
            .register(read_end, Interest::READABLE, Waker::noop().clone())
            .unwrap();
        reactor.deregister(read_end);
        reactor.deregister(read_end);
        // Never-armed descriptors are fine too.
        reactor.deregister(write_end);

        assert!(!reactor.has_registrations());

        unsafe {
            libc::close(read_end);
            libc::close(write_end);
        }
    }

    #[test]
    fn fired_registration_stays_owned_until_collected() {
        let mut reactor = Reactor::new(8).unwrap();
        let (read_end, write_end) = pipe();

        reactor
            .register(read_end, Interest::READABLE, Waker::noop().clone())
            .unwrap();

        let byte = [1u8];
        assert_eq!(
            unsafe { libc::write(write_end, byte.as_ptr() as *const _, 1) },
            1
        );
        assert!(reactor.poll(Some(Duration::from_millis(100))).unwrap());

        // The entry fired but nobody collected it yet: a second waiter must
        // not be able to take the descriptor over.
        let err = reactor
            .register(read_end, Interest::READABLE, Waker::noop().clone())
            .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::AlreadyExists);

        // The recorded mask still reaches its owner.
        let ready = reactor.take_ready(read_end).expect("mask recorded");
        assert!(ready.is_readable());

        unsafe {
            libc::close(read_end);
            libc::close(write_end);
        }
    }

    #[test]
    fn poll_records_before_resuming_and_reports_timeouts() {
        let mut reactor = Reactor::new(8).unwrap();
        let (read_end, write_end) = pipe();

        reactor
            .register(read_end, Interest::READABLE, Waker::noop().clone())
            .unwrap();

        // Nothing written yet: pure timeout.
        assert!(!reactor.poll(Some(Duration::from_millis(5))).unwrap());
        assert!(reactor.take_ready(read_end).is_none());

        let byte = [1u8];
        assert_eq!(
            unsafe { libc::write(write_end, byte.as_ptr() as *const _, 1) },
            1
        );

        assert!(reactor.poll(Some(Duration::from_millis(100))).unwrap());
        let ready = reactor.take_ready(read_end).expect("mask recorded");
        assert!(ready.is_readable());

        // Collected: the descriptor can be armed again.
        reactor
            .register(read_end, Interest::READABLE, Waker::noop().clone())
            .unwrap();

        unsafe {
            libc::close(read_end);
            libc::close(write_end);
        }
    }
}
