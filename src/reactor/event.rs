use crate::syscall::check_ret;

use libc::{
    EPOLL_CTL_ADD, EPOLL_CTL_DEL, EPOLL_CTL_MOD, EPOLLERR, EPOLLHUP, EPOLLIN, EPOLLONESHOT,
    EPOLLOUT, epoll_event,
};
use std::io;
use std::ptr;

/// Readiness interest requested when arming a file descriptor.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Interest(u32);

impl Interest {
    pub const READABLE: Interest = Interest(EPOLLIN as u32);
    pub const WRITABLE: Interest = Interest(EPOLLOUT as u32);

    /// Combines two interests into one mask.
    pub fn and(self, other: Interest) -> Interest {
        Interest(self.0 | other.0)
    }

    // Every registration is one-shot: the kernel disarms it after the first
    // delivery, re-arming is the waiting future's responsibility.
    pub(crate) fn to_epoll(self) -> u32 {
        self.0 | EPOLLONESHOT as u32
    }
}

/// Readiness mask observed when a registration fires.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Ready(u32);

impl Ready {
    pub(crate) fn from_epoll(events: u32) -> Self {
        Ready(events)
    }

    pub(crate) fn merge(&mut self, other: Ready) {
        self.0 |= other.0;
    }

    pub fn is_readable(&self) -> bool {
        self.0 & EPOLLIN as u32 != 0
    }

    pub fn is_writable(&self) -> bool {
        self.0 & EPOLLOUT as u32 != 0
    }

    /// True when the peer hung up or the descriptor is in an error state.
    pub fn is_closed(&self) -> bool {
        self.0 & (EPOLLHUP as u32 | EPOLLERR as u32) != 0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }
}

fn control(epoll: i32, op: i32, file_descriptor: i32, event: *mut epoll_event) -> io::Result<()> {
    check_ret(unsafe { libc::epoll_ctl(epoll, op, file_descriptor, event) } as i64)?;

    Ok(())
}

pub(crate) fn epoll_add(epoll: i32, file_descriptor: i32, interest: Interest) -> io::Result<()> {
    let mut event = epoll_event {
        events: interest.to_epoll(),
        u64: file_descriptor as u64,
    };

    control(epoll, EPOLL_CTL_ADD, file_descriptor, &mut event)
}

pub(crate) fn epoll_modify(epoll: i32, file_descriptor: i32, interest: Interest) -> io::Result<()> {
    let mut event = epoll_event {
        events: interest.to_epoll(),
        u64: file_descriptor as u64,
    };

    control(epoll, EPOLL_CTL_MOD, file_descriptor, &mut event)
}

pub(crate) fn epoll_delete(epoll: i32, file_descriptor: i32) -> io::Result<()> {
    control(epoll, EPOLL_CTL_DEL, file_descriptor, ptr::null_mut())
}

/// Blocks in `epoll_wait` for at most `timeout_ms` (`-1` blocks forever).
///
/// Returns the number of entries written into `events`. Interrupted waits
/// are retried so callers never observe `EINTR`.
pub(crate) fn epoll_wait(
    epoll: i32,
    events: &mut [epoll_event],
    timeout_ms: i32,
) -> io::Result<usize> {
    loop {
        let res =
            unsafe { libc::epoll_wait(epoll, events.as_mut_ptr(), events.len() as i32, timeout_ms) };

        match check_ret(res as i64) {
            Ok(count) => return Ok(count as usize),
            Err(error) if error.kind() == io::ErrorKind::Interrupted => continue,
            Err(error) => return Err(error),
        }
    }
}
