//! Raw syscall result checking shared by the reactor and I/O helpers.
//!
//! Every OS call in this crate funnels through [`check_ret`] or
//! [`check_ret_would_block`], which translate the C convention (`-1` plus
//! `errno`) into `std::io::Result`.

use std::io;

use libc::{EAGAIN, EWOULDBLOCK, F_GETFL, F_SETFL, O_NONBLOCK, fcntl, read};

/// Checks a raw syscall return value, mapping `-1` to the current OS error.
///
/// # Arguments
/// * `res` - The value returned by the syscall
///
/// # Returns
/// The unchanged value on success, or the `errno`-derived error on failure.
pub fn check_ret(res: i64) -> io::Result<i64> {
    if res == -1 {
        return Err(io::Error::last_os_error());
    }

    Ok(res)
}

/// Checks a raw syscall return value, tolerating would-block.
///
/// Like [`check_ret`], but when the failure is specifically `EAGAIN` or
/// `EWOULDBLOCK` the caller-supplied `default` is returned instead of an
/// error. Would-block means "no data yet", not a failure.
pub fn check_ret_would_block(res: i64, default: i64) -> io::Result<i64> {
    match check_ret(res) {
        Ok(value) => Ok(value),
        Err(error) if would_block(&error) => Ok(default),
        Err(error) => Err(error),
    }
}

/// Returns true if the error is the OS would-block condition.
pub(crate) fn would_block(error: &io::Error) -> bool {
    matches!(error.raw_os_error(), Some(code) if code == EAGAIN || code == EWOULDBLOCK)
}

/// Best-effort read from a non-blocking file descriptor.
///
/// Returns the number of bytes read. Both end-of-stream and would-block
/// report `Ok(0)`; only genuine OS failures surface as errors. Callers that
/// need to distinguish "no data yet" from end-of-stream should wait for
/// readiness first.
pub fn try_read(file_descriptor: i32, buffer: &mut [u8]) -> io::Result<usize> {
    let res = unsafe {
        read(
            file_descriptor,
            buffer.as_mut_ptr() as *mut _,
            buffer.len(),
        )
    };

    check_ret_would_block(res as i64, 0).map(|n| n as usize)
}

/// Switches a file descriptor to non-blocking mode.
pub fn set_nonblocking(file_descriptor: i32) -> io::Result<()> {
    let flags = check_ret(unsafe { fcntl(file_descriptor, F_GETFL) } as i64)? as i32;

    check_ret(unsafe { fcntl(file_descriptor, F_SETFL, flags | O_NONBLOCK) } as i64)?;

    Ok(())
}
