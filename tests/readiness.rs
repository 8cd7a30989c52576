use uniloop::{
    Interest, Runtime, Task, launch, set_nonblocking, sleep_for, try_read, wait_for_readiness,
    yield_now,
};

use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

fn pipe() -> (i32, i32) {
    let mut fds = [0i32; 2];
    let res = unsafe { libc::pipe(fds.as_mut_ptr()) };
    assert_eq!(res, 0, "pipe() failed");
    (fds[0], fds[1])
}

fn close(fd: i32) {
    unsafe {
        libc::close(fd);
    }
}

#[test]
fn test_readiness_wakes_on_write() {
    let _ = env_logger::builder().is_test(true).try_init();

    let mut rt = Runtime::new();
    let ok = Arc::new(AtomicBool::new(false));
    let ok2 = ok.clone();

    rt.block_on(async move {
        let (read_end, write_end) = pipe();
        set_nonblocking(read_end).unwrap();

        let handle = Task::spawn(async move {
            let ready = wait_for_readiness(read_end, Interest::READABLE)
                .await
                .unwrap();
            assert!(ready.is_readable());

            let mut buffer = [0u8; 4];
            assert_eq!(try_read(read_end, &mut buffer).unwrap(), 1);
            assert_eq!(buffer[0], 7);

            ok2.store(true, Ordering::SeqCst);
        });

        // Write after the waiter has registered.
        launch(async move {
            sleep_for(Duration::from_millis(10)).await;
            let byte = [7u8];
            let wrote = unsafe { libc::write(write_end, byte.as_ptr() as *const _, 1) };
            assert_eq!(wrote, 1);
        });

        handle.await;

        close(read_end);
        close(write_end);
    });

    assert!(ok.load(Ordering::SeqCst));
}

#[test]
fn test_writable_pipe_is_immediately_ready() {
    let mut rt = Runtime::new();

    rt.block_on(async {
        let (read_end, write_end) = pipe();

        let ready = wait_for_readiness(write_end, Interest::WRITABLE)
            .await
            .unwrap();
        assert!(ready.is_writable());

        close(read_end);
        close(write_end);
    });
}

#[test]
fn test_try_read_returns_zero_when_no_data() {
    let (read_end, write_end) = pipe();
    set_nonblocking(read_end).unwrap();

    // Nothing written: would-block surfaces as the zero default.
    let mut buffer = [0u8; 8];
    assert_eq!(try_read(read_end, &mut buffer).unwrap(), 0);

    close(read_end);
    close(write_end);
}

#[test]
fn test_second_registration_on_same_fd_fails() {
    let mut rt = Runtime::new();

    rt.block_on(async {
        let (read_end, write_end) = pipe();

        let waiting = Task::spawn(async move {
            // Never completes: nothing is ever written.
            wait_for_readiness(read_end, Interest::READABLE).await
        });

        // Let the first waiter arm the descriptor.
        yield_now().await;

        let error = wait_for_readiness(read_end, Interest::READABLE)
            .await
            .unwrap_err();
        assert_eq!(error.kind(), io::ErrorKind::AlreadyExists);

        // Abandoning the waiter deregisters the descriptor...
        drop(waiting);

        // ...so a fresh registration is accepted again.
        launch(async move {
            sleep_for(Duration::from_millis(5)).await;
            let byte = [1u8];
            unsafe { libc::write(write_end, byte.as_ptr() as *const _, 1) };
        });

        let ready = wait_for_readiness(read_end, Interest::READABLE)
            .await
            .unwrap();
        assert!(ready.is_readable());

        close(read_end);
        close(write_end);
    });
}

#[test]
fn test_combined_interest_reports_observed_mask() {
    let mut rt = Runtime::new();

    rt.block_on(async {
        let (read_end, write_end) = pipe();

        // A fresh pipe's write end is writable but not readable.
        let ready = wait_for_readiness(write_end, Interest::WRITABLE.and(Interest::READABLE))
            .await
            .unwrap();
        assert!(ready.is_writable());
        assert!(!ready.is_readable());
        assert!(!ready.is_empty());

        close(read_end);
        close(write_end);
    });
}
