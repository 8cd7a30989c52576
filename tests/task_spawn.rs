use uniloop::{Runtime, Task, launch, sleep_for, yield_now};

use std::sync::atomic::{AtomicBool, AtomicI32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[test]
fn test_spawn_basic() {
    let mut rt = Runtime::new();
    let completed = Arc::new(AtomicBool::new(false));
    let completed_clone = completed.clone();

    rt.block_on(async move {
        Task::spawn(async move {
            completed_clone.store(true, Ordering::SeqCst);
        })
        .await;
    });

    assert!(
        completed.load(Ordering::SeqCst),
        "Spawned task should have completed"
    );
}

#[test]
fn test_spawn_returns_value_through_handle() {
    let mut rt = Runtime::new();

    let value = rt.block_on(async {
        let handle = Task::spawn(async { 21 * 2 });
        handle.await
    });

    assert_eq!(value, 42);
}

#[test]
fn test_spawn_multiple() {
    let mut rt = Runtime::new();
    let counter = Arc::new(AtomicI32::new(0));

    let c1 = counter.clone();
    let c2 = counter.clone();
    let c3 = counter.clone();

    rt.block_on(async move {
        let h1 = Task::spawn(async move {
            c1.fetch_add(1, Ordering::SeqCst);
        });
        let h2 = Task::spawn(async move {
            c2.fetch_add(10, Ordering::SeqCst);
        });
        let h3 = Task::spawn(async move {
            c3.fetch_add(100, Ordering::SeqCst);
        });

        h1.await;
        h2.await;
        h3.await;
    });

    assert_eq!(counter.load(Ordering::SeqCst), 111);
}

#[test]
fn test_spawn_nested() {
    let mut rt = Runtime::new();
    let values = Arc::new(Mutex::new(Vec::new()));

    let v1 = values.clone();
    let v2 = values.clone();

    rt.block_on(async move {
        Task::spawn(async move {
            v1.lock().unwrap().push(1);

            Task::spawn(async move {
                v2.lock().unwrap().push(2);
            })
            .await;
        })
        .await;
    });

    assert_eq!(*values.lock().unwrap(), vec![1, 2]);
}

#[test]
fn test_detached_task_still_runs() {
    let mut rt = Runtime::new();
    let completed = Arc::new(AtomicBool::new(false));
    let completed_clone = completed.clone();

    rt.block_on(async move {
        launch(async move {
            sleep_for(Duration::from_millis(10)).await;
            completed_clone.store(true, Ordering::SeqCst);
        });

        // The detached task keeps running; wait past its deadline.
        sleep_for(Duration::from_millis(30)).await;
    });

    assert!(completed.load(Ordering::SeqCst));
}

#[test]
fn test_dropping_handle_cancels_task() {
    let mut rt = Runtime::new();
    let resumed = Arc::new(AtomicBool::new(false));
    let resumed_clone = resumed.clone();

    rt.block_on(async move {
        let handle = Task::spawn(async move {
            sleep_for(Duration::from_millis(10)).await;
            resumed_clone.store(true, Ordering::SeqCst);
        });

        // Let the task suspend on its timer, then abandon it.
        yield_now().await;
        drop(handle);

        // Well past the cancelled deadline: the timer node is gone and the
        // task must never resume.
        sleep_for(Duration::from_millis(40)).await;
    });

    assert!(
        !resumed.load(Ordering::SeqCst),
        "Cancelled task must not resume"
    );
}

#[test]
#[should_panic(expected = "Task::spawn() called outside of a runtime context")]
fn test_spawn_panics_outside_runtime() {
    Task::spawn(async {
        println!("This should never run");
    });
}
