use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use waitpool::prelude::*;
use waitpool::runtime::init_thread_local;

#[test]
fn test_handle_returns_immediately_for_all_priorities() {
    init_thread_local().unwrap();

    let start = Instant::now();
    let tasks: Vec<_> = [
        Priority::High,
        Priority::Default,
        Priority::Low,
        Priority::Background,
    ]
    .into_iter()
    .map(|priority| {
        spawn_with_priority(priority, || {
            thread::sleep(Duration::from_millis(300));
            0u32
        })
    })
    .collect();

    // All four handles came back while the closures are still sleeping
    assert!(start.elapsed() < Duration::from_millis(150));
    assert_eq!(tasks.len(), 4);

    for task in &tasks {
        assert_eq!(task.wait(), 0);
    }

    waitpool::shutdown();
}

#[test]
fn test_wait_returns_exact_value() {
    init_thread_local().unwrap();

    let task = waitpool::spawn(|| 101 * 4);
    assert_eq!(task.wait(), 404);

    waitpool::shutdown();
}

#[test]
fn test_timeout_expires_before_completion() {
    init_thread_local().unwrap();

    let task = waitpool::spawn(|| {
        thread::sleep(Duration::from_millis(500));
        String::from("done")
    });

    let start = Instant::now();
    let result = task.wait_timeout(Duration::from_millis(50));
    let waited = start.elapsed();

    assert_eq!(result, None);
    // gave up in roughly the timeout, not the job duration
    assert!(waited >= Duration::from_millis(50));
    assert!(waited < Duration::from_millis(400));

    waitpool::shutdown();
}

#[test]
fn test_rewait_after_timeout_observes_result() {
    init_thread_local().unwrap();

    let task = waitpool::spawn(|| {
        thread::sleep(Duration::from_millis(300));
        String::from("done")
    });

    assert_eq!(task.wait_timeout(Duration::from_millis(30)), None);

    // the work kept running; an unbounded wait picks the result up
    assert_eq!(task.wait(), "done");

    // and so does a second timed wait on the finished task
    assert_eq!(
        task.wait_timeout(Duration::from_millis(10)),
        Some(String::from("done"))
    );

    waitpool::shutdown();
}

#[test]
fn test_compound_payload_round_trip() {
    init_thread_local().unwrap();

    let task = waitpool::spawn(|| (5, String::from("five")));
    assert_eq!(task.wait(), (5, String::from("five")));

    waitpool::shutdown();
}

#[test]
fn test_no_cross_task_leakage() {
    init_thread_local().unwrap();

    let tasks: Vec<_> = (0..64usize)
        .map(|i| waitpool::spawn(move || i * 3))
        .collect();

    // completion order is unspecified; each handle still holds its own value
    for (i, task) in tasks.iter().enumerate().rev() {
        assert_eq!(task.wait(), i * 3);
    }

    waitpool::shutdown();
}

#[test]
fn test_concurrent_waiters_on_one_task() {
    init_thread_local().unwrap();

    let task = Arc::new(waitpool::spawn(|| {
        thread::sleep(Duration::from_millis(100));
        7u64
    }));

    let hits = Arc::new(AtomicUsize::new(0));

    let mut handles = Vec::new();
    for _ in 0..8 {
        let task = Arc::clone(&task);
        let hits = Arc::clone(&hits);
        handles.push(thread::spawn(move || {
            assert_eq!(task.wait(), 7);
            hits.fetch_add(1, Ordering::SeqCst);
        }));
    }

    for handle in handles {
        handle.join().unwrap();
    }
    assert_eq!(hits.load(Ordering::SeqCst), 8);

    waitpool::shutdown();
}

#[test]
fn test_wait_on_already_finished_task() {
    init_thread_local().unwrap();

    let task = waitpool::spawn(|| 11);
    task.wait();
    assert!(task.is_finished());

    // both wait flavors are instant on a finished task
    let start = Instant::now();
    assert_eq!(task.wait(), 11);
    assert_eq!(task.wait_timeout(Duration::from_secs(5)), Some(11));
    assert!(start.elapsed() < Duration::from_millis(100));

    waitpool::shutdown();
}

#[test]
fn test_priority_accessors() {
    init_thread_local().unwrap();

    let task = spawn_with_priority(Priority::Background, || ());
    assert_eq!(task.priority(), Priority::Background);

    let default_task = waitpool::spawn(|| ());
    assert_eq!(default_task.priority(), Priority::Default);
    assert_ne!(task.id(), default_task.id());

    task.wait();
    default_task.wait();

    waitpool::shutdown();
}

#[test]
fn test_panicking_closure_leaves_pool_alive() {
    let config = Config::builder()
        .num_threads(2)
        .panic_strategy(PanicStrategy::Isolate)
        .build()
        .unwrap();
    waitpool::runtime::init_thread_local_with_config(config).unwrap();

    let doomed: Task<u32> = waitpool::spawn(|| panic!("boom"));

    // no result is ever published for the panicked job
    assert_eq!(doomed.wait_timeout(Duration::from_millis(200)), None);
    assert!(!doomed.is_finished());

    // the pool still runs later jobs
    let task = waitpool::spawn(|| 5);
    assert_eq!(task.wait(), 5);

    waitpool::shutdown();
}
