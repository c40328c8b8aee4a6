//! Gates running on the default tokio scheduler.

#![cfg(feature = "async")]

use callgate::{ConfigError, Debounced, RateControl, Throttled, TokioScheduler};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::{sleep, Instant};

fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}

type Log<A> = Arc<Mutex<Vec<(Duration, A)>>>;

fn recording<A: Send + 'static>(start: Instant) -> (Log<A>, impl FnMut(A) + Send + 'static) {
    let log: Log<A> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&log);
    (log, move |args| {
        sink.lock().unwrap().push((start.elapsed(), args));
    })
}

#[test]
fn test_no_runtime_and_no_scheduler_is_an_error() {
    let result = Debounced::builder(ms(100)).build(|_: u32| ());
    assert!(matches!(result, Err(ConfigError::NoScheduler)));

    let result = Throttled::builder(ms(100)).build(|_: u32| ());
    assert!(matches!(result, Err(ConfigError::NoScheduler)));
}

#[tokio::test(start_paused = true)]
async fn test_debounce_on_current_runtime() {
    let start = Instant::now();
    let (log, sink) = recording(start);
    let gate = Debounced::builder(ms(100)).build(sink).unwrap();

    gate.call("a");
    sleep(ms(50)).await;
    gate.call("b");
    sleep(ms(30)).await;
    gate.call("c");

    sleep(ms(90)).await;
    assert!(log.lock().unwrap().is_empty());
    assert!(gate.pending());

    sleep(ms(50)).await;
    let calls = log.lock().unwrap().clone();
    assert_eq!(calls.len(), 1);
    let (at, args) = calls[0];
    assert_eq!(args, "c");
    assert!(at >= ms(180) && at < ms(220), "fired at {at:?}");
    assert!(!gate.pending());
}

#[tokio::test(start_paused = true)]
async fn test_debounce_max_wait_under_continuous_calls() {
    let start = Instant::now();
    let (log, sink) = recording(start);
    let gate = Debounced::builder(ms(100))
        .with_max_wait(ms(300))
        .build(sink)
        .unwrap();

    for i in 0..20u32 {
        gate.call(i);
        sleep(ms(50)).await;
    }

    let times: Vec<_> = log.lock().unwrap().iter().map(|(at, _)| *at).collect();
    assert!(times.len() >= 3, "only {} invocations", times.len());
    for pair in times.windows(2) {
        assert!(pair[1] - pair[0] <= ms(310));
    }
}

#[tokio::test(start_paused = true)]
async fn test_throttle_on_current_runtime() {
    let start = Instant::now();
    let (log, sink) = recording(start);
    let gate = Throttled::builder(ms(100)).build(sink).unwrap();

    for i in 0..5u32 {
        gate.call(i);
        sleep(ms(30)).await;
    }
    sleep(ms(200)).await;

    let args: Vec<_> = log.lock().unwrap().iter().map(|(_, args)| *args).collect();
    assert_eq!(args, vec![0, 3, 4]);
}

#[tokio::test(start_paused = true)]
async fn test_cancel_aborts_pending_timer() {
    let scheduler = TokioScheduler::try_current().unwrap();
    let start = Instant::now();
    let (log, sink) = recording::<u32>(start);
    let gate = Debounced::builder(ms(100))
        .with_scheduler(Arc::new(scheduler.clone()))
        .build(sink)
        .unwrap();

    gate.call(1);
    assert_eq!(scheduler.pending_timers(), 1);
    gate.cancel();
    assert_eq!(scheduler.pending_timers(), 0);

    sleep(ms(500)).await;
    assert!(log.lock().unwrap().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_gate_shared_across_tasks() {
    let start = Instant::now();
    let (log, sink) = recording(start);
    let gate = Debounced::builder(ms(100)).build(sink).unwrap();

    let mut tasks = Vec::new();
    for worker in 0..4u32 {
        let gate = gate.clone();
        tasks.push(tokio::spawn(async move {
            for i in 0..5 {
                gate.call(worker * 10 + i);
                sleep(ms(10)).await;
            }
        }));
    }
    for task in tasks {
        task.await.unwrap();
    }
    sleep(ms(200)).await;

    assert_eq!(log.lock().unwrap().len(), 1);
    assert_eq!(gate.metrics().calls(), 20);
}
