//! Drive a debounced function with virtual time.
//!
//! Shows how tests control gates deterministically with `ManualScheduler`.

use callgate::{Debounced, ManualScheduler, RateControl};
use std::sync::Arc;
use std::time::Duration;

fn main() {
    let scheduler = ManualScheduler::new();
    let clock = scheduler.clone();

    let save = Debounced::builder(Duration::from_millis(500))
        .with_leading(true)
        .with_scheduler(Arc::new(scheduler.clone()))
        .build(move |revision: u32| {
            println!("[{:?}] saving revision {revision}", clock.elapsed());
        })
        .expect("explicit scheduler");

    println!("=== Virtual Time ===\n");

    for revision in 1..=5 {
        save.call(revision);
        scheduler.advance(Duration::from_millis(200));
    }

    println!("pending after the burst: {}", save.pending());
    let fired = scheduler.run_until_idle();
    println!("timers fired while idling: {fired}");

    save.call(6);
    scheduler.advance(Duration::from_millis(100));
    save.call(7);
    println!("flush: {:?}", save.flush());
}
