//! Debounce a search box and throttle a scroll handler on tokio.
//!
//! Run with `RUST_LOG=callgate=debug` to see timers being armed and cancelled.

use callgate::{Debounced, RateControl, Throttled};
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let start = Instant::now();

    println!("=== Debounce ===\n");
    println!("Quiet period 150ms, max wait 400ms\n");

    let search = Debounced::builder(Duration::from_millis(150))
        .with_max_wait(Duration::from_millis(400))
        .with_name("search")
        .build(move |query: String| {
            println!("[{:>4}ms] searching for {query:?}", start.elapsed().as_millis());
        })
        .expect("a tokio runtime is running");

    // Someone types "callgate", one keystroke every 60ms.
    let mut query = String::new();
    for ch in "callgate".chars() {
        query.push(ch);
        search.call(query.clone());
        sleep(Duration::from_millis(60)).await;
    }
    sleep(Duration::from_millis(200)).await;

    println!("\n=== Throttle ===\n");
    println!("Interval 100ms, leading and trailing\n");

    let start = Instant::now();
    let on_scroll = Throttled::builder(Duration::from_millis(100))
        .with_name("scroll")
        .build(move |offset: u32| {
            println!("[{:>4}ms] scrolled to {offset}", start.elapsed().as_millis());
        })
        .expect("a tokio runtime is running");

    for offset in (0..=400).step_by(20) {
        on_scroll.call(offset);
        sleep(Duration::from_millis(15)).await;
    }

    // Deliver the final position without waiting for the window to close.
    on_scroll.flush();

    let stats = on_scroll.metrics().snapshot();
    println!(
        "\n{} calls, {} invocations ({:.0}% absorbed)",
        stats.calls,
        stats.invocations,
        (1.0 - stats.invocation_rate()) * 100.0
    );
}
