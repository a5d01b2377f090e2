//! Example: retrying a flaky call with rebound
//!
//! This example demonstrates:
//! 1. Exponential backoff against the wall clock
//! 2. Giving up immediately on errors classified as fatal
//! 3. Stopping an unlimited session from another task
//!
//! Run with:
//! ```bash
//! RUST_LOG=rebound=debug cargo run -p rebound --features tracing --example retry_example
//! ```

use rebound::prelude::*;
use std::error::Error;
use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// A simulated API that fails the first few times
struct UnreliableApi {
    attempts: AtomicU32,
    fail_count: u32,
}

impl UnreliableApi {
    fn new(fail_count: u32) -> Self {
        Self {
            attempts: AtomicU32::new(0),
            fail_count,
        }
    }

    async fn call(&self) -> Result<String, io::Error> {
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst) + 1;

        if attempt <= self.fail_count {
            println!("  Attempt {attempt}: FAILED (simulating transient error)");
            Err(io::Error::other(format!("transient error on attempt {attempt}")))
        } else {
            println!("  Attempt {attempt}: SUCCESS");
            Ok("API response data".to_string())
        }
    }

    fn total_attempts(&self) -> u32 {
        self.attempts.load(Ordering::SeqCst)
    }
}

/// Example 1: Exponential backoff on the wall clock
async fn example_backoff() -> Result<(), Box<dyn Error>> {
    println!("\n=== Example 1: Exponential Backoff ===\n");

    let api = UnreliableApi::new(2);
    let start = Instant::now();

    let result = RetryArgs::new()
        .operation(|| api.call())
        .attempts(5)
        .delay(Duration::from_millis(100))
        .backoff_factor(2.0)
        .notify(|err, attempt| println!("  notify: attempt {attempt} failed: {err}"))
        .call()
        .await?;

    println!("\nResult: {result}");
    println!("Total attempts: {}", api.total_attempts());
    println!("Total time: {:?}", start.elapsed());
    println!("Expected delays: 100ms + 200ms = ~300ms");

    Ok(())
}

/// Example 2: Fatal errors are returned unchanged
async fn example_fatal() -> Result<(), Box<dyn Error>> {
    println!("\n=== Example 2: Fatal Errors ===\n");

    let attempts = Arc::new(AtomicU32::new(0));
    let counter = Arc::clone(&attempts);

    let err = RetryArgs::new()
        .operation(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            async {
                Err::<(), _>(io::Error::new(
                    io::ErrorKind::PermissionDenied,
                    "auth failed",
                ))
            }
        })
        .is_fatal_error(|err: &io::Error| err.kind() == io::ErrorKind::PermissionDenied)
        .attempts(5)
        .delay(Duration::from_millis(10))
        .call()
        .await
        .unwrap_err();

    println!("Error: {err} (fatal: {})", err.is_fatal());
    println!("Total attempts: {}", attempts.load(Ordering::SeqCst));

    Ok(())
}

/// Example 3: Stopping an unlimited session
async fn example_stop() -> Result<(), Box<dyn Error>> {
    println!("\n=== Example 3: Cancellation ===\n");

    let token = CancellationToken::new();
    let canceller = {
        let token = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(250)).await;
            println!("  cancelling...");
            token.cancel();
        })
    };

    let start = Instant::now();
    let err = RetryArgs::new()
        .operation(|| async { Err::<(), _>(io::Error::other("service unavailable")) })
        .unlimited_attempts()
        .delay(Duration::from_millis(40))
        .backoff_factor(1.5)
        .max_delay(Duration::from_secs(1))
        .notify(|_, attempt| println!("  attempt {attempt} failed"))
        .stop(token)
        .call()
        .await
        .unwrap_err();
    canceller.await?;

    println!("Error: {err}");
    println!("Stopped after {:?}", start.elapsed());

    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    println!("==============================================");
    println!("   rebound: Retry Examples");
    println!("==============================================");

    example_backoff().await?;
    example_fatal().await?;
    example_stop().await?;

    println!("\n==============================================");
    println!("   All examples completed successfully!");
    println!("==============================================\n");

    Ok(())
}
