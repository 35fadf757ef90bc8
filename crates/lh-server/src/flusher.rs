//! Periodic flush driver for the batch writer.
//!
//! Bounds commit latency for records that never reach the size threshold
//! and drains the pending last-seen set, which can otherwise grow without
//! ever filling the record buffer on its own.

use std::time::Duration;

use tokio::time;

use crate::writer::BatchWriter;

/// Run the flush loop, committing at `interval`.
///
/// Flushes unconditionally — an empty flush is a cheap no-op. Runs forever
/// until the task is cancelled at shutdown.
pub async fn run(writer: &BatchWriter, interval: Duration) {
    let mut ticker = time::interval(interval);
    // Skip the first tick (fires immediately).
    ticker.tick().await;

    loop {
        ticker.tick().await;
        writer.flush().await;
    }
}
