//! Shared pipeline fixtures for the e2e tests.

use std::sync::Arc;
use std::time::Duration;

use lh_server::resolver::AgentResolver;
use lh_server::writer::BatchWriter;
use lh_store::{LogStore, MemoryStore};

/// Build a resolver + writer over a fresh in-memory store.
pub fn pipeline(batch_size: usize) -> (Arc<MemoryStore>, Arc<BatchWriter>) {
    let store = Arc::new(MemoryStore::new());
    let resolver = AgentResolver::new(
        Arc::clone(&store) as Arc<dyn LogStore>,
        Duration::from_secs(300),
    );
    let writer = Arc::new(BatchWriter::new(
        Arc::clone(&store) as Arc<dyn LogStore>,
        resolver,
        batch_size,
    ));
    (store, writer)
}

/// Poll until `writer.buffered()` reports `expected` records or the
/// deadline passes. Spawned ingest tasks land asynchronously, so tests
/// wait for arrival instead of sleeping a fixed interval.
pub async fn wait_for_buffered(writer: &BatchWriter, expected: usize) {
    for _ in 0..100 {
        if writer.buffered().await >= expected {
            return;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("pipeline never buffered {expected} records");
}
