//! Batch writer: buffers normalized records and commits them in bulk.
//!
//! Records accumulate in an in-memory buffer until either the size
//! threshold is reached or the periodic flush fires. A flush detaches the
//! buffer and the pending last-seen set under the lock, then performs one
//! bulk insert and one bulk `last_seen` update outside it, so new arrivals
//! keep accumulating while the write is in flight.
//!
//! Failure policy: a batch whose bulk insert fails is logged and dropped —
//! at-most-once delivery under write failure. The next buffer starts empty,
//! so memory stays bounded by the batch size during a storage outage.

use std::collections::HashSet;
use std::mem;
use std::sync::Arc;

use chrono::Utc;
use lh_parse::NormalizedRecord;
use lh_store::{LogRow, LogStore};

use crate::resolver::AgentResolver;

#[derive(Default)]
struct Buffers {
    rows: Vec<LogRow>,
    /// Agents that received at least one message since the last flush.
    pending_seen: HashSet<i64>,
}

/// Accumulates records and writes them through the store in batches.
pub struct BatchWriter {
    store: Arc<dyn LogStore>,
    resolver: AgentResolver,
    batch_size: usize,
    buffers: tokio::sync::Mutex<Buffers>,
}

impl BatchWriter {
    pub fn new(store: Arc<dyn LogStore>, resolver: AgentResolver, batch_size: usize) -> Self {
        Self {
            store,
            resolver,
            batch_size,
            buffers: tokio::sync::Mutex::new(Buffers::default()),
        }
    }

    /// Resolve the record's agent, buffer it, and flush synchronously if
    /// the buffer has reached the size threshold.
    ///
    /// Resolution failure does not drop the record — it is kept with a
    /// null agent id, since the log row itself is still useful.
    pub async fn enqueue(&self, record: NormalizedRecord) {
        let agent_id = match self.resolver.resolve(&record).await {
            Ok(id) => Some(id),
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    hostname = %record.hostname,
                    ip = %record.ip,
                    "agent resolution failed, keeping record without agent"
                );
                None
            }
        };

        let metadata = record.extra_json();
        let row = LogRow {
            agent_id,
            hostname: record.hostname,
            ip: record.ip,
            received_at: Utc::now(),
            facility: i16::from(record.facility),
            level: record.level.as_str().to_string(),
            source: record.source,
            message: record.message,
            raw_message: record.raw,
            metadata,
        };

        let full = {
            let mut buffers = self.buffers.lock().await;
            buffers.rows.push(row);
            if let Some(id) = agent_id {
                buffers.pending_seen.insert(id);
            }
            buffers.rows.len() >= self.batch_size
        };

        if full {
            self.flush().await;
        }
    }

    /// Detach the current buffer and pending set and commit both in bulk.
    ///
    /// Cheap no-op when nothing is buffered, so the periodic flusher can
    /// call it unconditionally.
    pub async fn flush(&self) {
        let (rows, seen) = {
            let mut buffers = self.buffers.lock().await;
            (
                mem::take(&mut buffers.rows),
                mem::take(&mut buffers.pending_seen),
            )
        };
        if rows.is_empty() && seen.is_empty() {
            return;
        }

        if !rows.is_empty() {
            match self.store.insert_logs(&rows).await {
                Ok(()) => tracing::debug!(records = rows.len(), "batch committed"),
                Err(e) => {
                    // Deliberate at-most-once trade-off: the batch is gone.
                    tracing::error!(
                        error = %e,
                        dropped = rows.len(),
                        "bulk insert failed, batch dropped"
                    );
                }
            }
        }

        if !seen.is_empty() {
            let ids: Vec<i64> = seen.into_iter().collect();
            if let Err(e) = self.store.touch_agents(&ids, Utc::now()).await {
                tracing::warn!(error = %e, agents = ids.len(), "last-seen update failed");
            }
        }
    }

    /// Current number of buffered records (for tests and introspection).
    pub async fn buffered(&self) -> usize {
        self.buffers.lock().await.rows.len()
    }
}
