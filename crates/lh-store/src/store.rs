//! The `LogStore` trait and row types shared by its implementations.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::StoreResult;

/// Attributes of a newly sighted agent, recorded on first resolution.
#[derive(Debug, Clone)]
pub struct NewAgent {
    pub hostname: String,
    pub ip: String,
    pub mac: Option<String>,
    pub device_type: String,
    pub metadata: serde_json::Value,
}

/// A log record ready for bulk insert.
#[derive(Debug, Clone)]
pub struct LogRow {
    /// Resolved agent id; None when resolution failed.
    pub agent_id: Option<i64>,
    pub hostname: String,
    pub ip: String,
    pub received_at: DateTime<Utc>,
    pub facility: i16,
    pub level: String,
    pub source: String,
    pub message: String,
    pub raw_message: String,
    pub metadata: serde_json::Value,
}

/// Abstraction over the durable store the pipeline writes through.
///
/// Analogous to `LogSource` in the log-analysis tools — enables an
/// in-memory mock for resolver/writer tests and e2e runs without
/// a live PostgreSQL.
#[async_trait]
pub trait LogStore: Send + Sync {
    /// Look up an agent id by canonical MAC address.
    async fn find_agent_by_mac(&self, mac: &str) -> StoreResult<Option<i64>>;

    /// Look up an agent id by (hostname, ip) pair.
    async fn find_agent_by_host_ip(&self, hostname: &str, ip: &str) -> StoreResult<Option<i64>>;

    /// Insert an agent if absent and return the surviving row's id.
    ///
    /// Must be atomic under concurrent first-sightings of the same key:
    /// two racing inserts converge on one id, never two rows.
    async fn insert_agent(&self, agent: &NewAgent) -> StoreResult<i64>;

    /// Bulk-insert a batch of log rows in one statement.
    async fn insert_logs(&self, rows: &[LogRow]) -> StoreResult<()>;

    /// Set `last_seen = seen_at` for every listed agent in one statement.
    async fn touch_agents(&self, ids: &[i64], seen_at: DateTime<Utc>) -> StoreResult<()>;
}
