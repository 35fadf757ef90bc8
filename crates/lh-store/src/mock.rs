//! In-memory log store for tests.
//!
//! Mirrors the PostgreSQL semantics — including atomic insert-if-absent on
//! agent identity — and counts lookups/writes so tests can assert cache and
//! batching behavior. A failure switch simulates a storage outage.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Mutex;

use crate::error::{StoreError, StoreResult};
use crate::store::{LogRow, LogStore, NewAgent};

/// An agent row held by the mock.
#[derive(Debug, Clone)]
pub struct MockAgent {
    pub id: i64,
    pub hostname: String,
    pub ip: String,
    pub mac: Option<String>,
    pub device_type: String,
    pub last_seen: DateTime<Utc>,
}

#[derive(Default)]
struct Inner {
    next_id: i64,
    agents: Vec<MockAgent>,
    logs: Vec<LogRow>,
    /// One entry per `touch_agents` call, holding the ids it carried.
    touch_batches: Vec<Vec<i64>>,
    /// Number of agent lookup calls (by MAC or host/ip).
    lookups: u64,
}

/// In-memory `LogStore` with instrumentation counters.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
    fail_writes: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `insert_logs` and `touch_agents` fail until reset.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub async fn agent_count(&self) -> usize {
        self.inner.lock().await.agents.len()
    }

    pub async fn agents(&self) -> Vec<MockAgent> {
        self.inner.lock().await.agents.clone()
    }

    pub async fn log_count(&self) -> usize {
        self.inner.lock().await.logs.len()
    }

    pub async fn logs(&self) -> Vec<LogRow> {
        self.inner.lock().await.logs.clone()
    }

    /// Ids carried by each `touch_agents` call, in call order.
    pub async fn touch_batches(&self) -> Vec<Vec<i64>> {
        self.inner.lock().await.touch_batches.clone()
    }

    /// Total agent lookup calls issued against the store.
    pub async fn lookup_count(&self) -> u64 {
        self.inner.lock().await.lookups
    }

    fn write_error() -> StoreError {
        StoreError::Database(sqlx::Error::PoolClosed)
    }
}

#[async_trait]
impl LogStore for MemoryStore {
    async fn find_agent_by_mac(&self, mac: &str) -> StoreResult<Option<i64>> {
        let mut inner = self.inner.lock().await;
        inner.lookups += 1;
        Ok(inner
            .agents
            .iter()
            .find(|a| a.mac.as_deref() == Some(mac))
            .map(|a| a.id))
    }

    async fn find_agent_by_host_ip(&self, hostname: &str, ip: &str) -> StoreResult<Option<i64>> {
        let mut inner = self.inner.lock().await;
        inner.lookups += 1;
        Ok(inner
            .agents
            .iter()
            .find(|a| a.hostname == hostname && a.ip == ip)
            .map(|a| a.id))
    }

    async fn insert_agent(&self, agent: &NewAgent) -> StoreResult<i64> {
        // Single lock acquisition makes the check-then-insert atomic, the
        // way the unique constraints do for PostgreSQL.
        let mut inner = self.inner.lock().await;
        let existing = inner
            .agents
            .iter()
            .find(|a| {
                (agent.mac.is_some() && a.mac == agent.mac)
                    || (a.hostname == agent.hostname && a.ip == agent.ip)
            })
            .map(|a| a.id);
        if let Some(id) = existing {
            return Ok(id);
        }
        inner.next_id += 1;
        let id = inner.next_id;
        inner.agents.push(MockAgent {
            id,
            hostname: agent.hostname.clone(),
            ip: agent.ip.clone(),
            mac: agent.mac.clone(),
            device_type: agent.device_type.clone(),
            last_seen: Utc::now(),
        });
        Ok(id)
    }

    async fn insert_logs(&self, rows: &[LogRow]) -> StoreResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(Self::write_error());
        }
        self.inner.lock().await.logs.extend_from_slice(rows);
        Ok(())
    }

    async fn touch_agents(&self, ids: &[i64], seen_at: DateTime<Utc>) -> StoreResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(Self::write_error());
        }
        let mut inner = self.inner.lock().await;
        for agent in inner.agents.iter_mut() {
            if ids.contains(&agent.id) {
                agent.last_seen = seen_at;
            }
        }
        inner.touch_batches.push(ids.to_vec());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_agent(hostname: &str, ip: &str, mac: Option<&str>) -> NewAgent {
        NewAgent {
            hostname: hostname.to_string(),
            ip: ip.to_string(),
            mac: mac.map(String::from),
            device_type: "unknown".to_string(),
            metadata: serde_json::json!({}),
        }
    }

    #[tokio::test]
    async fn insert_agent_is_idempotent_per_key() {
        let store = MemoryStore::new();
        let a = store
            .insert_agent(&new_agent("78:45:58:fc:21:cf", "10.0.0.7", Some("78:45:58:fc:21:cf")))
            .await
            .unwrap();
        let b = store
            .insert_agent(&new_agent("78:45:58:fc:21:cf", "10.0.0.8", Some("78:45:58:fc:21:cf")))
            .await
            .unwrap();
        assert_eq!(a, b);
        assert_eq!(store.agent_count().await, 1);
    }

    #[tokio::test]
    async fn distinct_keys_get_distinct_ids() {
        let store = MemoryStore::new();
        let a = store.insert_agent(&new_agent("h1", "10.0.0.1", None)).await.unwrap();
        let b = store.insert_agent(&new_agent("h2", "10.0.0.2", None)).await.unwrap();
        assert_ne!(a, b);
        assert_eq!(store.agent_count().await, 2);
    }

    #[tokio::test]
    async fn failed_writes_reject_both_paths() {
        let store = MemoryStore::new();
        store.set_fail_writes(true);
        assert!(store.insert_logs(&[]).await.is_err());
        assert!(store.touch_agents(&[1], Utc::now()).await.is_err());
        store.set_fail_writes(false);
        assert!(store.insert_logs(&[]).await.is_ok());
    }

    #[tokio::test]
    async fn touch_updates_last_seen() {
        let store = MemoryStore::new();
        let id = store.insert_agent(&new_agent("h1", "10.0.0.1", None)).await.unwrap();
        let later = Utc::now() + chrono::Duration::seconds(60);
        store.touch_agents(&[id], later).await.unwrap();
        assert_eq!(store.agents().await[0].last_seen, later);
        assert_eq!(store.touch_batches().await, vec![vec![id]]);
    }
}
