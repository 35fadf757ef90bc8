//! Agent identity resolution with a TTL-bounded in-memory cache.
//!
//! Maps a record's identity tuple — MAC when known, else hostname + ip —
//! to a durable agent id. Hits inside the TTL window are served from the
//! cache; misses and expired entries re-validate against the store, which
//! bounds how stale manually edited or cross-restart agent data can get.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

use lh_parse::NormalizedRecord;
use lh_store::{LogStore, NewAgent, StoreResult};

/// Cache key: MAC takes precedence over hostname + ip because it is the
/// stabler identifier across IP churn.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum AgentKey {
    Mac(String),
    HostIp(String, String),
}

impl AgentKey {
    fn from_record(record: &NormalizedRecord) -> Self {
        match &record.mac {
            Some(mac) => Self::Mac(mac.clone()),
            None => Self::HostIp(record.hostname.clone(), record.ip.clone()),
        }
    }
}

struct CacheEntry {
    agent_id: i64,
    confirmed_at: Instant,
}

/// Resolves identity tuples to agent ids, creating agents on first sight.
pub struct AgentResolver {
    store: Arc<dyn LogStore>,
    ttl: Duration,
    cache: Mutex<HashMap<AgentKey, CacheEntry>>,
}

impl AgentResolver {
    pub fn new(store: Arc<dyn LogStore>, ttl: Duration) -> Self {
        Self {
            store,
            ttl,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Resolve the record's identity to an agent id.
    ///
    /// May create a new durable agent row. Concurrent first-sightings of
    /// one key converge on a single row via the store's atomic insert.
    pub async fn resolve(&self, record: &NormalizedRecord) -> StoreResult<i64> {
        let key = AgentKey::from_record(record);

        {
            let mut cache = self.cache.lock().await;
            if let Some(entry) = cache.get_mut(&key) {
                if entry.confirmed_at.elapsed() < self.ttl {
                    entry.confirmed_at = Instant::now();
                    return Ok(entry.agent_id);
                }
            }
        }

        // Miss or expiry: hit the store outside the cache lock so a slow
        // round-trip never blocks resolution of other keys.
        let agent_id = self.lookup_or_create(record).await?;

        self.cache.lock().await.insert(
            key,
            CacheEntry {
                agent_id,
                confirmed_at: Instant::now(),
            },
        );
        Ok(agent_id)
    }

    async fn lookup_or_create(&self, record: &NormalizedRecord) -> StoreResult<i64> {
        if let Some(mac) = &record.mac {
            if let Some(id) = self.store.find_agent_by_mac(mac).await? {
                return Ok(id);
            }
        }
        if let Some(id) = self
            .store
            .find_agent_by_host_ip(&record.hostname, &record.ip)
            .await?
        {
            return Ok(id);
        }

        let id = self
            .store
            .insert_agent(&NewAgent {
                hostname: record.hostname.clone(),
                ip: record.ip.clone(),
                mac: record.mac.clone(),
                device_type: record.device_type.as_str().to_string(),
                metadata: record.extra_json(),
            })
            .await?;
        tracing::info!(
            agent_id = id,
            hostname = %record.hostname,
            ip = %record.ip,
            mac = record.mac.as_deref().unwrap_or("-"),
            "new agent registered"
        );
        Ok(id)
    }
}
