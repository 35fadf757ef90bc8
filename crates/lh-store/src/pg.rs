//! PostgreSQL implementation of `LogStore`.
//!
//! Owns the connection pool, runs embedded migrations on connect, and
//! retries the initial connection a bounded number of times — exhaustion
//! is surfaced as a typed error the binary treats as fatal.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, QueryBuilder};
use std::time::Duration;

use crate::error::{StoreError, StoreResult};
use crate::store::{LogRow, LogStore, NewAgent};

/// Connection retry bounds for startup.
pub const CONNECT_ATTEMPTS: u32 = 30;
pub const CONNECT_DELAY: Duration = Duration::from_secs(2);

const POOL_MIN_CONNECTIONS: u32 = 5;
const POOL_MAX_CONNECTIONS: u32 = 20;

/// PostgreSQL-backed log store.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Connect with bounded retry and run migrations.
    pub async fn connect(database_url: &str) -> StoreResult<Self> {
        let mut last = None;
        for attempt in 1..=CONNECT_ATTEMPTS {
            match PgPoolOptions::new()
                .min_connections(POOL_MIN_CONNECTIONS)
                .max_connections(POOL_MAX_CONNECTIONS)
                .connect(database_url)
                .await
            {
                Ok(pool) => {
                    tracing::info!(attempt, "database connected");
                    let store = Self { pool };
                    store.migrate().await?;
                    return Ok(store);
                }
                Err(e) => {
                    tracing::warn!(
                        attempt,
                        max_attempts = CONNECT_ATTEMPTS,
                        error = %e,
                        "database connection failed"
                    );
                    last = Some(e);
                    tokio::time::sleep(CONNECT_DELAY).await;
                }
            }
        }
        Err(StoreError::ConnectExhausted {
            attempts: CONNECT_ATTEMPTS,
            last: last.unwrap_or(sqlx::Error::PoolClosed),
        })
    }

    async fn migrate(&self) -> StoreResult<()> {
        tracing::info!("running database migrations");
        sqlx::raw_sql(include_str!("../migrations/001_agents.sql"))
            .execute(&self.pool)
            .await?;
        sqlx::raw_sql(include_str!("../migrations/002_logs.sql"))
            .execute(&self.pool)
            .await?;
        tracing::info!("migrations complete");
        Ok(())
    }

    /// Close the pool, waiting for in-flight queries to finish.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl LogStore for PgStore {
    async fn find_agent_by_mac(&self, mac: &str) -> StoreResult<Option<i64>> {
        let id = sqlx::query_scalar::<_, i64>("SELECT id FROM agents WHERE mac_address = $1")
            .bind(mac)
            .fetch_optional(&self.pool)
            .await?;
        Ok(id)
    }

    async fn find_agent_by_host_ip(&self, hostname: &str, ip: &str) -> StoreResult<Option<i64>> {
        let id = sqlx::query_scalar::<_, i64>(
            "SELECT id FROM agents WHERE hostname = $1 AND ip_address = $2",
        )
        .bind(hostname)
        .bind(ip)
        .fetch_optional(&self.pool)
        .await?;
        Ok(id)
    }

    async fn insert_agent(&self, agent: &NewAgent) -> StoreResult<i64> {
        // Unique constraints on mac_address and (hostname, ip_address) make
        // this race-safe: of two concurrent first-sightings, one insert wins
        // and the loser re-reads the winner's id.
        let inserted = sqlx::query_scalar::<_, i64>(
            "INSERT INTO agents (hostname, ip_address, mac_address, device_type, metadata)
             VALUES ($1, $2, $3, $4, $5)
             ON CONFLICT DO NOTHING
             RETURNING id",
        )
        .bind(&agent.hostname)
        .bind(&agent.ip)
        .bind(&agent.mac)
        .bind(&agent.device_type)
        .bind(&agent.metadata)
        .fetch_optional(&self.pool)
        .await?;

        if let Some(id) = inserted {
            return Ok(id);
        }
        if let Some(mac) = &agent.mac {
            if let Some(id) = self.find_agent_by_mac(mac).await? {
                return Ok(id);
            }
        }
        self.find_agent_by_host_ip(&agent.hostname, &agent.ip)
            .await?
            .ok_or_else(|| {
                StoreError::Other(format!(
                    "agent vanished between insert and lookup: {}/{}",
                    agent.hostname, agent.ip
                ))
            })
    }

    async fn insert_logs(&self, rows: &[LogRow]) -> StoreResult<()> {
        if rows.is_empty() {
            return Ok(());
        }
        let mut qb = QueryBuilder::new(
            "INSERT INTO logs (agent_id, hostname, ip_address, received_at, facility, \
             level, source, message, raw_message, metadata) ",
        );
        qb.push_values(rows, |mut b, row| {
            b.push_bind(row.agent_id)
                .push_bind(&row.hostname)
                .push_bind(&row.ip)
                .push_bind(row.received_at)
                .push_bind(row.facility)
                .push_bind(&row.level)
                .push_bind(&row.source)
                .push_bind(&row.message)
                .push_bind(&row.raw_message)
                .push_bind(&row.metadata);
        });
        qb.build().execute(&self.pool).await?;
        Ok(())
    }

    async fn touch_agents(&self, ids: &[i64], seen_at: DateTime<Utc>) -> StoreResult<()> {
        if ids.is_empty() {
            return Ok(());
        }
        sqlx::query("UPDATE agents SET last_seen = $1 WHERE id = ANY($2)")
            .bind(seen_at)
            .bind(ids)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
