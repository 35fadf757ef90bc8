//! loghive syslog ingestion server.
//!
//! Accepts syslog on one UDP/TCP port, normalizes heterogeneous wire
//! formats, resolves each message to a durable agent identity, and
//! persists records to PostgreSQL in batches.

use std::sync::Arc;
use std::time::Duration;

use tokio::net::{TcpListener, UdpSocket};
use tokio::sync::watch;
use tracing_subscriber::EnvFilter;

use lh_server::config::ServerConfig;
use lh_server::resolver::AgentResolver;
use lh_server::writer::BatchWriter;
use lh_server::{flusher, listener};
use lh_store::{LogStore, PgStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .init();

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "lh-server starting");

    let config = ServerConfig::from_env();
    tracing::info!(
        db_host = %config.db_host,
        db_name = %config.db_name,
        syslog_port = config.syslog_port,
        batch_size = config.batch_size,
        "config loaded"
    );

    // Fatal after retry exhaustion — there is nothing to ingest into.
    let store = PgStore::connect(&config.database_url()).await?;

    let shared: Arc<dyn LogStore> = Arc::new(store.clone());
    let resolver = AgentResolver::new(
        Arc::clone(&shared),
        Duration::from_secs(config.cache_ttl_secs),
    );
    let writer = Arc::new(BatchWriter::new(shared, resolver, config.batch_size));

    let addr = format!("0.0.0.0:{}", config.syslog_port);
    let udp = UdpSocket::bind(&addr).await?;
    let tcp = TcpListener::bind(&addr).await?;
    tracing::info!(addr = %addr, "listening on udp/tcp");

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let udp_task = tokio::spawn(listener::run_udp(
        udp,
        Arc::clone(&writer),
        shutdown_rx.clone(),
    ));
    let tcp_task = tokio::spawn(listener::run_tcp(tcp, Arc::clone(&writer), shutdown_rx));

    tokio::select! {
        () = flusher::run(&writer, Duration::from_secs(config.batch_interval_secs)) => {
            tracing::error!("flush loop exited unexpectedly");
        }
        // Graceful shutdown on SIGINT/SIGTERM
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("shutdown signal received");
        }
    }

    // Stop accepting traffic and wait for in-flight ingest to land, so the
    // final flush below sees every record received before the signal.
    let _ = shutdown_tx.send(true);
    if let Err(e) = udp_task.await {
        tracing::warn!(error = %e, "udp listener task failed");
    }
    if let Err(e) = tcp_task.await {
        tracing::warn!(error = %e, "tcp listener task failed");
    }

    // Drain whatever is still buffered, then release the pool.
    writer.flush().await;
    store.close().await;

    tracing::info!("lh-server stopped");
    Ok(())
}
