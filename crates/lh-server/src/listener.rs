//! UDP and TCP syslog listeners feeding the parse → resolve → write path.
//!
//! Both listeners share one configured port. Datagram boundaries are
//! message boundaries; stream connections are read newline-delimited, with
//! lines processed in arrival order and the peer address reused for every
//! line. No sender expects a response, so failures are absorbed locally.
//!
//! Shutdown contract: when the `shutdown` signal flips, a listener stops
//! accepting new traffic, waits for every in-flight ingest task it spawned
//! to finish, and only then returns — so the caller's final flush sees
//! every record that was received before the signal.

use std::net::IpAddr;
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::net::{TcpListener, TcpStream, UdpSocket};
use tokio::sync::watch;
use tokio::task::JoinSet;

use crate::writer::BatchWriter;

/// Largest datagram we accept; RFC 3164 messages are far smaller, but
/// access-point firmware is not shy about oversized lines.
const MAX_DATAGRAM: usize = 64 * 1024;

/// Receive loop for the datagram path. Each packet is dispatched as an
/// independent task — packets carry no ordering contract between senders.
pub async fn run_udp(
    socket: UdpSocket,
    writer: Arc<BatchWriter>,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut buf = vec![0u8; MAX_DATAGRAM];
    let mut ingests = JoinSet::new();
    loop {
        tokio::select! {
            result = socket.recv_from(&mut buf) => match result {
                Ok((len, peer)) => {
                    // Undecodable bytes are replaced, never fatal.
                    let line = String::from_utf8_lossy(&buf[..len]).into_owned();
                    if line.trim().is_empty() {
                        continue;
                    }
                    let writer = Arc::clone(&writer);
                    ingests.spawn(async move {
                        ingest(&writer, &line, peer.ip()).await;
                    });
                }
                Err(e) => {
                    tracing::warn!(error = %e, "udp receive failed");
                }
            },
            _ = shutdown.changed() => break,
        }
        // Reap finished tasks so the set stays bounded under load.
        while ingests.try_join_next().is_some() {}
    }
    // Let in-flight parse/resolve work land before the final flush.
    while ingests.join_next().await.is_some() {}
    tracing::debug!("udp listener drained");
}

/// Accept loop for the stream path. One task per connection.
pub async fn run_tcp(
    listener: TcpListener,
    writer: Arc<BatchWriter>,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut conns = JoinSet::new();
    loop {
        tokio::select! {
            result = listener.accept() => match result {
                Ok((stream, peer)) => {
                    tracing::debug!(peer = %peer, "tcp connection accepted");
                    let writer = Arc::clone(&writer);
                    let shutdown = shutdown.clone();
                    conns.spawn(async move {
                        handle_stream(stream, peer.ip(), writer, shutdown).await;
                    });
                }
                Err(e) => {
                    tracing::warn!(error = %e, "tcp accept failed");
                }
            },
            _ = shutdown.changed() => break,
        }
        while conns.try_join_next().is_some() {}
    }
    while conns.join_next().await.is_some() {}
    tracing::debug!("tcp listener drained");
}

/// Read a connection line-by-line until EOF, read failure, or shutdown,
/// dispatching every complete line through the pipeline in arrival order.
async fn handle_stream(
    stream: TcpStream,
    peer_ip: IpAddr,
    writer: Arc<BatchWriter>,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut lines = BufReader::new(stream).lines();
    loop {
        // A receiver cloned after the signal fired never sees a change
        // notification, so check the current value as well.
        if *shutdown.borrow() {
            break;
        }
        tokio::select! {
            result = lines.next_line() => match result {
                Ok(Some(line)) => {
                    if !line.trim().is_empty() {
                        ingest(&writer, &line, peer_ip).await;
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    tracing::debug!(error = %e, peer = %peer_ip, "tcp read failed");
                    break;
                }
            },
            _ = shutdown.changed() => break,
        }
    }
}

async fn ingest(writer: &BatchWriter, line: &str, peer_ip: IpAddr) {
    let record = lh_parse::parse(line, &peer_ip.to_string());
    writer.enqueue(record).await;
}
