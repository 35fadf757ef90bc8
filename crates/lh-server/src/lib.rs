//! loghive syslog ingestion server.
//!
//! Wires the pipeline together: the UDP/TCP [`listener`] feeds raw lines
//! through `lh_parse`, the [`resolver`] attaches a durable agent identity,
//! the [`writer`] buffers records for bulk commit, and the [`flusher`]
//! bounds commit latency with a periodic unconditional flush.

pub mod config;
pub mod flusher;
pub mod listener;
pub mod resolver;
pub mod writer;
