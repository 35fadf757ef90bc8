//! Durable storage for loghive.
//!
//! Defines the [`LogStore`] abstraction the ingest pipeline writes through,
//! a PostgreSQL implementation ([`PgStore`]) with pooled connections,
//! bounded connect retry, and embedded migrations, and an in-memory
//! [`MemoryStore`] for tests.

pub mod error;
pub mod mock;
pub mod pg;
pub mod store;

// Re-export key types for convenience
pub use error::{StoreError, StoreResult};
pub use mock::MemoryStore;
pub use pg::PgStore;
pub use store::{LogRow, LogStore, NewAgent};
