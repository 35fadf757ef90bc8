//! End-to-end tests for the loghive ingestion pipeline live in `tests/`.
//!
//! This crate intentionally has no runtime code.
