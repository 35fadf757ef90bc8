//! Syslog wire-format parsing for loghive.
//!
//! Accepts raw text lines from heterogeneous devices — access-point
//! netconsole output, MAC/model-tagged firmware logs, classic BSD syslog,
//! and bare `<pri>` lines — and normalizes every one of them into a
//! [`NormalizedRecord`]. Parsing never fails: unrecognized input degrades
//! to a default record carrying the raw text.

pub mod formats;
pub mod types;

// Re-export key types for convenience
pub use formats::parse;
pub use types::{DeviceType, NormalizedRecord, Severity, WireFormat, decode_priority, format_mac};
