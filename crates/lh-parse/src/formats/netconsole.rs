//! Access-point netconsole format.
//!
//! `<PRI>{HEXSEQ} [TIMESTAMP] SOURCE[PID]: MSG`
//!
//! The braced hex token is a per-boot sequence counter, NOT a device
//! identity. The record's hostname must be the sender's network address —
//! mistaking the sequence for a hostname splinters one device into
//! thousands of phantom agents.

use regex::Regex;
use std::sync::LazyLock;

use crate::types::{DeviceType, NormalizedRecord, WireFormat, decode_priority};

static RE_NETCONSOLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^<(\d+)>\{([a-fA-F0-9]+)\}\s*\[[\d.]+\]\s*(\S+?)(?:\[\d+\])?:\s*(.*)$").unwrap()
});

/// Try to parse a line as netconsole output.
pub fn parse(line: &str, sender_ip: &str) -> Option<NormalizedRecord> {
    let caps = RE_NETCONSOLE.captures(line)?;
    let pri: u32 = caps[1].parse().ok()?;
    let (facility, level) = decode_priority(pri);

    let mut rec = NormalizedRecord::fallback(line, sender_ip);
    // Hostname stays the sender address — the hex token is a sequence number.
    rec.device_type = DeviceType::AccessPoint;
    rec.facility = facility;
    rec.level = level;
    rec.source = caps[3].to_string();
    rec.message = caps[4].to_string();
    rec.extra
        .insert("format".to_string(), WireFormat::Netconsole.as_str().to_string());
    rec.extra.insert("sequence".to_string(), caps[2].to_string());
    Some(rec)
}
