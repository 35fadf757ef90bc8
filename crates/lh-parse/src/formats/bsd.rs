//! Classic BSD syslog (RFC 3164).
//!
//! `<PRI>Mmm dd HH:MM:SS HOSTNAME SOURCE[PID]: MSG`

use regex::Regex;
use std::sync::LazyLock;

use crate::types::{NormalizedRecord, WireFormat, decode_priority};

static RE_BSD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^<(\d+)>([A-Z][a-z]{2}\s+\d+\s+\d+:\d+:\d+)\s+(\S+)\s+(\S+?)(?:\[\d+\])?:\s*(.*)$",
    )
    .unwrap()
});

/// Try to parse a line as BSD syslog. The hostname is taken literally
/// from the message; device type stays at the default.
pub fn parse(line: &str, sender_ip: &str) -> Option<NormalizedRecord> {
    let caps = RE_BSD.captures(line)?;
    let pri: u32 = caps[1].parse().ok()?;
    let (facility, level) = decode_priority(pri);

    let mut rec = NormalizedRecord::fallback(line, sender_ip);
    rec.hostname = caps[3].to_string();
    rec.facility = facility;
    rec.level = level;
    rec.source = caps[4].to_string();
    rec.message = caps[5].to_string();
    rec.extra
        .insert("format".to_string(), WireFormat::Bsd.as_str().to_string());
    Some(rec)
}
