//! Ordered cascade of wire-format matchers.
//!
//! Each matcher tries one format and returns `None` if the line is not in
//! that format. Evaluation order is fixed — netconsole, MAC/model, BSD,
//! priority-only — because the earlier grammars are strict supersets of the
//! bare `<pri>` fallback. New formats must be appended without reordering
//! the existing entries.

pub mod bsd;
pub mod mac_model;
pub mod netconsole;

use regex::Regex;
use std::sync::LazyLock;

use crate::types::{NormalizedRecord, WireFormat, decode_priority};

// Pattern 4: bare priority — <PRI> MSG
static RE_PRIORITY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^<(\d+)>\s*(.*)$").unwrap());

/// Normalize one raw syslog line from `sender_ip`.
///
/// Never fails — input no matcher recognizes becomes a default record with
/// the raw text as message body and the sender address as hostname.
pub fn parse(raw: &str, sender_ip: &str) -> NormalizedRecord {
    let line = raw.trim();
    netconsole::parse(line, sender_ip)
        .or_else(|| mac_model::parse(line, sender_ip))
        .or_else(|| bsd::parse(line, sender_ip))
        .or_else(|| parse_priority_only(line, sender_ip))
        .unwrap_or_else(|| NormalizedRecord::fallback(line, sender_ip))
}

/// Pattern 4: only the priority field is structured.
fn parse_priority_only(line: &str, sender_ip: &str) -> Option<NormalizedRecord> {
    let caps = RE_PRIORITY.captures(line)?;
    let pri: u32 = caps[1].parse().ok()?;
    let (facility, level) = decode_priority(pri);

    let mut rec = NormalizedRecord::fallback(line, sender_ip);
    rec.facility = facility;
    rec.level = level;
    rec.message = caps[2].to_string();
    rec.extra
        .insert("format".to_string(), WireFormat::Priority.as_str().to_string());
    Some(rec)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{DeviceType, Severity};

    #[test]
    fn priority_only_line() {
        let rec = parse("<13>hello world", "192.168.1.50");
        assert_eq!(rec.facility, 1);
        assert_eq!(rec.level, Severity::Notice); // 13 & 7 = 5
        assert_eq!(rec.message, "hello world");
        assert_eq!(rec.hostname, "192.168.1.50");
        assert_eq!(rec.source, "unknown");
        assert_eq!(rec.extra.get("format").map(String::as_str), Some("priority"));
    }

    #[test]
    fn free_form_text_falls_through() {
        let rec = parse("no priority at all", "10.1.2.3");
        assert_eq!(rec.facility, 1);
        assert_eq!(rec.level, Severity::Info);
        assert_eq!(rec.message, "no priority at all");
        assert_eq!(rec.raw, "no priority at all");
        assert_eq!(rec.device_type, DeviceType::Unknown);
        assert!(rec.extra.is_empty());
    }

    #[test]
    fn empty_input_is_default_record() {
        let rec = parse("", "10.1.2.3");
        assert_eq!(rec.hostname, "10.1.2.3");
        assert_eq!(rec.facility, 1);
        assert_eq!(rec.level, Severity::Info);
    }

    #[test]
    fn cascade_prefers_netconsole_over_priority() {
        // A netconsole line also matches the bare-priority pattern; the
        // cascade must pick the more specific grammar first.
        let rec = parse("<6>{a1b2} [123.456] hostapd[99]: Started", "10.0.0.5");
        assert_eq!(rec.extra.get("format").map(String::as_str), Some("netconsole"));
    }

    #[test]
    fn cascade_prefers_bsd_over_priority() {
        let rec = parse("<134>Jan  5 10:20:30 myhost sshd[12]: login", "10.0.0.5");
        assert_eq!(rec.extra.get("format").map(String::as_str), Some("bsd"));
    }

    #[test]
    fn surrounding_whitespace_is_stripped() {
        let rec = parse("  <13>padded\n", "10.0.0.5");
        assert_eq!(rec.message, "padded");
        assert_eq!(rec.facility, 1);
    }
}
