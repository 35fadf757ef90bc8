//! Access-point MAC/model format.
//!
//! `<PRI>MAC12HEX,MODEL: SOURCE: MSG`
//!
//! The MAC is the device's stable identity across IP churn; it becomes both
//! the record hostname and the MAC field, canonicalized to colon-separated
//! lowercase pairs. The model string is kept in metadata.

use regex::Regex;
use std::sync::LazyLock;

use crate::types::{DeviceType, NormalizedRecord, WireFormat, decode_priority, format_mac};

static RE_MAC_MODEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^<(\d+)>([a-fA-F0-9]{12}),([^:]+):\s*(\S+?):\s*(.*)$").unwrap()
});

/// Try to parse a line as MAC/model-tagged firmware output.
pub fn parse(line: &str, sender_ip: &str) -> Option<NormalizedRecord> {
    let caps = RE_MAC_MODEL.captures(line)?;
    let pri: u32 = caps[1].parse().ok()?;
    let (facility, level) = decode_priority(pri);
    let mac = format_mac(&caps[2]);

    let mut rec = NormalizedRecord::fallback(line, sender_ip);
    rec.hostname = mac.clone();
    rec.mac = Some(mac);
    rec.device_type = DeviceType::AccessPoint;
    rec.facility = facility;
    rec.level = level;
    rec.source = caps[4].to_string();
    rec.message = caps[5].to_string();
    rec.extra
        .insert("format".to_string(), WireFormat::MacModel.as_str().to_string());
    rec.extra.insert("model".to_string(), caps[3].to_string());
    Some(rec)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Severity;

    #[test]
    fn parse_mac_model_basic() {
        let rec = parse(
            "<30>784558fc21cf,U6-LR-6.7.31: wpa_supplicant: assoc ok",
            "10.0.0.7",
        )
        .unwrap();
        assert_eq!(rec.hostname, "78:45:58:fc:21:cf");
        assert_eq!(rec.mac.as_deref(), Some("78:45:58:fc:21:cf"));
        assert_eq!(rec.facility, 3); // 30 >> 3
        assert_eq!(rec.level, Severity::Info); // 30 & 7 = 6
        assert_eq!(rec.source, "wpa_supplicant");
        assert_eq!(rec.message, "assoc ok");
        assert_eq!(rec.device_type, DeviceType::AccessPoint);
        assert_eq!(rec.extra.get("model").map(String::as_str), Some("U6-LR-6.7.31"));
        assert_eq!(rec.extra.get("format").map(String::as_str), Some("mac_model"));
    }

    #[test]
    fn uppercase_mac_is_canonicalized() {
        let rec = parse("<14>AABBCCDDEEFF,U6-Pro: hostapd: up", "10.0.0.7").unwrap();
        assert_eq!(rec.mac.as_deref(), Some("aa:bb:cc:dd:ee:ff"));
    }

    #[test]
    fn sender_ip_kept_alongside_mac() {
        let rec = parse("<14>aabbccddeeff,U6-Pro: hostapd: up", "172.16.5.5").unwrap();
        assert_eq!(rec.ip, "172.16.5.5");
    }

    #[test]
    fn rejects_short_mac() {
        // 11 hex digits is not a MAC — must fall through to other matchers.
        assert!(parse("<14>aabbccddeef,U6-Pro: hostapd: up", "10.0.0.7").is_none());
    }

    #[test]
    fn rejects_priority_only_line() {
        assert!(parse("<13>hello world", "10.0.0.7").is_none());
    }
}
