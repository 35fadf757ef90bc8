//! Core record types shared across the ingest pipeline.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ── Severity ──────────────────────────────────────────────────

/// Syslog severity, the low 3 bits of the priority field (RFC 3164).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Emergency,
    Alert,
    Critical,
    Error,
    Warning,
    Notice,
    Info,
    Debug,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Emergency => "emergency",
            Self::Alert => "alert",
            Self::Critical => "critical",
            Self::Error => "error",
            Self::Warning => "warning",
            Self::Notice => "notice",
            Self::Info => "info",
            Self::Debug => "debug",
        }
    }

    /// Map a syslog numeric severity (0–7) to `Severity`.
    ///
    /// A 3-bit mask can never produce a value above 7, but an artificial
    /// out-of-range input must degrade to `Info` rather than panic.
    pub fn from_code(sev: u8) -> Self {
        match sev {
            0 => Self::Emergency,
            1 => Self::Alert,
            2 => Self::Critical,
            3 => Self::Error,
            4 => Self::Warning,
            5 => Self::Notice,
            6 => Self::Info,
            7 => Self::Debug,
            _ => Self::Info,
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Device Type ───────────────────────────────────────────────

/// Kind of device a message originated from, inferred from its wire format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceType {
    /// Generic syslog sender.
    Unknown,
    /// Access-point firmware (netconsole or MAC/model format).
    AccessPoint,
}

impl DeviceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::AccessPoint => "access_point",
        }
    }
}

// ── Wire Format ───────────────────────────────────────────────

/// Which format matcher produced a record, recorded in its metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WireFormat {
    /// Access-point netconsole with a hex sequence token.
    Netconsole,
    /// `<pri>mac,model: source: msg` firmware format.
    MacModel,
    /// Classic BSD syslog (RFC 3164).
    Bsd,
    /// Bare `<pri> msg` with no further structure.
    Priority,
}

impl WireFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Netconsole => "netconsole",
            Self::MacModel => "mac_model",
            Self::Bsd => "bsd",
            Self::Priority => "priority",
        }
    }
}

// ── Priority decoding ─────────────────────────────────────────

/// Split a syslog priority into (facility, severity).
///
/// facility = pri >> 3, severity = pri & 0x7. Hostile senders can put
/// arbitrary digits inside the angle brackets; a quotient above 255
/// saturates to `u8::MAX` so truncation never masquerades as a small,
/// valid facility.
pub fn decode_priority(pri: u32) -> (u8, Severity) {
    let facility = u8::try_from(pri >> 3).unwrap_or(u8::MAX);
    let severity = Severity::from_code((pri & 0x7) as u8);
    (facility, severity)
}

// ── MAC formatting ────────────────────────────────────────────

/// Canonicalize a 12-hex-digit MAC: `784558FC21CF` → `78:45:58:fc:21:cf`.
///
/// Idempotent — an already colon-separated MAC passes through unchanged.
pub fn format_mac(mac: &str) -> String {
    let hex: String = mac
        .chars()
        .filter(|c| *c != ':')
        .map(|c| c.to_ascii_lowercase())
        .collect();
    hex.as_bytes()
        .chunks(2)
        .map(|pair| std::str::from_utf8(pair).unwrap_or_default())
        .collect::<Vec<_>>()
        .join(":")
}

// ── Normalized Record ─────────────────────────────────────────

/// A syslog message normalized from any supported wire format.
///
/// Every record carries a non-empty hostname/ip and exactly one
/// facility/level pair; unparseable input keeps the defaults:
/// facility 1 ("user"), level info, sender address as hostname.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizedRecord {
    /// Best-known device name: literal hostname, canonical MAC, or sender ip.
    pub hostname: String,
    /// Sender network address.
    pub ip: String,
    /// Canonical colon-separated lowercase MAC, when the format carries one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mac: Option<String>,
    /// Device kind inferred from the wire format.
    pub device_type: DeviceType,
    /// Syslog facility (0–23).
    pub facility: u8,
    /// Syslog severity name.
    pub level: Severity,
    /// Emitting program/process name.
    pub source: String,
    /// Message body with framing stripped.
    pub message: String,
    /// Original unmodified line.
    pub raw: String,
    /// Format tag plus format-specific fields (sequence, model).
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub extra: HashMap<String, String>,
}

impl NormalizedRecord {
    /// Default record for input no matcher recognizes.
    pub fn fallback(raw: &str, sender_ip: &str) -> Self {
        Self {
            hostname: sender_ip.to_string(),
            ip: sender_ip.to_string(),
            mac: None,
            device_type: DeviceType::Unknown,
            facility: 1,
            level: Severity::Info,
            source: "unknown".to_string(),
            message: raw.to_string(),
            raw: raw.to_string(),
            extra: HashMap::new(),
        }
    }

    /// Metadata map as a JSON object for storage.
    pub fn extra_json(&self) -> serde_json::Value {
        serde_json::to_value(&self.extra).unwrap_or_else(|_| serde_json::json!({}))
    }
}
