// Wire types for the peripheral HTTP API.
//
// Field names follow the firmware's JSON exactly (`rfidTag`,
// `fingerprintID`, `hasNewNotification`, ...). The firmware is an
// embedded device with a hand-rolled JSON layer, so deserialization is
// lenient where it has been observed to vary: timestamps arrive as
// either a decimal string or an integer, and unknown status strings
// decode to catch-all variants instead of failing the whole poll.

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};

// ── Fingerprint registry ─────────────────────────────────────────────

/// Occupancy of a single fingerprint slot on the sensor.
///
/// The firmware only reports occupied slots and spells them `"stored"`;
/// anything unrecognized is treated as empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SlotStatus {
    #[serde(rename = "stored")]
    Occupied,
    #[serde(other)]
    Empty,
}

/// One entry in the peripheral's fingerprint registry.
///
/// Valid ids are 1..=127 (sensor library limit).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FingerprintSlot {
    pub id: u8,
    pub status: SlotStatus,
}

/// Response envelope for `GET /fingerprints`.
#[derive(Debug, Clone, Deserialize)]
pub struct FingerprintsResponse {
    #[serde(default)]
    pub fingerprints: Vec<FingerprintSlot>,
}

// ── Live scan events ─────────────────────────────────────────────────

/// Outcome of a single scan as reported by the peripheral.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanStatus {
    Scanning,
    Verifying,
    Success,
    Denied,
    Timeout,
    #[serde(other)]
    Unknown,
}

/// A single scan/verification occurrence reported by the peripheral.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanEvent {
    /// Epoch milliseconds. The firmware serializes this as a decimal
    /// string; integers are accepted too.
    #[serde(deserialize_with = "millis_from_string_or_int")]
    pub timestamp: i64,
    #[serde(rename = "rfidTag")]
    pub tag_id: String,
    #[serde(rename = "fingerprintID", default)]
    pub slot_id: Option<u8>,
    pub status: ScanStatus,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub server_response: Option<String>,
}

/// Response envelope for `GET /live-notifications`.
///
/// `recent_notifications` is the peripheral's bounded most-recent-first
/// log and is authoritative -- the local copy is always replaced
/// wholesale, never merged.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationPoll {
    #[serde(default)]
    pub has_new_notification: bool,
    #[serde(default)]
    pub notification: Option<ScanEvent>,
    #[serde(default)]
    pub recent_notifications: Option<Vec<ScanEvent>>,
}

// ── Device status ────────────────────────────────────────────────────

/// Diagnostics from `GET /status`.
///
/// Reachability only requires any 2xx; these fields are advisory
/// display data and all optional.
#[derive(Debug, Clone, Deserialize)]
pub struct DeviceStatus {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub fingerprint_sensor: Option<bool>,
    #[serde(default)]
    pub attendance_mode: Option<bool>,
    #[serde(default)]
    pub ip: Option<String>,
    #[serde(default)]
    pub free_heap: Option<u64>,
    #[serde(default)]
    pub uptime: Option<u64>,
}

// ── Tunnel agent ─────────────────────────────────────────────────────

/// One active tunnel reported by the local tunnel agent.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TunnelDescriptor {
    pub public_url: String,
    pub proto: String,
}

/// Response envelope for the agent's `GET /api/tunnels`.
#[derive(Debug, Clone, Deserialize)]
pub struct TunnelList {
    #[serde(default)]
    pub tunnels: Vec<TunnelDescriptor>,
}

// ── Helpers ──────────────────────────────────────────────────────────

fn millis_from_string_or_int<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Int(i64),
        Str(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Int(v) => Ok(v),
        Raw::Str(s) => s
            .trim()
            .parse::<i64>()
            .map_err(|e| de::Error::custom(format!("invalid timestamp {s:?}: {e}"))),
    }
}
