//! Payload shapes on the wire and tolerant field access.
//!
//! Outbound payloads are serde structs so the console always sends complete,
//! well-formed JSON. Inbound payloads are read through `Value` accessors that
//! substitute a documented default when a field is absent or the wrong type:
//! a remote peer may be running any ancient version of the console and the
//! display must not fall over on its messages.

use crate::error::ProtocolError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Fallback drawing coordinate used whenever a position string fails to
/// parse. Matches the round-label position the original layout shipped with.
pub const FALLBACK_POSITION: (i32, i32) = (1286, 917);

/// Seconds since the Unix epoch, as sent in status/heartbeat payloads.
pub fn epoch_secs() -> f64 {
    chrono::Utc::now().timestamp_micros() as f64 / 1_000_000.0
}

/// Parses `"x,y"` into integers. The one place coordinate strings are
/// decoded; callers substitute [`FALLBACK_POSITION`] on Err.
pub fn parse_coordinate_pair(s: &str) -> Result<(i32, i32), ProtocolError> {
    let mut parts = s.splitn(2, ',');
    let x = parts.next().map(str::trim).unwrap_or("");
    let y = parts.next().map(str::trim).unwrap_or("");
    match (x.parse::<i32>(), y.parse::<i32>()) {
        (Ok(x), Ok(y)) => Ok((x, y)),
        _ => Err(ProtocolError::InvalidCoordinate(s.to_string())),
    }
}

pub fn format_coordinate_pair(x: i32, y: i32) -> String {
    format!("{},{}", x, y)
}

// --- outbound payloads (console -> display) ---

#[derive(Debug, Clone, Serialize)]
pub struct GeneralCommand {
    pub action: String,
    pub target: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub monitor_index: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background_folder: Option<String>,
    pub timestamp: f64,
}

impl GeneralCommand {
    pub fn new(action: &str, target: &str) -> Self {
        Self {
            action: action.to_string(),
            target: target.to_string(),
            monitor_index: None,
            background_folder: None,
            timestamp: epoch_secs(),
        }
    }

    pub fn with_monitor(mut self, index: u32) -> Self {
        self.monitor_index = Some(index);
        self
    }

    pub fn with_background_folder(mut self, folder: &str) -> Self {
        self.background_folder = Some(folder.to_string());
        self
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RankingPayload {
    pub round: String,
    #[serde(flatten)]
    pub ranks: HashMap<String, String>,
    pub positions: HashMap<String, String>,
    pub font_settings: FontSettings,
    pub target: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct FinalPayload {
    pub winner: String,
    pub second: String,
    pub third: String,
    pub fourth: String,
    pub fifth: String,
    pub positions: HashMap<String, String>,
    pub font_settings: FontSettings,
    pub target: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FontSettings {
    #[serde(default)]
    pub font_name: String,
    #[serde(default)]
    pub rank_font_size: u32,
    #[serde(default)]
    pub round_font_size: u32,
    #[serde(default)]
    pub font_size: u32,
    #[serde(default)]
    pub color: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct DisplayPayload {
    pub action: String,
    pub background_id: String,
    pub target: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct BackgroundPayload {
    pub folder_path: String,
    pub target: String,
}

// --- display -> console ---

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusMessage {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub timestamp: f64,
    #[serde(default)]
    pub client_id: String,
}

impl StatusMessage {
    pub fn new(status: &str, message: impl Into<String>, client_id: &str) -> Self {
        Self {
            status: status.to_string(),
            message: message.into(),
            timestamp: epoch_secs(),
            client_id: client_id.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeartbeatRecord {
    #[serde(default)]
    pub timestamp: f64,
    #[serde(default)]
    pub client_id: String,
    #[serde(default)]
    pub display_status: String,
    #[serde(default)]
    pub current_background: String,
    #[serde(default)]
    pub client_version: String,
    #[serde(default)]
    pub uptime: f64,
}

// --- tolerant inbound access ---

/// String field with default; non-string values fall back too.
pub fn str_field<'a>(value: &'a Value, key: &str, default: &'a str) -> &'a str {
    value.get(key).and_then(Value::as_str).unwrap_or(default)
}

/// Unsigned integer field with default; floats are truncated, anything else
/// falls back.
pub fn u32_field(value: &Value, key: &str, default: u32) -> u32 {
    match value.get(key) {
        Some(Value::Number(n)) => n
            .as_u64()
            .map(|v| v as u32)
            .or_else(|| n.as_f64().map(|v| v as u32))
            .unwrap_or(default),
        _ => default,
    }
}

/// Target filter: a payload is for us when it carries no `target`, targets
/// `"all"`, or names our client id.
pub fn target_matches(value: &Value, client_id: &str) -> bool {
    match value.get("target").and_then(Value::as_str) {
        None => true,
        Some(t) => t == crate::topics::TARGET_ALL || t == client_id,
    }
}
