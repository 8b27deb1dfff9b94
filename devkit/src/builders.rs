//! Builders for the JSON payloads the operator console publishes, so tests
//! feed the display exactly what a real console would.

use serde_json::{json, Value};

fn epoch_secs() -> f64 {
    chrono::Utc::now().timestamp_micros() as f64 / 1_000_000.0
}

pub struct PayloadBuilder;

impl PayloadBuilder {
    pub fn open_display(monitor_index: u32, background_folder: &str, target: &str) -> Value {
        json!({
            "action": "open_display",
            "monitor_index": monitor_index,
            "background_folder": background_folder,
            "target": target,
            "timestamp": epoch_secs(),
        })
    }

    pub fn close_display(target: &str) -> Value {
        json!({ "action": "close_display", "target": target, "timestamp": epoch_secs() })
    }

    pub fn toggle_fullscreen(target: &str) -> Value {
        json!({ "action": "toggle_fullscreen", "target": target, "timestamp": epoch_secs() })
    }

    pub fn switch_monitor(monitor_index: u32, target: &str) -> Value {
        json!({
            "action": "switch_monitor",
            "monitor_index": monitor_index,
            "target": target,
            "timestamp": epoch_secs(),
        })
    }

    pub fn show_background(background_id: &str, target: &str) -> Value {
        json!({
            "action": "show_background",
            "background_id": background_id,
            "target": target,
        })
    }

    pub fn ranking(round: &str, entries: &[(&str, &str)], target: &str) -> Value {
        let mut payload = json!({
            "round": round,
            "positions": { "round": "1286,917" },
            "font_settings": {
                "font_name": "Arial",
                "rank_font_size": 40,
                "round_font_size": 48,
                "color": "white",
            },
            "target": target,
        });
        for (rank, member) in entries {
            payload[rank] = json!(member);
        }
        payload
    }

    pub fn heartbeat(client_id: &str, display_status: &str, current_background: &str) -> Value {
        json!({
            "timestamp": epoch_secs(),
            "client_id": client_id,
            "display_status": display_status,
            "current_background": current_background,
            "client_version": "0.1.0",
            "uptime": 12.5,
        })
    }
}
