//! Persisted operator settings.
//!
//! A flat JSON file of last-used values so the operator does not retype the
//! background folder and layout tweaks every evening. Read once at startup,
//! written back on change and on exit; a missing or corrupt file just means
//! defaults.

use anyhow::{Context, Result};
use rankcast_core::envelope::{format_coordinate_pair, FontSettings, FALLBACK_POSITION};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use tracing::warn;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsoleSettings {
    pub background_folder: String,
    pub monitor_index: u32,
    /// Client id of the display this console drives, or `"all"`.
    pub target: String,
    /// Named drawing positions as `"x,y"` strings, e.g. `"round"`.
    pub positions: HashMap<String, String>,
    pub font_name: String,
    pub rank_font_size: u32,
    pub round_font_size: u32,
    pub color: String,
}

impl Default for ConsoleSettings {
    fn default() -> Self {
        let mut positions = HashMap::new();
        positions.insert(
            "round".to_string(),
            format_coordinate_pair(FALLBACK_POSITION.0, FALLBACK_POSITION.1),
        );
        Self {
            background_folder: String::new(),
            monitor_index: 0,
            target: "all".to_string(),
            positions,
            font_name: "Arial".to_string(),
            rank_font_size: 40,
            round_font_size: 48,
            color: "white".to_string(),
        }
    }
}

impl ConsoleSettings {
    pub fn load(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(txt) => serde_json::from_str(&txt).unwrap_or_else(|e| {
                warn!(path = %path.display(), "invalid settings file, using defaults: {e}");
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let txt = serde_json::to_string_pretty(self)?;
        std::fs::write(path, txt)
            .with_context(|| format!("failed to write settings to {}", path.display()))
    }

    pub fn font_settings(&self) -> FontSettings {
        FontSettings {
            font_name: self.font_name.clone(),
            rank_font_size: self.rank_font_size,
            round_font_size: self.round_font_size,
            font_size: self.rank_font_size,
            color: self.color.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_carry_the_fallback_round_position() {
        let s = ConsoleSettings::default();
        assert_eq!(s.positions.get("round").unwrap(), "1286,917");
        assert_eq!(s.target, "all");
    }

    #[test]
    fn save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");

        let mut s = ConsoleSettings::default();
        s.background_folder = "/srv/backgrounds".to_string();
        s.monitor_index = 2;
        s.save(&path).unwrap();

        let loaded = ConsoleSettings::load(&path);
        assert_eq!(loaded.background_folder, "/srv/backgrounds");
        assert_eq!(loaded.monitor_index, 2);
        assert_eq!(loaded.font_name, "Arial");
    }

    #[test]
    fn partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{"monitor_index": 1}"#).unwrap();
        let loaded = ConsoleSettings::load(&path);
        assert_eq!(loaded.monitor_index, 1);
        assert_eq!(loaded.color, "white");
    }

    #[test]
    fn corrupt_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "{{{{").unwrap();
        let loaded = ConsoleSettings::load(&path);
        assert_eq!(loaded.monitor_index, 0);
    }
}
