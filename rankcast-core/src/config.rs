//! Broker settings and the persisted session id.
//!
//! The session id must be the same across runs and across both processes of
//! a deployment, so it lives in a small JSON file next to the binary; it is
//! generated once and then reused.

use crate::error::ProtocolError;
use crate::identity::SessionId;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::{info, warn};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrokerConfig {
    pub host: String,
    pub port: u16,
    #[serde(default = "default_keepalive")]
    pub keepalive_secs: u64,
    #[serde(default = "default_reconnect_delay")]
    pub reconnect_delay_secs: u64,
    #[serde(default = "default_max_attempts")]
    pub max_reconnect_attempts: u32,
}

fn default_keepalive() -> u64 {
    60
}
fn default_reconnect_delay() -> u64 {
    5
}
fn default_max_attempts() -> u32 {
    10
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 1883,
            keepalive_secs: default_keepalive(),
            reconnect_delay_secs: default_reconnect_delay(),
            max_reconnect_attempts: default_max_attempts(),
        }
    }
}

impl BrokerConfig {
    pub fn keepalive(&self) -> Duration {
        Duration::from_secs(self.keepalive_secs)
    }

    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_secs(self.reconnect_delay_secs)
    }

    pub fn load(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(txt) => serde_json::from_str(&txt).unwrap_or_else(|e| {
                warn!(path = %path.display(), "invalid broker config, using defaults: {e}");
                Self::default()
            }),
            Err(_) => {
                info!(path = %path.display(), "no broker config, using defaults");
                Self::default()
            }
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct SessionFile {
    session_id: String,
}

/// Loads the shared session id, creating and persisting a fresh one on first
/// run. An unreadable file is replaced rather than treated as fatal.
pub fn load_or_create_session(path: &Path) -> Result<SessionId, ProtocolError> {
    if let Ok(txt) = std::fs::read_to_string(path) {
        if let Ok(file) = serde_json::from_str::<SessionFile>(&txt) {
            if !file.session_id.is_empty() {
                return Ok(SessionId::from_string(file.session_id));
            }
        }
        warn!(path = %path.display(), "unreadable session file, regenerating");
    }

    let session = SessionId::generate();
    let file = SessionFile {
        session_id: session.as_str().to_string(),
    };
    std::fs::write(path, serde_json::to_string_pretty(&file)?)?;
    info!(session = session.as_str(), "created new session id");
    Ok(session)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_id_is_stable_across_loads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        let first = load_or_create_session(&path).unwrap();
        let second = load_or_create_session(&path).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn corrupt_session_file_is_regenerated() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(&path, "not json").unwrap();
        let id = load_or_create_session(&path).unwrap();
        assert_eq!(id.as_str().len(), 8);
        // and the regenerated id persists
        assert_eq!(load_or_create_session(&path).unwrap(), id);
    }

    #[test]
    fn broker_config_defaults_on_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = BrokerConfig::load(&dir.path().join("nope.json"));
        assert_eq!(cfg.host, "localhost");
        assert_eq!(cfg.port, 1883);
        assert_eq!(cfg.max_reconnect_attempts, 10);
    }

    #[test]
    fn broker_config_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broker.json");
        std::fs::write(&path, r#"{"host":"broker.lan","port":8883}"#).unwrap();
        let cfg = BrokerConfig::load(&path);
        assert_eq!(cfg.host, "broker.lan");
        assert_eq!(cfg.port, 8883);
        assert_eq!(cfg.reconnect_delay_secs, 5);
    }
}
