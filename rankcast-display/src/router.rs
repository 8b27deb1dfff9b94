//! Classifies inbound MQTT messages into commands.
//!
//! Runs after the transport handed the message over the channel: duplicate
//! suppression first, then tolerant JSON decoding, target filtering and
//! topic-kind dispatch. Anything malformed or meant for another display is
//! dropped here without a status publish.

use crate::state::Command;
use rankcast_core::dedup::MessageDeduplicator;
use rankcast_core::envelope::{str_field, target_matches, u32_field};
use rankcast_core::topics::{TopicKind, TopicRegistry};
use serde_json::Value;
use std::time::Instant;
use tracing::{debug, warn};

pub struct CommandRouter {
    registry: TopicRegistry,
    client_id: String,
    dedup: MessageDeduplicator,
}

impl CommandRouter {
    pub fn new(registry: TopicRegistry, client_id: &str) -> Self {
        Self {
            registry,
            client_id: client_id.to_string(),
            dedup: MessageDeduplicator::new(),
        }
    }

    /// Returns the command to execute, or None when the message was a
    /// duplicate, malformed, foreign-topic or targeted at someone else.
    pub fn route(&mut self, topic: &str, payload: &[u8], now: Instant) -> Option<Command> {
        let kind = match self.registry.classify(topic) {
            Some(kind) => kind,
            None => {
                debug!(topic, "ignoring message on foreign topic");
                return None;
            }
        };

        if !self.dedup.observe(kind, payload, now) {
            return None;
        }

        let value: Value = match serde_json::from_slice(payload) {
            Ok(v) => v,
            Err(e) => {
                warn!(topic, "dropping malformed payload: {e}");
                return None;
            }
        };

        if !target_matches(&value, &self.client_id) {
            debug!(
                topic,
                target = str_field(&value, "target", ""),
                "ignoring message for another display"
            );
            return None;
        }

        match kind {
            TopicKind::Commands => self.general_command(&value),
            TopicKind::Ranking => Some(Command::Ranking(value)),
            TopicKind::Final => Some(Command::Final(value)),
            TopicKind::Display => self.display_command(&value),
            TopicKind::Background => {
                let folder = str_field(&value, "folder_path", "");
                if folder.is_empty() {
                    warn!("background command without folder_path");
                    return None;
                }
                Some(Command::SetBackgroundFolder { folder_path: folder.to_string() })
            }
            // we publish these, inbound copies are noise
            TopicKind::Status | TopicKind::Heartbeat => None,
        }
    }

    fn general_command(&self, value: &Value) -> Option<Command> {
        match str_field(value, "action", "") {
            "open_display" => Some(Command::OpenDisplay {
                monitor_index: u32_field(value, "monitor_index", 0),
                background_folder: str_field(value, "background_folder", "").to_string(),
            }),
            "close_display" => Some(Command::CloseDisplay),
            "toggle_fullscreen" => Some(Command::ToggleFullscreen),
            "switch_monitor" => Some(Command::SwitchMonitor {
                monitor_index: u32_field(value, "monitor_index", 0),
            }),
            "ping" => Some(Command::Ping),
            other => {
                warn!(action = other, "unknown general command");
                None
            }
        }
    }

    fn display_command(&self, value: &Value) -> Option<Command> {
        match str_field(value, "action", "") {
            "show_background" => {
                let id = str_field(value, "background_id", "");
                if id.is_empty() {
                    warn!("show_background without background_id");
                    return None;
                }
                Some(Command::ShowBackground { background_id: id.to_string() })
            }
            other => {
                warn!(action = other, "unknown display command");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rankcast_core::identity::{ClientId, RuntimeIdentity, SessionId};
    use std::time::Duration;

    fn router() -> CommandRouter {
        let identity = RuntimeIdentity::new(
            SessionId::from_string("abc12345"),
            ClientId::sanitize("host-a"),
        );
        CommandRouter::new(TopicRegistry::new(&identity), "host-a")
    }

    #[test]
    fn routes_general_commands() {
        let mut r = router();
        let payload =
            br#"{"action":"open_display","monitor_index":1,"background_folder":"/bg","target":"all"}"#;
        let cmd = r.route("rankcast_abc12345/commands", payload, Instant::now()).unwrap();
        assert_eq!(
            cmd,
            Command::OpenDisplay { monitor_index: 1, background_folder: "/bg".to_string() }
        );
    }

    #[test]
    fn missing_fields_get_defaults() {
        let mut r = router();
        let cmd = r
            .route("rankcast_abc12345/commands", br#"{"action":"switch_monitor"}"#, Instant::now())
            .unwrap();
        assert_eq!(cmd, Command::SwitchMonitor { monitor_index: 0 });
    }

    #[test]
    fn foreign_target_is_silently_ignored() {
        let mut r = router();
        let payload = br#"{"action":"close_display","target":"host-b"}"#;
        assert!(r.route("rankcast_abc12345/commands", payload, Instant::now()).is_none());
        // targeted at us or broadcast both pass
        let t1 = Instant::now() + Duration::from_secs(5);
        let ours = br#"{"action":"close_display","target":"host-a"}"#;
        assert!(r.route("rankcast_abc12345/commands/host-a", ours, t1).is_some());
    }

    #[test]
    fn duplicate_across_topic_variants_is_suppressed() {
        let mut r = router();
        let payload = br#"{"action":"toggle_fullscreen","target":"all"}"#;
        let t0 = Instant::now();
        assert!(r.route("rankcast_abc12345/commands", payload, t0).is_some());
        assert!(r
            .route("rankcast_abc12345/commands/all", payload, t0 + Duration::from_millis(50))
            .is_none());
        // well past the window the same command is a new command
        assert!(r
            .route("rankcast_abc12345/commands", payload, t0 + Duration::from_secs(2))
            .is_some());
    }

    #[test]
    fn malformed_json_and_unknown_actions_drop() {
        let mut r = router();
        let t0 = Instant::now();
        assert!(r.route("rankcast_abc12345/commands", b"not json", t0).is_none());
        assert!(r
            .route("rankcast_abc12345/commands", br#"{"action":"reboot"}"#, t0)
            .is_none());
        assert!(r.route("other_root/commands", br#"{"action":"ping"}"#, t0).is_none());
    }

    #[test]
    fn ranking_topic_carries_payload_through() {
        let mut r = router();
        let payload = br#"{"round":"3","1st":"60050","target":"all"}"#;
        match r.route("rankcast_abc12345/ranking/all", payload, Instant::now()) {
            Some(Command::Ranking(v)) => assert_eq!(v["round"], "3"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn display_topic_requires_background_id() {
        let mut r = router();
        let t0 = Instant::now();
        let cmd = r
            .route(
                "rankcast_abc12345/display",
                br#"{"action":"show_background","background_id":"02"}"#,
                t0,
            )
            .unwrap();
        assert_eq!(cmd, Command::ShowBackground { background_id: "02".to_string() });
        assert!(r
            .route("rankcast_abc12345/display", br#"{"action":"show_background"}"#, t0)
            .is_none());
    }
}
