//! Console-side view of the remote display's health.
//!
//! Folds status and heartbeat messages into the liveness tracker and keeps
//! the last heartbeat around so the operator can ask what the display was
//! doing when it was last heard from.

use rankcast_core::envelope::{HeartbeatRecord, StatusMessage};
use rankcast_core::liveness::{LinkStatus, LivenessTracker, DEFAULT_TIMEOUT};
use rankcast_core::topics::TopicKind;
use std::time::Instant;
use tracing::{debug, warn};

pub struct StatusBoard {
    liveness: LivenessTracker,
    last_heartbeat: Option<HeartbeatRecord>,
    last_status: Option<StatusMessage>,
}

impl Default for StatusBoard {
    fn default() -> Self {
        Self::new()
    }
}

impl StatusBoard {
    pub fn new() -> Self {
        Self {
            liveness: LivenessTracker::new(DEFAULT_TIMEOUT),
            last_heartbeat: None,
            last_status: None,
        }
    }

    /// Feeds one inbound message. Returns the parsed status when the payload
    /// was a status message, so the main loop can react to `display_ready`.
    pub fn on_message(
        &mut self,
        kind: TopicKind,
        payload: &[u8],
        now: Instant,
    ) -> Option<StatusMessage> {
        match kind {
            TopicKind::Status => match serde_json::from_slice::<StatusMessage>(payload) {
                Ok(status) => {
                    self.liveness.on_status(&status.status, now);
                    self.last_status = Some(status.clone());
                    Some(status)
                }
                Err(e) => {
                    warn!("undecodable status payload: {e}");
                    None
                }
            },
            TopicKind::Heartbeat => {
                match serde_json::from_slice::<HeartbeatRecord>(payload) {
                    Ok(hb) => {
                        debug!(client = hb.client_id, status = hb.display_status, "heartbeat");
                        self.liveness.on_heartbeat(now);
                        self.last_heartbeat = Some(hb);
                    }
                    Err(e) => warn!("undecodable heartbeat payload: {e}"),
                }
                None
            }
            _ => None,
        }
    }

    pub fn check(&mut self, now: Instant) -> LinkStatus {
        self.liveness.check(now)
    }

    pub fn status(&self) -> LinkStatus {
        self.liveness.status()
    }

    /// One-line summary for the operator's `status` command.
    pub fn describe(&self) -> String {
        let link = match self.liveness.status() {
            LinkStatus::Offline => "offline",
            LinkStatus::Online => "online",
            LinkStatus::Timeout => "timed out",
        };
        match &self.last_heartbeat {
            Some(hb) => format!(
                "display {} | {} | background {} | v{} | up {:.0}s",
                link, hb.display_status, hb.current_background, hb.client_version, hb.uptime
            ),
            None => format!("display {} | no heartbeat yet", link),
        }
    }
}
