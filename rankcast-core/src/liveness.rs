//! Heartbeat-driven liveness view of the remote display.
//!
//! There is no explicit offline signal beyond a best-effort final status
//! publish, so offline is derived from heartbeat silence. A `status=online`
//! message is stronger evidence than heartbeat timing and flips the state
//! back immediately.

use std::time::{Duration, Instant};

/// Console-side default; the display tolerates a shorter silence for its own
/// connection indicator.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);
pub const CHECK_INTERVAL: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkStatus {
    /// Never heard from the peer.
    Offline,
    Online,
    /// Was online, heartbeats stopped for longer than the timeout.
    Timeout,
}

#[derive(Debug)]
pub struct LivenessTracker {
    timeout: Duration,
    last_heartbeat: Option<Instant>,
    status: LinkStatus,
}

impl LivenessTracker {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            last_heartbeat: None,
            status: LinkStatus::Offline,
        }
    }

    pub fn on_heartbeat(&mut self, now: Instant) {
        self.last_heartbeat = Some(now);
        self.status = LinkStatus::Online;
    }

    /// Any status message proves the peer is alive; an explicit `offline`
    /// status (clean shutdown) drops it immediately.
    pub fn on_status(&mut self, status_kind: &str, now: Instant) {
        if status_kind == "offline" {
            self.status = LinkStatus::Offline;
        } else {
            self.last_heartbeat = Some(now);
            self.status = LinkStatus::Online;
        }
    }

    /// Periodic elapsed-time check; call roughly every [`CHECK_INTERVAL`].
    pub fn check(&mut self, now: Instant) -> LinkStatus {
        if self.status == LinkStatus::Online {
            if let Some(last) = self.last_heartbeat {
                if now.duration_since(last) > self.timeout {
                    self.status = LinkStatus::Timeout;
                }
            }
        }
        self.status
    }

    pub fn status(&self) -> LinkStatus {
        self.status
    }
}
