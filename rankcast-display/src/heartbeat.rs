//! Periodic heartbeat publishing.
//!
//! While connected, the display reports every [`HEARTBEAT_INTERVAL`] what it
//! is showing; the console derives online/offline from the silence between
//! these, so there is no explicit "going offline" signal to get right.

use rankcast_core::envelope::{epoch_secs, HeartbeatRecord};
use std::time::{Duration, Instant};

pub const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(30);
pub const CLIENT_VERSION: &str = env!("CARGO_PKG_VERSION");

pub fn build_heartbeat(
    client_id: &str,
    display_status: &str,
    current_background: &str,
    started: Instant,
) -> HeartbeatRecord {
    HeartbeatRecord {
        timestamp: epoch_secs(),
        client_id: client_id.to_string(),
        display_status: display_status.to_string(),
        current_background: current_background.to_string(),
        client_version: CLIENT_VERSION.to_string(),
        uptime: started.elapsed().as_secs_f64(),
    }
}
