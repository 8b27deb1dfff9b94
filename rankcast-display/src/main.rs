//! Rankcast display agent.
//!
//! Runs unattended on the machine driving the presentation monitor:
//! - connects to the shared broker and announces itself
//! - routes inbound commands into the display state machine
//! - reports every outcome as a status publish
//! - heartbeats while connected so the console can track liveness

use anyhow::{Context, Result};
use rankcast_core::config::{load_or_create_session, BrokerConfig};
use rankcast_core::envelope::StatusMessage;
use rankcast_core::identity::{ClientId, RuntimeIdentity};
use rankcast_core::topics::{TopicKind, TopicRegistry};
use rankcast_core::transport::{LinkEvent, LinkRole, MqttLink};
use rankcast_display::heartbeat::{build_heartbeat, HEARTBEAT_INTERVAL};
use rankcast_display::router::CommandRouter;
use rankcast_display::state::DisplayStateMachine;
use rankcast_display::surface::HeadlessSurface;
use std::path::PathBuf;
use std::time::Instant;
use tokio::time::interval;
use tracing::{error, info, warn};

fn env_path(var: &str, default: &str) -> PathBuf {
    std::env::var(var).unwrap_or_else(|_| default.to_string()).into()
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().init();

    let session = load_or_create_session(&env_path("RANKCAST_SESSION_FILE", "rankcast_session.json"))
        .context("failed to load session id")?;
    let broker = BrokerConfig::load(&env_path("RANKCAST_BROKER_CONFIG", "rankcast_broker.json"));
    let identity = RuntimeIdentity::new(session, ClientId::from_hostname());
    info!(
        session = identity.session_id.as_str(),
        client = identity.client_id.as_str(),
        "starting rankcast display agent"
    );

    let registry = TopicRegistry::new(&identity);
    let status_topic = registry.base(TopicKind::Status);
    let heartbeat_topic = registry.base(TopicKind::Heartbeat);

    let (link, mut events) = MqttLink::connect(&identity, &registry, &broker, LinkRole::Display);

    let default_folder = std::env::var("RANKCAST_BACKGROUND_FOLDER").ok().map(PathBuf::from);
    let mut machine =
        DisplayStateMachine::new(HeadlessSurface::new(), identity.client_id.as_str(), default_folder);
    let mut router = CommandRouter::new(registry.clone(), identity.client_id.as_str());

    let started = Instant::now();
    let mut connected = false;
    let mut heartbeat_timer = interval(HEARTBEAT_INTERVAL);

    loop {
        tokio::select! {
            event = events.recv() => {
                match event {
                    Some(LinkEvent::Message { topic, payload }) => {
                        if let Some(command) = router.route(&topic, &payload, Instant::now()) {
                            for status in machine.apply(command, Instant::now()) {
                                if let Err(e) = link.publish_json(&status_topic, &status).await {
                                    error!("failed to publish status: {e}");
                                }
                            }
                        }
                    }
                    Some(LinkEvent::Connected) => {
                        connected = true;
                    }
                    Some(LinkEvent::Disconnected) => {
                        connected = false;
                        warn!("broker connection lost, supervisor is retrying");
                    }
                    None => {
                        // transport gave up; nothing left to drive us
                        error!("transport channel closed, shutting down");
                        break;
                    }
                }
            }
            _ = heartbeat_timer.tick() => {
                if connected {
                    let hb = build_heartbeat(
                        identity.client_id.as_str(),
                        machine.display_status(),
                        machine.current_background(),
                        started,
                    );
                    if let Err(e) = link.publish_json(&heartbeat_topic, &hb).await {
                        error!("failed to publish heartbeat: {e}");
                    }
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("shutting down");
                // best effort; the console falls back to heartbeat timeout
                // if this publish is lost
                let bye = StatusMessage::new("offline", "Display shutting down", identity.client_id.as_str());
                let _ = link.publish_json(&status_topic, &bye).await;
                break;
            }
        }
    }

    Ok(())
}
