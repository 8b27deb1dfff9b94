//! MQTT transport link shared by both processes.
//!
//! rumqttc's event loop runs on its own spawned task; nothing downstream is
//! touched from there. Every inbound event crosses to the owning process
//! through an unbounded channel drained by its main loop, which is the only
//! place state is mutated.

use crate::config::BrokerConfig;
use crate::envelope::StatusMessage;
use crate::error::ProtocolError;
use crate::identity::RuntimeIdentity;
use crate::topics::{TopicKind, TopicRegistry};
use rumqttc::{AsyncClient, Event, Incoming, MqttOptions, QoS};
use serde::Serialize;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkRole {
    /// Subscribes to every command-topic form and announces itself with a
    /// `status=online` publish on each (re)connect.
    Display,
    /// Subscribes to status and heartbeat only.
    Console,
}

#[derive(Debug)]
pub enum LinkEvent {
    Message { topic: String, payload: Vec<u8> },
    Connected,
    Disconnected,
}

pub fn subscriptions(role: LinkRole, registry: &TopicRegistry) -> Vec<String> {
    match role {
        LinkRole::Display => registry.display_subscriptions(),
        LinkRole::Console => registry.console_subscriptions(),
    }
}

pub struct MqttLink {
    client: AsyncClient,
}

impl MqttLink {
    /// Connects and spawns the event-loop task. Returns the link (for
    /// publishing) and the channel the main loop drains.
    pub fn connect(
        identity: &RuntimeIdentity,
        registry: &TopicRegistry,
        cfg: &BrokerConfig,
        role: LinkRole,
    ) -> (Self, mpsc::UnboundedReceiver<LinkEvent>) {
        let side = match role {
            LinkRole::Display => "display",
            LinkRole::Console => "console",
        };
        let mqtt_id = format!("rankcast-{}-{}", side, identity.client_id.as_str());
        let mut opts = MqttOptions::new(&mqtt_id, &cfg.host, cfg.port);
        opts.set_keep_alive(cfg.keepalive());
        opts.set_clean_session(true);

        let (client, eventloop) = AsyncClient::new(opts, 10);
        let (tx, rx) = mpsc::unbounded_channel();

        tokio::spawn(run_event_loop(
            eventloop,
            client.clone(),
            tx,
            subscriptions(role, registry),
            registry.base(TopicKind::Status),
            identity.client_id.as_str().to_string(),
            role,
            cfg.reconnect_delay(),
            cfg.max_reconnect_attempts,
        ));

        (Self { client }, rx)
    }

    pub async fn publish(&self, topic: &str, payload: Vec<u8>) -> Result<(), ProtocolError> {
        self.client
            .publish(topic, QoS::AtLeastOnce, false, payload)
            .await?;
        Ok(())
    }

    pub async fn publish_json<T: Serialize>(
        &self,
        topic: &str,
        payload: &T,
    ) -> Result<(), ProtocolError> {
        self.publish(topic, serde_json::to_vec(payload)?).await
    }
}

/// True when the event was delivered. False means the receiving side is
/// gone (the owner dialed a new link or shut down) and the loop must stop,
/// closing the broker session with it — otherwise every redial leaks an
/// orphaned task still holding the old session.
fn forward(tx: &mpsc::UnboundedSender<LinkEvent>, event: LinkEvent) -> bool {
    tx.send(event).is_ok()
}

#[allow(clippy::too_many_arguments)]
async fn run_event_loop(
    mut eventloop: rumqttc::EventLoop,
    client: AsyncClient,
    tx: mpsc::UnboundedSender<LinkEvent>,
    topics: Vec<String>,
    status_topic: String,
    client_id: String,
    role: LinkRole,
    reconnect_delay: std::time::Duration,
    max_attempts: u32,
) {
    let mut attempts = 0u32;
    let mut connected = false;

    loop {
        match eventloop.poll().await {
            Ok(Event::Incoming(Incoming::ConnAck(_))) => {
                info!("connected to MQTT broker");
                attempts = 0;
                connected = true;
                if !forward(&tx, LinkEvent::Connected) {
                    info!("event receiver dropped, closing link");
                    return;
                }

                // peers only learn we exist through the resubscribe + online
                // publish that follows every reconnect
                for topic in &topics {
                    if let Err(e) = client.subscribe(topic, QoS::AtLeastOnce).await {
                        error!(topic, "subscribe failed: {e}");
                    } else {
                        debug!(topic, "subscribed");
                    }
                }
                if role == LinkRole::Display {
                    let status =
                        StatusMessage::new("online", "Display connected and ready", &client_id);
                    match serde_json::to_vec(&status) {
                        Ok(bytes) => {
                            if let Err(e) =
                                client.publish(&status_topic, QoS::AtLeastOnce, false, bytes).await
                            {
                                error!("failed to publish online status: {e}");
                            }
                        }
                        Err(e) => error!("failed to encode online status: {e}"),
                    }
                }
            }
            Ok(Event::Incoming(Incoming::Publish(publish))) => {
                let event = LinkEvent::Message {
                    topic: publish.topic,
                    payload: publish.payload.to_vec(),
                };
                if !forward(&tx, event) {
                    info!("event receiver dropped, closing link");
                    return;
                }
            }
            Ok(_) => {}
            Err(e) => {
                if connected {
                    connected = false;
                    if !forward(&tx, LinkEvent::Disconnected) {
                        info!("event receiver dropped, closing link");
                        return;
                    }
                }
                attempts += 1;
                if attempts > max_attempts {
                    // give up silently; the operator triggers reconnects
                    // manually from here on
                    error!("MQTT reconnect failed {max_attempts} times, giving up");
                    return;
                }
                warn!(attempt = attempts, max = max_attempts, "MQTT connection error: {e}");
                tokio::time::sleep(reconnect_delay).await;
            }
        }
    }
}
