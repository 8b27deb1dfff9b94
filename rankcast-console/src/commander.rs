//! Command sender.
//!
//! Every operator action goes through [`Commander`]: it builds the payload,
//! publishes it on the right topic form and mirrors the action into the
//! monitor state cache. Replay sends after a monitor switch use the `send_*`
//! methods, which skip the cache on purpose — replaying a cached fullscreen
//! toggle must not record a second toggle.

use crate::settings::ConsoleSettings;
use anyhow::{bail, Result};
use rankcast_core::envelope::{
    BackgroundPayload, DisplayPayload, FinalPayload, GeneralCommand, RankingPayload,
};
use rankcast_core::error::ProtocolError;
use rankcast_core::monitors::{MonitorStateCache, ReplayStep};
use rankcast_core::parser::{parse_ranking_data, RankingRow};
use rankcast_core::topics::{TopicKind, TopicRegistry, TARGET_ALL};
use rankcast_core::transport::MqttLink;
use serde::Serialize;
use tracing::info;

/// Publish seam between the commander and the broker link, so tests capture
/// outbound traffic without a broker.
pub trait CommandSink {
    async fn publish_json<T: Serialize>(&self, topic: &str, payload: &T)
        -> Result<(), ProtocolError>;
}

impl CommandSink for MqttLink {
    async fn publish_json<T: Serialize>(
        &self,
        topic: &str,
        payload: &T,
    ) -> Result<(), ProtocolError> {
        MqttLink::publish_json(self, topic, payload).await
    }
}

/// At most this many ranks go out in one ranking payload; the layout has ten
/// slots.
pub const MAX_RANKS: usize = 10;

fn ordinal(position: u32) -> String {
    match position {
        1 => "1st".to_string(),
        2 => "2nd".to_string(),
        3 => "3rd".to_string(),
        n => format!("{n}th"),
    }
}

/// Assembles a ranking payload from parsed rows. None when no row survived
/// parsing; the caller reports that instead of publishing an empty update.
pub fn build_ranking_payload(
    rows: &[RankingRow],
    settings: &ConsoleSettings,
    target: &str,
) -> Option<RankingPayload> {
    let first = rows.first()?;
    let ranks = rows
        .iter()
        .take(MAX_RANKS)
        .map(|row| (ordinal(row.position), row.member_id.clone()))
        .collect();
    Some(RankingPayload {
        round: first.round.to_string(),
        ranks,
        positions: settings.positions.clone(),
        font_settings: settings.font_settings(),
        target: target.to_string(),
    })
}

pub fn build_final_payload(
    places: &[String; 5],
    settings: &ConsoleSettings,
    target: &str,
) -> FinalPayload {
    FinalPayload {
        winner: places[0].clone(),
        second: places[1].clone(),
        third: places[2].clone(),
        fourth: places[3].clone(),
        fifth: places[4].clone(),
        positions: settings.positions.clone(),
        font_settings: settings.font_settings(),
        target: target.to_string(),
    }
}

pub struct Commander<L: CommandSink> {
    link: L,
    registry: TopicRegistry,
    cache: MonitorStateCache,
    target: String,
}

impl<L: CommandSink> Commander<L> {
    pub fn new(link: L, registry: TopicRegistry, target: String) -> Self {
        Self {
            link,
            registry,
            cache: MonitorStateCache::new(),
            target,
        }
    }

    pub fn set_link(&mut self, link: L) {
        self.link = link;
    }

    /// Broadcast targets go on the `/all` form, a named display on its
    /// targeted form. The payload carries the target either way.
    fn topic(&self, kind: TopicKind) -> String {
        if self.target == TARGET_ALL {
            self.registry.broadcast(kind)
        } else {
            self.registry.targeted(kind, &self.target)
        }
    }

    pub async fn open_display(&mut self, monitor: u32, folder: &str) -> Result<()> {
        let cmd = GeneralCommand::new("open_display", &self.target)
            .with_monitor(monitor)
            .with_background_folder(folder);
        self.link.publish_json(&self.topic(TopicKind::Commands), &cmd).await?;
        self.cache.record_open(monitor);
        info!(monitor, "sent open_display");
        Ok(())
    }

    pub async fn close_display(&mut self) -> Result<()> {
        let cmd = GeneralCommand::new("close_display", &self.target);
        self.link.publish_json(&self.topic(TopicKind::Commands), &cmd).await?;
        self.cache.record_close();
        Ok(())
    }

    pub async fn toggle_fullscreen(&mut self) -> Result<()> {
        self.send_toggle_fullscreen().await?;
        self.cache.record_fullscreen_toggle();
        Ok(())
    }

    /// Publishes the switch and returns the replay plan for the target
    /// monitor. The caller runs the plan once the new window is ready.
    pub async fn switch_monitor(&mut self, monitor: u32) -> Result<Vec<ReplayStep>> {
        let cmd = GeneralCommand::new("switch_monitor", &self.target).with_monitor(monitor);
        self.link.publish_json(&self.topic(TopicKind::Commands), &cmd).await?;
        let plan = self.cache.switch_to(monitor);
        info!(monitor, steps = plan.len(), "sent switch_monitor");
        Ok(plan)
    }

    pub async fn ping(&self) -> Result<()> {
        let cmd = GeneralCommand::new("ping", &self.target);
        self.link.publish_json(&self.topic(TopicKind::Commands), &cmd).await?;
        Ok(())
    }

    pub async fn show_background(&mut self, background_id: &str) -> Result<()> {
        self.send_show_background(background_id).await?;
        self.cache.record_background(background_id);
        Ok(())
    }

    pub async fn set_background_folder(&self, folder_path: &str) -> Result<()> {
        let payload = BackgroundPayload {
            folder_path: folder_path.to_string(),
            target: self.target.clone(),
        };
        self.link.publish_json(&self.topic(TopicKind::Background), &payload).await?;
        Ok(())
    }

    /// Parses pasted ranking text and publishes it. Errors when nothing in
    /// the paste parsed, so the operator sees the problem instead of the
    /// display silently showing an empty board.
    pub async fn apply_ranking(&mut self, raw: &str, settings: &ConsoleSettings) -> Result<usize> {
        let rows = parse_ranking_data(raw);
        let Some(payload) = build_ranking_payload(&rows, settings, &self.target) else {
            bail!("no usable ranking rows in pasted data");
        };
        self.link.publish_json(&self.topic(TopicKind::Ranking), &payload).await?;
        self.cache.record_background("01");
        info!(round = payload.round, rows = rows.len(), "sent ranking update");
        Ok(rows.len())
    }

    pub async fn apply_final(&mut self, places: &[String; 5], settings: &ConsoleSettings) -> Result<()> {
        let payload = build_final_payload(places, settings, &self.target);
        self.link.publish_json(&self.topic(TopicKind::Final), &payload).await?;
        self.cache.record_background("02");
        Ok(())
    }

    // replay-only sends, not recorded in the cache

    pub async fn send_show_background(&self, background_id: &str) -> Result<()> {
        let payload = DisplayPayload {
            action: "show_background".to_string(),
            background_id: background_id.to_string(),
            target: self.target.clone(),
        };
        self.link.publish_json(&self.topic(TopicKind::Display), &payload).await?;
        Ok(())
    }

    pub async fn send_toggle_fullscreen(&self) -> Result<()> {
        let cmd = GeneralCommand::new("toggle_fullscreen", &self.target);
        self.link.publish_json(&self.topic(TopicKind::Commands), &cmd).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rankcast_core::identity::{ClientId, RuntimeIdentity, SessionId};
    use rankcast_devkit::MockMqttClient;
    use rumqttc::QoS;
    use serde_json::Value;

    impl CommandSink for MockMqttClient {
        async fn publish_json<T: Serialize>(
            &self,
            topic: &str,
            payload: &T,
        ) -> Result<(), ProtocolError> {
            let bytes = serde_json::to_vec(payload)?;
            self.publish(topic, QoS::AtLeastOnce, false, bytes)
                .await
                .map_err(|e| ProtocolError::Transport(e.to_string()))
        }
    }

    fn commander(target: &str) -> (Commander<MockMqttClient>, MockMqttClient) {
        let identity = RuntimeIdentity::new(
            SessionId::from_string("s1234567"),
            ClientId::sanitize("console"),
        );
        let mock = MockMqttClient::new();
        let c = Commander::new(mock.clone(), TopicRegistry::new(&identity), target.to_string());
        (c, mock)
    }

    #[tokio::test]
    async fn broadcast_target_publishes_on_the_all_form() {
        let (mut c, mock) = commander("all");
        c.open_display(1, "/bg").await.unwrap();

        let messages = mock.find_messages_by_topic("rankcast_s1234567/commands/all");
        assert_eq!(messages.len(), 1);
        let payload: Value = serde_json::from_slice(&messages[0].payload).unwrap();
        assert_eq!(payload["action"], "open_display");
        assert_eq!(payload["monitor_index"], 1);
        assert_eq!(payload["background_folder"], "/bg");
        assert_eq!(payload["target"], "all");
    }

    #[tokio::test]
    async fn named_target_publishes_on_its_targeted_form() {
        let (mut c, mock) = commander("board-1");
        c.close_display().await.unwrap();
        c.show_background("01").await.unwrap();

        let cmd: Value = mock
            .get_last_json_message("rankcast_s1234567/commands/board-1")
            .unwrap()
            .unwrap();
        assert_eq!(cmd["action"], "close_display");
        assert_eq!(cmd["target"], "board-1");

        let shown: Value = mock
            .get_last_json_message("rankcast_s1234567/display/board-1")
            .unwrap()
            .unwrap();
        assert_eq!(shown["background_id"], "01");
        // nothing leaked onto the broadcast forms
        assert!(mock.find_messages_by_topic("rankcast_s1234567/commands/all").is_empty());
    }

    #[tokio::test]
    async fn apply_ranking_publishes_the_ranking_payload() {
        let (mut c, mock) = commander("all");
        let n = c
            .apply_ranking("Round 3\t60050\nRound 3\t555", &ConsoleSettings::default())
            .await
            .unwrap();
        assert_eq!(n, 2);

        let payload: Value = mock
            .get_last_json_message("rankcast_s1234567/ranking/all")
            .unwrap()
            .unwrap();
        assert_eq!(payload["round"], "3");
        assert_eq!(payload["1st"], "60050");
        assert_eq!(payload["2nd"], "555");
        assert_eq!(payload["positions"]["round"], "1286,917");
        assert_eq!(payload["font_settings"]["font_name"], "Arial");
    }

    #[tokio::test]
    async fn replay_sends_skip_the_cache() {
        let (mut c, mock) = commander("all");
        c.open_display(1, "/bg").await.unwrap();
        c.show_background("01").await.unwrap();
        // a replayed toggle must not be re-recorded
        c.send_toggle_fullscreen().await.unwrap();

        c.switch_monitor(2).await.unwrap();
        let plan = c.switch_monitor(1).await.unwrap();
        assert_eq!(plan, vec![ReplayStep::ShowBackground("01".to_string())]);

        // the operator-initiated toggle does land in the plan
        c.toggle_fullscreen().await.unwrap();
        c.switch_monitor(2).await.unwrap();
        assert_eq!(
            c.switch_monitor(1).await.unwrap(),
            vec![
                ReplayStep::ShowBackground("01".to_string()),
                ReplayStep::ToggleFullscreen
            ]
        );
        assert!(!mock.find_messages_by_topic("rankcast_s1234567/commands/all").is_empty());
    }

    #[test]
    fn ordinals_match_the_layout_keys() {
        assert_eq!(ordinal(1), "1st");
        assert_eq!(ordinal(2), "2nd");
        assert_eq!(ordinal(3), "3rd");
        assert_eq!(ordinal(4), "4th");
        assert_eq!(ordinal(10), "10th");
    }

    #[test]
    fn ranking_payload_from_pasted_columnar_data() {
        let rows = parse_ranking_data("Round 3\t60050\nRound 3\t555\nRound 3\t71");
        let payload = build_ranking_payload(&rows, &ConsoleSettings::default(), "all").unwrap();
        assert_eq!(payload.round, "3");
        assert_eq!(payload.ranks.get("1st").unwrap(), "60050");
        assert_eq!(payload.ranks.get("2nd").unwrap(), "555");
        assert_eq!(payload.ranks.get("3rd").unwrap(), "71");
        assert_eq!(payload.positions.get("round").unwrap(), "1286,917");
        assert_eq!(payload.target, "all");
    }

    #[test]
    fn ranking_payload_caps_at_ten_ranks() {
        let raw: String = (0..14).map(|i| format!("Round 1\t10{i:02}\n")).collect();
        let rows = parse_ranking_data(&raw);
        assert_eq!(rows.len(), 14);
        let payload = build_ranking_payload(&rows, &ConsoleSettings::default(), "all").unwrap();
        assert_eq!(payload.ranks.len(), MAX_RANKS);
        assert!(payload.ranks.contains_key("10th"));
        assert!(!payload.ranks.contains_key("11th"));
    }

    #[test]
    fn empty_paste_builds_nothing() {
        let rows = parse_ranking_data("garbage\nmore garbage");
        assert!(build_ranking_payload(&rows, &ConsoleSettings::default(), "all").is_none());
    }

    #[test]
    fn final_payload_places_in_order() {
        let places = [
            "60050".to_string(),
            "555".to_string(),
            "71".to_string(),
            "802".to_string(),
            "9".to_string(),
        ];
        let payload = build_final_payload(&places, &ConsoleSettings::default(), "host-a");
        assert_eq!(payload.winner, "60050");
        assert_eq!(payload.fifth, "9");
        assert_eq!(payload.target, "host-a");
    }
}
