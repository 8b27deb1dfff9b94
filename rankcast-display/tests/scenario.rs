//! End-to-end command-path scenarios: console-shaped payloads through the
//! router and state machine, with the console's monitor cache deciding what
//! gets replayed after a switch.

use rankcast_core::identity::{ClientId, RuntimeIdentity, SessionId};
use rankcast_core::monitors::{MonitorStateCache, ReplayStep};
use rankcast_core::topics::{TopicKind, TopicRegistry};
use rankcast_devkit::PayloadBuilder;
use rankcast_display::router::CommandRouter;
use rankcast_display::state::DisplayStateMachine;
use rankcast_display::surface::HeadlessSurface;
use std::time::{Duration, Instant};

struct Harness {
    registry: TopicRegistry,
    router: CommandRouter,
    machine: DisplayStateMachine<HeadlessSurface>,
    _backgrounds: tempfile::TempDir,
    bg_folder: String,
}

impl Harness {
    fn new(client_id: &str) -> Self {
        let identity = RuntimeIdentity::new(
            SessionId::from_string("e2e00001"),
            ClientId::sanitize(client_id),
        );
        let registry = TopicRegistry::new(&identity);

        let backgrounds = tempfile::tempdir().unwrap();
        for name in ["00.jpg", "01.jpg", "02.jpg"] {
            std::fs::write(backgrounds.path().join(name), b"img").unwrap();
        }
        let bg_folder = backgrounds.path().display().to_string();

        Self {
            router: CommandRouter::new(registry.clone(), identity.client_id.as_str()),
            machine: DisplayStateMachine::new(HeadlessSurface::new(), identity.client_id.as_str(), None),
            registry,
            _backgrounds: backgrounds,
            bg_folder,
        }
    }

    /// Delivers one payload on a topic kind's broadcast form and returns the
    /// published status kinds.
    fn deliver(&mut self, kind: TopicKind, payload: &serde_json::Value, now: Instant) -> Vec<String> {
        let topic = self.registry.broadcast(kind);
        let bytes = serde_json::to_vec(payload).unwrap();
        match self.router.route(&topic, &bytes, now) {
            Some(cmd) => self
                .machine
                .apply(cmd, now)
                .into_iter()
                .map(|s| s.status)
                .collect(),
            None => Vec::new(),
        }
    }
}

#[test]
fn open_switch_and_replay_with_empty_cache() {
    let mut h = Harness::new("host-a");
    let mut cache = MonitorStateCache::new();
    let t0 = Instant::now();

    // console: open on monitor 1, broadcast
    let statuses = h.deliver(
        TopicKind::Commands,
        &PayloadBuilder::open_display(1, &h.bg_folder.clone(), "all"),
        t0,
    );
    assert_eq!(statuses, vec!["success", "display_ready"]);
    assert_eq!(h.machine.display_status(), "open");
    cache.record_open(1);

    // console: switch to monitor 2 — close reported, then reopen + ready
    let t1 = t0 + Duration::from_secs(2);
    let statuses = h.deliver(TopicKind::Commands, &PayloadBuilder::switch_monitor(2, "all"), t1);
    assert_eq!(statuses, vec!["success", "success", "display_ready"]);

    // monitor 2 has no cached state: the console sends nothing extra
    assert!(cache.switch_to(2).is_empty());
}

#[test]
fn replay_restores_background_and_fullscreen_on_switch_back() {
    let mut h = Harness::new("host-a");
    let mut cache = MonitorStateCache::new();
    let t0 = Instant::now();

    h.deliver(TopicKind::Commands, &PayloadBuilder::open_display(1, &h.bg_folder.clone(), "all"), t0);
    cache.record_open(1);
    h.deliver(TopicKind::Display, &PayloadBuilder::show_background("01", "all"), t0);
    cache.record_background("01");
    h.deliver(TopicKind::Commands, &PayloadBuilder::toggle_fullscreen("all"), t0);
    cache.record_fullscreen_toggle();

    // away and back
    let t1 = t0 + Duration::from_secs(2);
    h.deliver(TopicKind::Commands, &PayloadBuilder::switch_monitor(2, "all"), t1);
    cache.switch_to(2);
    let t2 = t1 + Duration::from_secs(2);
    h.deliver(TopicKind::Commands, &PayloadBuilder::switch_monitor(1, "all"), t2);
    let steps = cache.switch_to(1);
    assert_eq!(
        steps,
        vec![ReplayStep::ShowBackground("01".to_string()), ReplayStep::ToggleFullscreen]
    );

    // the fresh window forgot everything until the replay lands
    assert_eq!(h.machine.current_background(), "unknown");
    for step in steps {
        let payload = match step {
            ReplayStep::ShowBackground(bg) => PayloadBuilder::show_background(&bg, "all"),
            ReplayStep::ToggleFullscreen => PayloadBuilder::toggle_fullscreen("all"),
        };
        let kind = if payload["action"] == "show_background" {
            TopicKind::Display
        } else {
            TopicKind::Commands
        };
        let statuses = h.deliver(kind, &payload, t2 + Duration::from_secs(1));
        assert_eq!(statuses, vec!["success"]);
    }
    assert_eq!(h.machine.current_background(), "01");
}

#[test]
fn targeted_command_for_other_display_changes_nothing() {
    let mut h = Harness::new("host-a");
    let t0 = Instant::now();

    let statuses = h.deliver(
        TopicKind::Commands,
        &PayloadBuilder::open_display(1, &h.bg_folder.clone(), "host-b"),
        t0,
    );
    // no state change and no status publish at all
    assert!(statuses.is_empty());
    assert_eq!(h.machine.display_status(), "closed");
}

#[test]
fn duplicate_delivery_across_variants_applies_once() {
    let mut h = Harness::new("host-a");
    let t0 = Instant::now();
    h.deliver(TopicKind::Commands, &PayloadBuilder::open_display(0, &h.bg_folder.clone(), "all"), t0);
    h.deliver(TopicKind::Display, &PayloadBuilder::show_background("02", "all"), t0);
    h.deliver(TopicKind::Commands, &PayloadBuilder::toggle_fullscreen("all"), t0);

    // broker redelivers the toggle on the targeted variant 100ms later:
    // dedup must swallow it or fullscreen would cancel itself
    let payload = PayloadBuilder::toggle_fullscreen("all");
    let bytes = serde_json::to_vec(&payload).unwrap();
    let targeted = h.registry.targeted(TopicKind::Commands, "host-a");
    assert!(h
        .router
        .route(&targeted, &bytes, t0 + Duration::from_millis(100))
        .is_none());
}

#[test]
fn ranking_payload_drives_background_01() {
    let mut h = Harness::new("host-a");
    let t0 = Instant::now();
    h.deliver(TopicKind::Commands, &PayloadBuilder::open_display(0, &h.bg_folder.clone(), "all"), t0);

    let ranking = PayloadBuilder::ranking("3", &[("1st", "60050"), ("2nd", "555")], "all");
    let statuses = h.deliver(TopicKind::Ranking, &ranking, t0);
    assert_eq!(statuses, vec!["success"]);
    assert_eq!(h.machine.current_background(), "01");
}
