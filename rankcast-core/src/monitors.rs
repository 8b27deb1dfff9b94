//! Console-side memory of what each monitor was last told to show.
//!
//! The console never queries the display for ground truth; this cache is its
//! own record of the last commands it issued, keyed by monitor index. After
//! a monitor switch the cached state of the target monitor is replayed so
//! the new window comes back with the same background and fullscreen state.

use std::collections::HashMap;
use std::time::Duration;

/// Wait after `switch_monitor` before replaying content commands, used when
/// no `display_ready` status arrives in time. The remote window has to
/// finish construction before it accepts content.
pub const SETTLE_DELAY: Duration = Duration::from_millis(1000);
/// Extra wait before the fullscreen replay step.
pub const FULLSCREEN_DELAY: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MonitorState {
    pub background: Option<String>,
    pub fullscreen: bool,
    pub display_open: bool,
}

/// Follow-up command the console should send after the settle point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplayStep {
    ShowBackground(String),
    /// Sent [`FULLSCREEN_DELAY`] after the background replay.
    ToggleFullscreen,
}

#[derive(Debug, Default)]
pub struct MonitorStateCache {
    states: HashMap<u32, MonitorState>,
    current: u32,
}

impl MonitorStateCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current_monitor(&self) -> u32 {
        self.current
    }

    fn entry(&mut self, monitor: u32) -> &mut MonitorState {
        self.states.entry(monitor).or_default()
    }

    pub fn record_open(&mut self, monitor: u32) {
        self.current = monitor;
        self.entry(monitor).display_open = true;
    }

    pub fn record_close(&mut self) {
        let current = self.current;
        let state = self.entry(current);
        state.display_open = false;
        state.background = None;
        state.fullscreen = false;
    }

    pub fn record_background(&mut self, background_id: &str) {
        let current = self.current;
        self.entry(current).background = Some(background_id.to_string());
    }

    pub fn record_fullscreen_toggle(&mut self) {
        let current = self.current;
        let state = self.entry(current);
        state.fullscreen = !state.fullscreen;
    }

    pub fn state_of(&self, monitor: u32) -> MonitorState {
        self.states.get(&monitor).cloned().unwrap_or_default()
    }

    /// Snapshots the current monitor, moves `current` to the target and
    /// returns the follow-up commands for the target monitor. Empty when the
    /// target has no prior cached state — no extra commands are sent then.
    pub fn switch_to(&mut self, target: u32) -> Vec<ReplayStep> {
        self.current = target;
        let cached = self.state_of(target);
        self.entry(target).display_open = true;

        let mut steps = Vec::new();
        if let Some(bg) = cached.background {
            steps.push(ReplayStep::ShowBackground(bg));
        }
        if cached.fullscreen {
            steps.push(ReplayStep::ToggleFullscreen);
        }
        steps
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_target_monitor_needs_no_replay() {
        let mut cache = MonitorStateCache::new();
        cache.record_open(1);
        cache.record_background("01");
        assert!(cache.switch_to(2).is_empty());
        assert_eq!(cache.current_monitor(), 2);
    }

    #[test]
    fn switching_back_replays_background_then_fullscreen() {
        let mut cache = MonitorStateCache::new();
        cache.record_open(1);
        cache.record_background("01");
        cache.record_fullscreen_toggle();

        cache.switch_to(2);
        let steps = cache.switch_to(1);
        assert_eq!(
            steps,
            vec![
                ReplayStep::ShowBackground("01".to_string()),
                ReplayStep::ToggleFullscreen
            ]
        );
    }

    #[test]
    fn double_toggle_cancels_fullscreen_replay() {
        let mut cache = MonitorStateCache::new();
        cache.record_open(0);
        cache.record_background("02");
        cache.record_fullscreen_toggle();
        cache.record_fullscreen_toggle();

        cache.switch_to(1);
        assert_eq!(
            cache.switch_to(0),
            vec![ReplayStep::ShowBackground("02".to_string())]
        );
    }

    #[test]
    fn close_clears_cached_state() {
        let mut cache = MonitorStateCache::new();
        cache.record_open(1);
        cache.record_background("01");
        cache.record_close();

        cache.switch_to(2);
        assert!(cache.switch_to(1).is_empty());
    }
}
