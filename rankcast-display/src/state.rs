//! Display state machine.
//!
//! Executes commands against the display surface and tracks what is
//! currently shown. Failed transitions never raise: every outcome is
//! reported back as status messages for the operator, and the local state
//! only changes when the surface call succeeded.

use crate::surface::DisplaySurface;
use rankcast_core::envelope::StatusMessage;
use serde_json::Value;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// A second `open_display` racing the dedup window (double-click, duplicate
/// delivery) is ignored inside this interval.
pub const OPEN_DEBOUNCE: Duration = Duration::from_millis(800);

/// Typed command out of the router.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    OpenDisplay { monitor_index: u32, background_folder: String },
    CloseDisplay,
    ToggleFullscreen,
    SwitchMonitor { monitor_index: u32 },
    Ping,
    ShowBackground { background_id: String },
    Ranking(Value),
    Final(Value),
    SetBackgroundFolder { folder_path: String },
}

#[derive(Debug, Clone, PartialEq)]
pub enum DisplayState {
    Closed,
    Open {
        monitor_index: u32,
        current_background: Option<String>,
        fullscreen: bool,
    },
}

pub struct DisplayStateMachine<S: DisplaySurface> {
    surface: S,
    state: DisplayState,
    client_id: String,
    background_folder: Option<PathBuf>,
    last_open: Option<Instant>,
}

impl<S: DisplaySurface> DisplayStateMachine<S> {
    pub fn new(surface: S, client_id: &str, default_folder: Option<PathBuf>) -> Self {
        Self {
            surface,
            state: DisplayState::Closed,
            client_id: client_id.to_string(),
            background_folder: default_folder,
            last_open: None,
        }
    }

    pub fn state(&self) -> &DisplayState {
        &self.state
    }

    pub fn display_status(&self) -> &'static str {
        match self.state {
            DisplayState::Closed => "closed",
            DisplayState::Open { .. } => "open",
        }
    }

    pub fn current_background(&self) -> &str {
        match &self.state {
            DisplayState::Open {
                current_background: Some(bg),
                ..
            } => bg,
            _ => "unknown",
        }
    }

    fn status(&self, kind: &str, message: impl Into<String>) -> StatusMessage {
        StatusMessage::new(kind, message, &self.client_id)
    }

    /// Applies one command; returns the status messages to publish.
    pub fn apply(&mut self, command: Command, now: Instant) -> Vec<StatusMessage> {
        match command {
            Command::OpenDisplay { monitor_index, background_folder } => {
                self.open_display(monitor_index, &background_folder, now)
            }
            Command::CloseDisplay => self.close_display(),
            Command::ToggleFullscreen => self.toggle_fullscreen(),
            Command::SwitchMonitor { monitor_index } => self.switch_monitor(monitor_index, now),
            Command::Ping => vec![self.status("pong", "Connection test successful")],
            Command::ShowBackground { background_id } => {
                self.show_background(&background_id, None)
            }
            Command::Ranking(data) => self.show_overlay("01", data, "Ranking"),
            Command::Final(data) => self.show_overlay("02", data, "Final results"),
            Command::SetBackgroundFolder { folder_path } => self.set_background_folder(&folder_path),
        }
    }

    fn open_display(&mut self, monitor_index: u32, folder: &str, now: Instant) -> Vec<StatusMessage> {
        if let Some(last) = self.last_open {
            if now.duration_since(last) < OPEN_DEBOUNCE {
                debug!("ignoring rapid duplicate open_display request");
                return Vec::new();
            }
        }
        self.last_open = Some(now);

        if !folder.is_empty() {
            self.background_folder = Some(PathBuf::from(folder));
        }
        let Some(folder) = self.background_folder.clone() else {
            return vec![self.status("error", "No background folder specified")];
        };

        // same monitor: reuse the window and just reload the folder, so the
        // screen does not flicker through a teardown
        if let DisplayState::Open { monitor_index: open_on, .. } = self.state {
            if open_on == monitor_index {
                return match self.surface.load_background_folder(&folder) {
                    Ok(()) => vec![self.status(
                        "success",
                        format!("Display already open on monitor {}", monitor_index + 1),
                    )],
                    Err(e) => vec![self.status("error", format!("Failed to load background folder: {e}"))],
                };
            }
            self.surface.close();
            self.state = DisplayState::Closed;
        }

        if let Err(e) = self.surface.open(monitor_index) {
            return vec![self.status("error", format!("Failed to open display: {e}"))];
        }
        if let Err(e) = self.surface.load_background_folder(&folder) {
            self.surface.close();
            return vec![self.status("error", format!("Failed to load background folder: {e}"))];
        }

        self.state = DisplayState::Open {
            monitor_index,
            current_background: None,
            fullscreen: false,
        };
        info!(monitor = monitor_index, "display opened");
        vec![
            self.status("success", format!("Display opened on monitor {}", monitor_index + 1)),
            self.status("display_ready", format!("Monitor {} ready for content", monitor_index + 1)),
        ]
    }

    fn close_display(&mut self) -> Vec<StatusMessage> {
        match self.state {
            DisplayState::Open { .. } => {
                self.surface.close();
                self.state = DisplayState::Closed;
                vec![self.status("success", "Display closed")]
            }
            DisplayState::Closed => vec![self.status("info", "No display window open")],
        }
    }

    fn show_background(&mut self, background_id: &str, overlay: Option<&Value>) -> Vec<StatusMessage> {
        let DisplayState::Open { current_background, .. } = &mut self.state else {
            return vec![self.status("error", "Display window not open")];
        };
        match self.surface.show_background(background_id, overlay) {
            Ok(()) => {
                *current_background = Some(background_id.to_string());
                vec![self.status("success", format!("Background {background_id} displayed"))]
            }
            Err(e) => vec![self.status("error", format!("Failed to show background {background_id}: {e}"))],
        }
    }

    fn show_overlay(&mut self, background_id: &str, data: Value, label: &str) -> Vec<StatusMessage> {
        let DisplayState::Open { current_background, .. } = &mut self.state else {
            return vec![self.status("error", "Display window not open")];
        };
        match self.surface.show_background(background_id, Some(&data)) {
            Ok(()) => {
                *current_background = Some(background_id.to_string());
                vec![self.status("success", format!("{label} updated"))]
            }
            Err(e) => vec![self.status("error", format!("Failed to update {}: {e}", label.to_lowercase()))],
        }
    }

    fn toggle_fullscreen(&mut self) -> Vec<StatusMessage> {
        let DisplayState::Open { fullscreen, .. } = &mut self.state else {
            return vec![self.status("error", "No display window open")];
        };
        let now_fullscreen = self.surface.toggle_fullscreen();
        *fullscreen = now_fullscreen;
        let mode = if now_fullscreen { "fullscreen" } else { "windowed" };
        vec![self.status("success", format!("Display switched to {mode} mode"))]
    }

    /// Close + open on the new index, reporting both halves so the console
    /// sees the close status before the reopen. Restoring background and
    /// fullscreen is the console's job; it replays them once the new window
    /// reports ready.
    fn switch_monitor(&mut self, monitor_index: u32, now: Instant) -> Vec<StatusMessage> {
        if self.state == DisplayState::Closed {
            return vec![self.status("error", "No display window open")];
        }
        let mut statuses = self.close_display();
        statuses.extend(self.open_display(monitor_index, "", now));
        statuses
    }

    fn set_background_folder(&mut self, folder_path: &str) -> Vec<StatusMessage> {
        let path = PathBuf::from(folder_path);
        match self.surface.load_background_folder(&path) {
            Ok(()) => {
                self.background_folder = Some(path);
                vec![self.status("success", format!("Background folder set to: {folder_path}"))]
            }
            Err(_) => vec![self.status("error", "Invalid background folder path")],
        }
    }
}
