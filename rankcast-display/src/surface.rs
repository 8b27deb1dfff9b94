//! Boundary to the actual on-screen window.
//!
//! Window construction, text overlay rendering and monitor enumeration are
//! platform concerns that live behind this trait; the state machine only
//! cares about success or failure of each operation.

use serde_json::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum SurfaceError {
    #[error("no mapping for background `{0}`")]
    UnknownBackground(String),

    #[error("background folder `{0}` is missing required images")]
    InvalidFolder(String),

    #[error("window error: {0}")]
    Window(String),
}

pub trait DisplaySurface {
    fn open(&mut self, monitor_index: u32) -> Result<(), SurfaceError>;

    /// Loads (or reloads) the background image set from a folder.
    fn load_background_folder(&mut self, folder: &Path) -> Result<(), SurfaceError>;

    /// Shows a background, optionally compositing overlay text from the
    /// payload. Fails when the id has no loaded mapping.
    fn show_background(&mut self, background_id: &str, overlay: Option<&Value>)
        -> Result<(), SurfaceError>;

    /// Flips fullscreen and returns the new flag. Implementations preserve
    /// the pre-fullscreen geometry so the next toggle restores it exactly.
    fn toggle_fullscreen(&mut self) -> bool;

    fn close(&mut self);
}

/// The ids a folder must resolve for the display to accept it.
const REQUIRED_BACKGROUNDS: [&str; 3] = ["00", "01", "02"];
const IMAGE_EXTENSIONS: [&str; 3] = ["jpg", "png", "jpeg"];

/// Surface implementation without a windowing stack: validates folders and
/// background ids against the filesystem and logs what a real window would
/// draw. Stands in wherever the rendering collaborator is not linked in.
#[derive(Debug, Default)]
pub struct HeadlessSurface {
    backgrounds: HashMap<String, PathBuf>,
    fullscreen: bool,
    open_on: Option<u32>,
}

impl HeadlessSurface {
    pub fn new() -> Self {
        Self::default()
    }

    fn scan_folder(folder: &Path) -> Option<HashMap<String, PathBuf>> {
        let mut found = HashMap::new();
        for id in REQUIRED_BACKGROUNDS {
            let path = IMAGE_EXTENSIONS
                .iter()
                .map(|ext| folder.join(format!("{id}.{ext}")))
                .find(|p| p.exists())?;
            found.insert(id.to_string(), path);
        }
        Some(found)
    }
}

impl DisplaySurface for HeadlessSurface {
    fn open(&mut self, monitor_index: u32) -> Result<(), SurfaceError> {
        self.open_on = Some(monitor_index);
        self.fullscreen = false;
        info!(monitor = monitor_index, "display window opened");
        Ok(())
    }

    fn load_background_folder(&mut self, folder: &Path) -> Result<(), SurfaceError> {
        match Self::scan_folder(folder) {
            Some(map) => {
                self.backgrounds = map;
                info!(folder = %folder.display(), "background folder loaded");
                Ok(())
            }
            None => Err(SurfaceError::InvalidFolder(folder.display().to_string())),
        }
    }

    fn show_background(
        &mut self,
        background_id: &str,
        overlay: Option<&Value>,
    ) -> Result<(), SurfaceError> {
        let path = self
            .backgrounds
            .get(background_id)
            .ok_or_else(|| SurfaceError::UnknownBackground(background_id.to_string()))?;
        info!(
            background = background_id,
            path = %path.display(),
            overlay = overlay.is_some(),
            "showing background"
        );
        Ok(())
    }

    fn toggle_fullscreen(&mut self) -> bool {
        self.fullscreen = !self.fullscreen;
        info!(fullscreen = self.fullscreen, "toggled fullscreen");
        self.fullscreen
    }

    fn close(&mut self) {
        self.open_on = None;
        info!("display window closed");
    }
}
