//! Camera commands for the map surface.

use serde::{Deserialize, Serialize};

use crate::coord::Bounds;

/// Padding and animation used when fitting the camera to a route.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FitBoundsOptions {
    /// Screen units kept free on every side.
    pub padding: f64,
    pub duration_ms: u64,
}

impl Default for FitBoundsOptions {
    fn default() -> Self {
        Self {
            padding: 200.0,
            duration_ms: 1000,
        }
    }
}

/// Animate the viewport so `bbox` is fully visible.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraCommand {
    /// `[west, south, east, north]`
    pub bbox: [f64; 4],
    pub padding: f64,
    pub duration_ms: u64,
}

impl CameraCommand {
    pub fn fit(bounds: Bounds, options: &FitBoundsOptions) -> Self {
        Self {
            bbox: bounds.to_bbox(),
            padding: options.padding,
            duration_ms: options.duration_ms,
        }
    }
}

/// The map camera as seen by the session.
pub trait MapView {
    fn fit_bounds(&mut self, command: &CameraCommand);
}

/// Keeps every command it receives; for hosts that poll and for tests.
#[derive(Debug, Default)]
pub struct CommandQueue {
    pub commands: Vec<CameraCommand>,
}

impl CommandQueue {
    pub fn drain(&mut self) -> Vec<CameraCommand> {
        std::mem::take(&mut self.commands)
    }
}

impl MapView for CommandQueue {
    fn fit_bounds(&mut self, command: &CameraCommand) {
        self.commands.push(*command);
    }
}
