use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use super::controller::{PlaybackController, PlaybackSnapshot};

/// Inputs the renderer can send to a playback view.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(tag = "command", rename_all = "camelCase")]
pub enum PlaybackCommand {
    Tick,
    Pause,
    Resume,
    TogglePause,
    SkipToEnd,
    Restart,
    /// Pointer position as a fraction of the full recording.
    Scrub { fraction: f64 },
    ScrubEnd,
    /// Selection edges as fractions of the current window.
    Brush { start: f64, end: f64 },
    ResetScope,
    Resize,
}

impl PlaybackCommand {
    pub fn from_json(line: &str) -> Result<Self> {
        serde_json::from_str(line.trim())
            .with_context(|| format!("not a playback command: {}", line.trim()))
    }
}

pub async fn dispatch(
    controller: &PlaybackController,
    command: PlaybackCommand,
) -> Result<PlaybackSnapshot> {
    controller.apply(command).await
}
