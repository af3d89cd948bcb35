use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
    sync::{PoisonError, RwLock},
    time::Duration,
};

use crate::calendar::ExperimentCalendar;
use crate::playback::{PlaybackConfig, WindowPolicy};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PlaybackSettings {
    /// Wall-clock time between ticks; controls playback speed only.
    pub tick_interval_ms: u64,
    pub sim_step_minutes: i64,
    pub window_duration_minutes: i64,
    pub window_policy: WindowPolicy,
    pub smoothing_window_minutes: usize,
    pub overview_smoothing_minutes: usize,
    pub experiment_days: u32,
    /// Send full point arrays with every tick instead of counts.
    pub emit_points: bool,
}

impl Default for PlaybackSettings {
    fn default() -> Self {
        Self {
            tick_interval_ms: 50,
            sim_step_minutes: 20,
            window_duration_minutes: 3 * 1440,
            window_policy: WindowPolicy::TrailingEdge,
            smoothing_window_minutes: 15,
            overview_smoothing_minutes: 5,
            experiment_days: 14,
            emit_points: false,
        }
    }
}

impl PlaybackSettings {
    pub fn playback_config(&self) -> PlaybackConfig {
        PlaybackConfig {
            step_minutes: self.sim_step_minutes.max(1),
            window_minutes: self.window_duration_minutes.max(1),
            policy: self.window_policy,
        }
    }

    pub fn calendar(&self) -> ExperimentCalendar {
        ExperimentCalendar::with_days(self.experiment_days)
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms.max(1))
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct UserSettings {
    #[serde(default)]
    playback: PlaybackSettings,
}

pub struct SettingsStore {
    path: PathBuf,
    data: RwLock<UserSettings>,
}

impl SettingsStore {
    pub fn new(path: PathBuf) -> Result<Self> {
        let data = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read settings from {}", path.display()))?;
            serde_json::from_str(&contents).unwrap_or_else(|err| {
                log::warn!("Ignoring unreadable settings in {}: {err}", path.display());
                UserSettings::default()
            })
        } else {
            UserSettings::default()
        };

        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    pub fn playback(&self) -> PlaybackSettings {
        self.data
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .playback
            .clone()
    }

    pub fn update_playback(&self, settings: PlaybackSettings) -> Result<()> {
        let mut guard = self.data.write().unwrap_or_else(PoisonError::into_inner);
        guard.playback = settings;
        self.persist(&guard)
    }

    /// Writes the current settings out when no file exists yet, so there is one to edit.
    /// Returns whether a file was written.
    pub fn write_defaults_if_missing(&self) -> Result<bool> {
        if self.path.exists() {
            return Ok(false);
        }
        let guard = self.data.read().unwrap_or_else(PoisonError::into_inner);
        self.persist(&guard)?;
        Ok(true)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, data: &UserSettings) -> Result<()> {
        let serialized = serde_json::to_string_pretty(data)?;
        fs::write(&self.path, serialized)
            .with_context(|| format!("Failed to write settings to {}", self.path.display()))
    }
}
