use std::{sync::Arc, time::Duration};

use anyhow::Result;
use serde::Serialize;
use tokio::{
    sync::{watch, Mutex},
    task::JoinHandle,
    time::{self, MissedTickBehavior},
};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::bridge::RenderBridge;
use crate::settings::PlaybackSettings;
use crate::view::{DetailView, FrameSummary};

use super::{Phase, PlaybackCommand, PlaybackEvent, PlaybackState, ViewWindow};

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_error, log_info};

#[derive(Debug, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct PlaybackSnapshot {
    pub view_id: Uuid,
    pub state: PlaybackState,
    pub window: ViewWindow,
    pub ticking: bool,
    pub summary: FrameSummary,
}

struct Ticker {
    handle: JoinHandle<()>,
    cancel_token: CancellationToken,
}

/// Drives one [`DetailView`]: owns its clock, runs the tick task and pushes every update
/// through the render bridge.
#[derive(Clone)]
pub struct PlaybackController {
    state: Arc<Mutex<PlaybackState>>,
    view: Arc<DetailView>,
    bridge: Arc<dyn RenderBridge>,
    ticker: Arc<Mutex<Option<Ticker>>>,
    tick_interval: Duration,
    phase_tx: Arc<watch::Sender<Phase>>,
}

impl PlaybackController {
    pub fn new(view: DetailView, settings: &PlaybackSettings, bridge: Arc<dyn RenderBridge>) -> Self {
        let state = PlaybackState::new(view.calendar, settings.playback_config());
        let (phase_tx, _) = watch::channel(state.phase);

        Self {
            state: Arc::new(Mutex::new(state)),
            view: Arc::new(view),
            bridge,
            ticker: Arc::new(Mutex::new(None)),
            tick_interval: settings.tick_interval(),
            phase_tx: Arc::new(phase_tx),
        }
    }

    pub fn view(&self) -> &DetailView {
        &self.view
    }

    /// Draws the first frame and starts ticking.
    pub async fn start(&self) -> Result<PlaybackSnapshot> {
        log_info!(
            "starting playback for mouse {} (view {})",
            self.view.mouse_number,
            self.view.id
        );
        {
            let state = self.state.lock().await;
            publish(&state, &self.view, self.bridge.as_ref(), &self.phase_tx, &[PlaybackEvent::Redraw]);
            if state.is_ticking() {
                self.spawn_ticker().await;
            }
        }
        Ok(self.snapshot().await)
    }

    pub async fn apply(&self, command: PlaybackCommand) -> Result<PlaybackSnapshot> {
        {
            let mut state = self.state.lock().await;
            let events = state.apply(command);
            if events.is_empty() {
                log_debug!("{command:?} ignored");
            }
            publish(&state, &self.view, self.bridge.as_ref(), &self.phase_tx, &events);

            // Still under the state lock, so a pending tick sees the new state.
            if events.contains(&PlaybackEvent::TickingStopped) {
                self.cancel_ticker().await;
            }
            if events.contains(&PlaybackEvent::TickingResumed) && state.is_ticking() {
                self.spawn_ticker().await;
            }
        }
        Ok(self.snapshot().await)
    }

    pub async fn pause(&self) -> Result<PlaybackSnapshot> {
        self.apply(PlaybackCommand::Pause).await
    }

    pub async fn resume(&self) -> Result<PlaybackSnapshot> {
        self.apply(PlaybackCommand::Resume).await
    }

    pub async fn skip_to_end(&self) -> Result<PlaybackSnapshot> {
        self.apply(PlaybackCommand::SkipToEnd).await
    }

    pub async fn restart(&self) -> Result<PlaybackSnapshot> {
        self.apply(PlaybackCommand::Restart).await
    }

    pub async fn scrub(&self, fraction: f64) -> Result<PlaybackSnapshot> {
        self.apply(PlaybackCommand::Scrub { fraction }).await
    }

    pub async fn scrub_end(&self) -> Result<PlaybackSnapshot> {
        self.apply(PlaybackCommand::ScrubEnd).await
    }

    pub async fn brush(&self, start: f64, end: f64) -> Result<PlaybackSnapshot> {
        self.apply(PlaybackCommand::Brush { start, end }).await
    }

    pub async fn reset_scope(&self) -> Result<PlaybackSnapshot> {
        self.apply(PlaybackCommand::ResetScope).await
    }

    /// Only pixel mappings change; the clock is untouched.
    pub async fn resize(&self) -> Result<PlaybackSnapshot> {
        self.apply(PlaybackCommand::Resize).await
    }

    pub async fn snapshot(&self) -> PlaybackSnapshot {
        let state = self.state.lock().await;
        PlaybackSnapshot {
            view_id: self.view.id,
            window: state.window(),
            ticking: state.is_ticking(),
            summary: self.view.summary(&state),
            state: state.clone(),
        }
    }

    /// Resolves once the clock has reached the final phase.
    pub async fn wait_for_final(&self) {
        let mut rx = self.phase_tx.subscribe();
        let _ = rx.wait_for(|phase| *phase == Phase::Final).await;
    }

    pub async fn shutdown(&self) {
        self.cancel_ticker().await;
    }

    async fn spawn_ticker(&self) {
        let mut ticker_guard = self.ticker.lock().await;
        if let Some(ticker) = ticker_guard.take() {
            ticker.cancel_token.cancel();
            ticker.handle.abort();
        }

        let state = self.state.clone();
        let view = self.view.clone();
        let bridge = self.bridge.clone();
        let phase_tx = self.phase_tx.clone();
        let tick_interval = self.tick_interval;
        let cancel_token = CancellationToken::new();
        let token = cancel_token.clone();

        let handle = tokio::spawn(async move {
            let mut interval = time::interval(tick_interval);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick completes immediately; the clock moves one interval after start.
            interval.tick().await;

            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = interval.tick() => {
                        let mut guard = state.lock().await;
                        if token.is_cancelled() || !guard.is_ticking() {
                            break;
                        }
                        let events = guard.tick();
                        publish(&guard, &view, bridge.as_ref(), &phase_tx, &events);
                        if events.contains(&PlaybackEvent::TickingStopped) {
                            break;
                        }
                    }
                }
            }
        });

        *ticker_guard = Some(Ticker {
            handle,
            cancel_token,
        });
    }

    async fn cancel_ticker(&self) {
        if let Some(ticker) = self.ticker.lock().await.take() {
            ticker.cancel_token.cancel();
            ticker.handle.abort();
        }
    }
}

/// Pushes the effects of one transition to the renderer. Render failures are logged and
/// dropped so the clock keeps running.
fn publish(
    state: &PlaybackState,
    view: &DetailView,
    bridge: &dyn RenderBridge,
    phase_tx: &watch::Sender<Phase>,
    events: &[PlaybackEvent],
) {
    for event in events {
        let result = match event {
            PlaybackEvent::Redraw => bridge
                .on_tick(&view.frame(state))
                .and_then(|_| bridge.on_summary(&view.summary(state))),
            PlaybackEvent::PhaseChanged(phase) => {
                log_info!("view {} entered {:?} at {}", view.id, phase, state.current);
                phase_tx.send_replace(*phase);
                bridge.on_phase_change(*phase)
            }
            PlaybackEvent::ZoomToFullRange => bridge.on_zoom_to_full_range(),
            PlaybackEvent::TickingResumed | PlaybackEvent::TickingStopped => Ok(()),
        };

        if let Err(err) = result {
            log_error!("render update {:?} failed for view {}: {err:#}", event, view.id);
        }
    }
}
