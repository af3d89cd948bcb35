use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::calendar::{ExperimentCalendar, Timestamp};

use super::commands::PlaybackCommand;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum Phase {
    /// Data is revealed progressively up to the clock.
    #[default]
    Animating,
    /// The whole recording is available as a static view.
    Final,
}

/// How the visible window follows the clock while animating.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
#[serde(tag = "kind", content = "fraction", rename_all = "camelCase")]
pub enum WindowPolicy {
    /// The clock sits on the right edge of the window.
    #[default]
    TrailingEdge,
    /// The clock sits at this fraction of the window width.
    OffsetFraction(f64),
    /// The window never moves.
    FullRange,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ViewWindow {
    pub start: Timestamp,
    pub end: Timestamp,
}

impl ViewWindow {
    pub fn new(start: Timestamp, end: Timestamp) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, time: Timestamp) -> bool {
        self.start <= time && time <= self.end
    }

    pub fn duration_minutes(&self) -> i64 {
        (self.end - self.start).num_minutes()
    }

    /// Maps a fraction of the window width to a whole minute inside it.
    pub fn time_at_fraction(&self, fraction: f64) -> Timestamp {
        let fraction = if fraction.is_nan() {
            0.0
        } else {
            fraction.clamp(0.0, 1.0)
        };
        let minutes = (fraction * self.duration_minutes() as f64).round() as i64;
        self.start + Duration::minutes(minutes)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PlaybackConfig {
    /// Simulated minutes per tick, independent of the wall-clock tick rate.
    pub step_minutes: i64,
    pub window_minutes: i64,
    pub policy: WindowPolicy,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            step_minutes: 20,
            window_minutes: 3 * 1440,
            policy: WindowPolicy::TrailingEdge,
        }
    }
}

/// What a caller has to do after a transition. An empty list means the input was ignored.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum PlaybackEvent {
    Redraw,
    PhaseChanged(Phase),
    /// One-off transition from the sliding window to the full recording.
    ZoomToFullRange,
    TickingResumed,
    TickingStopped,
}

/// Time range the summary panel describes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "scope", rename_all = "camelCase")]
pub enum SummaryScope {
    Day { day: i64, window: ViewWindow },
    FullRange { window: ViewWindow },
    Brushed { window: ViewWindow },
}

impl SummaryScope {
    pub fn window(&self) -> ViewWindow {
        match self {
            SummaryScope::Day { window, .. }
            | SummaryScope::FullRange { window }
            | SummaryScope::Brushed { window } => *window,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PlaybackState {
    pub calendar: ExperimentCalendar,
    pub config: PlaybackConfig,
    pub current: Timestamp,
    pub phase: Phase,
    pub paused: bool,
    pub scrubbing: bool,
    /// Explicit window chosen in the final view; overrides the policy until reset.
    pub brush: Option<ViewWindow>,
}

impl PlaybackState {
    pub fn new(calendar: ExperimentCalendar, config: PlaybackConfig) -> Self {
        Self {
            current: calendar.start,
            calendar,
            config,
            phase: Phase::Animating,
            paused: false,
            scrubbing: false,
            brush: None,
        }
    }

    pub fn is_ticking(&self) -> bool {
        self.phase == Phase::Animating && !self.paused && !self.scrubbing
    }

    pub fn apply(&mut self, command: PlaybackCommand) -> Vec<PlaybackEvent> {
        match command {
            PlaybackCommand::Tick => self.tick(),
            PlaybackCommand::Pause => self.pause(),
            PlaybackCommand::Resume => self.resume(),
            PlaybackCommand::TogglePause => {
                if self.paused {
                    self.resume()
                } else {
                    self.pause()
                }
            }
            PlaybackCommand::SkipToEnd => self.skip_to_end(),
            PlaybackCommand::Restart => self.restart(),
            PlaybackCommand::Scrub { fraction } => self.scrub(fraction),
            PlaybackCommand::ScrubEnd => self.scrub_end(),
            PlaybackCommand::Brush { start, end } => self.brush(start, end),
            PlaybackCommand::ResetScope => self.reset_scope(),
            PlaybackCommand::Resize => vec![PlaybackEvent::Redraw],
        }
    }

    pub fn tick(&mut self) -> Vec<PlaybackEvent> {
        if !self.is_ticking() {
            return Vec::new();
        }

        self.current = self
            .calendar
            .clamp(self.current + Duration::minutes(self.config.step_minutes));
        if self.current < self.calendar.end() {
            return vec![PlaybackEvent::Redraw];
        }

        self.phase = Phase::Final;
        vec![
            PlaybackEvent::Redraw,
            PlaybackEvent::PhaseChanged(Phase::Final),
            PlaybackEvent::ZoomToFullRange,
            PlaybackEvent::TickingStopped,
        ]
    }

    pub fn pause(&mut self) -> Vec<PlaybackEvent> {
        if self.paused {
            return Vec::new();
        }
        let was_ticking = self.is_ticking();
        self.paused = true;
        if was_ticking {
            vec![PlaybackEvent::TickingStopped]
        } else {
            Vec::new()
        }
    }

    /// Ignored mid-scrub; the gesture has to end first.
    pub fn resume(&mut self) -> Vec<PlaybackEvent> {
        if !self.paused || self.scrubbing {
            return Vec::new();
        }
        self.paused = false;
        if self.is_ticking() {
            vec![PlaybackEvent::TickingResumed]
        } else {
            Vec::new()
        }
    }

    pub fn skip_to_end(&mut self) -> Vec<PlaybackEvent> {
        let was_ticking = self.is_ticking();
        let was_final = self.phase == Phase::Final;

        self.current = self.calendar.end();
        self.phase = Phase::Final;
        self.scrubbing = false;

        let mut events = vec![PlaybackEvent::Redraw];
        if !was_final {
            events.push(PlaybackEvent::PhaseChanged(Phase::Final));
            events.push(PlaybackEvent::ZoomToFullRange);
        }
        if was_ticking {
            events.push(PlaybackEvent::TickingStopped);
        }
        events
    }

    pub fn restart(&mut self) -> Vec<PlaybackEvent> {
        let was_final = self.phase == Phase::Final;

        self.current = self.calendar.start;
        self.phase = Phase::Animating;
        self.paused = false;
        self.scrubbing = false;
        self.brush = None;

        let mut events = vec![PlaybackEvent::Redraw];
        if was_final {
            events.push(PlaybackEvent::PhaseChanged(Phase::Animating));
        }
        events.push(PlaybackEvent::TickingResumed);
        events
    }

    /// Moves the clock to `fraction` of the whole recording and holds ticking until resumed.
    pub fn scrub(&mut self, fraction: f64) -> Vec<PlaybackEvent> {
        if self.brush.is_some() {
            return Vec::new();
        }

        let mut events = Vec::new();
        if !self.scrubbing {
            if self.is_ticking() {
                events.push(PlaybackEvent::TickingStopped);
            }
            self.scrubbing = true;
            self.paused = true;
        }

        self.current = self.calendar.time_at_fraction(fraction);
        events.insert(0, PlaybackEvent::Redraw);
        events
    }

    /// Playback stays paused after the gesture.
    pub fn scrub_end(&mut self) -> Vec<PlaybackEvent> {
        self.scrubbing = false;
        Vec::new()
    }

    /// Zooms into `[start, end]`, given as fractions of the current window. Final phase only.
    pub fn brush(&mut self, start: f64, end: f64) -> Vec<PlaybackEvent> {
        if self.phase != Phase::Final || start.is_nan() || end.is_nan() {
            return Vec::new();
        }

        let (low, high) = if start <= end { (start, end) } else { (end, start) };
        let window = self.window();
        let selection = ViewWindow::new(window.time_at_fraction(low), window.time_at_fraction(high));
        if selection.start >= selection.end {
            return Vec::new();
        }

        self.brush = Some(selection);
        vec![PlaybackEvent::Redraw]
    }

    pub fn reset_scope(&mut self) -> Vec<PlaybackEvent> {
        if self.brush.take().is_none() {
            return Vec::new();
        }
        vec![PlaybackEvent::Redraw]
    }

    /// Axis range for the current state.
    pub fn window(&self) -> ViewWindow {
        if let Some(brush) = self.brush {
            return brush;
        }

        let start = self.calendar.start;
        let end = self.calendar.end();
        if self.phase == Phase::Final {
            return ViewWindow::new(start, end);
        }

        let width = Duration::minutes(self.config.window_minutes.max(1));
        let lead_in = ViewWindow::new(start, (start + width).min(end));
        let from = match self.config.policy {
            WindowPolicy::FullRange => return ViewWindow::new(start, end),
            WindowPolicy::TrailingEdge => self.current - width,
            WindowPolicy::OffsetFraction(fraction) => {
                let fraction = if fraction.is_nan() {
                    1.0
                } else {
                    fraction.clamp(0.0, 1.0)
                };
                let lead = (fraction * width.num_minutes() as f64).round() as i64;
                self.current - Duration::minutes(lead)
            }
        };

        if from < start {
            return lead_in;
        }
        if from + width > end {
            return ViewWindow::new((end - width).max(start), end);
        }
        ViewWindow::new(from, from + width)
    }

    /// Range of points currently on screen.
    ///
    /// While animating without a brush this is everything up to the clock; otherwise it is
    /// the window itself.
    pub fn visible_range(&self) -> ViewWindow {
        if self.phase == Phase::Animating && self.brush.is_none() {
            ViewWindow::new(self.calendar.start, self.current)
        } else {
            self.window()
        }
    }

    pub fn summary_scope(&self) -> SummaryScope {
        if let Some(window) = self.brush {
            return SummaryScope::Brushed { window };
        }

        let day = self.calendar.day_number(self.current);
        if day > i64::from(self.calendar.days) {
            return SummaryScope::FullRange {
                window: ViewWindow::new(self.calendar.start, self.calendar.end()),
            };
        }

        let (first, last) = self.calendar.day_bounds(day);
        SummaryScope::Day {
            day,
            window: ViewWindow::new(first, last),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> PlaybackState {
        PlaybackState::new(ExperimentCalendar::default(), PlaybackConfig::default())
    }

    fn minutes(state: &PlaybackState, time: Timestamp) -> i64 {
        state.calendar.minutes_since_start(time)
    }

    #[test]
    fn reaches_final_after_1008_ticks() {
        let mut state = state();
        for _ in 0..1007 {
            assert_eq!(state.tick(), vec![PlaybackEvent::Redraw]);
        }
        assert_eq!(state.phase, Phase::Animating);

        let events = state.tick();
        assert_eq!(state.phase, Phase::Final);
        assert_eq!(state.current, state.calendar.end());
        assert_eq!(
            events,
            vec![
                PlaybackEvent::Redraw,
                PlaybackEvent::PhaseChanged(Phase::Final),
                PlaybackEvent::ZoomToFullRange,
                PlaybackEvent::TickingStopped,
            ]
        );

        assert!(state.tick().is_empty());
        assert_eq!(state.current, state.calendar.end());
    }

    #[test]
    fn overshooting_step_is_clamped() {
        let mut state = PlaybackState::new(
            ExperimentCalendar::with_days(1),
            PlaybackConfig {
                step_minutes: 1000,
                ..PlaybackConfig::default()
            },
        );
        state.tick();
        assert!(state.tick().contains(&PlaybackEvent::PhaseChanged(Phase::Final)));
        assert_eq!(minutes(&state, state.current), 1440);
    }

    #[test]
    fn pause_and_resume_leave_clock_alone() {
        let mut state = state();
        state.tick();
        assert_eq!(state.pause(), vec![PlaybackEvent::TickingStopped]);
        assert!(state.pause().is_empty());
        assert!(state.tick().is_empty());
        assert_eq!(minutes(&state, state.current), 20);
        assert_eq!(state.phase, Phase::Animating);

        assert_eq!(state.resume(), vec![PlaybackEvent::TickingResumed]);
        assert!(state.resume().is_empty());
        state.tick();
        assert_eq!(minutes(&state, state.current), 40);
    }

    #[test]
    fn lead_in_window_is_fixed() {
        let mut state = state();
        let window = state.window();
        assert_eq!(window.start, state.calendar.start);
        assert_eq!(minutes(&state, window.end), 4320);

        for _ in 0..216 {
            state.tick();
        }
        // 4320 minutes in: still the lead-in window.
        assert_eq!(minutes(&state, state.window().end), 4320);

        state.tick();
        let window = state.window();
        assert_eq!(window.end, state.current);
        assert_eq!(minutes(&state, window.start), 20);
    }

    #[test]
    fn offset_window_keeps_clock_inside() {
        let mut state = PlaybackState::new(
            ExperimentCalendar::default(),
            PlaybackConfig {
                policy: WindowPolicy::OffsetFraction(0.6),
                ..PlaybackConfig::default()
            },
        );
        state.scrub(0.5);
        let window = state.window();
        assert_eq!(minutes(&state, window.start), 10080 - 2592);
        assert_eq!(window.duration_minutes(), 4320);
        assert!(window.contains(state.current));

        state.scrub(0.99);
        let window = state.window();
        assert_eq!(window.end, state.calendar.end());
        assert_eq!(window.duration_minutes(), 4320);

        state.scrub(0.05);
        assert_eq!(state.window().start, state.calendar.start);
    }

    #[test]
    fn full_range_policy_never_slides() {
        let mut state = PlaybackState::new(
            ExperimentCalendar::default(),
            PlaybackConfig {
                policy: WindowPolicy::FullRange,
                ..PlaybackConfig::default()
            },
        );
        state.scrub(0.7);
        assert_eq!(
            state.window(),
            ViewWindow::new(state.calendar.start, state.calendar.end())
        );
    }

    #[test]
    fn animating_reveals_up_to_clock_and_final_shows_window() {
        let mut state = state();
        for _ in 0..300 {
            state.tick();
        }
        let visible = state.visible_range();
        assert_eq!(visible.start, state.calendar.start);
        assert_eq!(visible.end, state.current);

        state.skip_to_end();
        assert_eq!(
            state.visible_range(),
            ViewWindow::new(state.calendar.start, state.calendar.end())
        );
    }

    #[test]
    fn brush_is_ignored_while_animating() {
        let mut state = state();
        state.tick();
        let before = state.clone();
        assert!(state.brush(0.2, 0.4).is_empty());
        assert_eq!(state, before);
    }

    #[test]
    fn brush_zooms_final_view_until_reset() {
        let mut state = state();
        state.skip_to_end();
        assert_eq!(state.brush(0.75, 0.25), vec![PlaybackEvent::Redraw]);
        let window = state.window();
        assert_eq!(minutes(&state, window.start), 5040);
        assert_eq!(minutes(&state, window.end), 15120);
        assert_eq!(state.visible_range(), window);
        assert_eq!(state.current, state.calendar.end());

        // Brushing again zooms relative to the brushed window.
        state.brush(0.0, 0.5);
        assert_eq!(minutes(&state, state.window().end), 10080);

        assert!(state.brush(0.3, 0.3).is_empty());
        assert!(state.scrub(0.1).is_empty());

        assert_eq!(state.reset_scope(), vec![PlaybackEvent::Redraw]);
        assert!(state.reset_scope().is_empty());
        assert_eq!(state.window().duration_minutes(), 20160);
    }

    #[test]
    fn scrub_pauses_and_stays_paused() {
        let mut state = state();
        state.tick();
        assert_eq!(
            state.scrub(0.25),
            vec![PlaybackEvent::Redraw, PlaybackEvent::TickingStopped]
        );
        assert_eq!(minutes(&state, state.current), 5040);
        assert!(state.resume().is_empty());

        assert_eq!(state.scrub(0.1), vec![PlaybackEvent::Redraw]);
        assert_eq!(minutes(&state, state.current), 2016);

        state.scrub_end();
        assert!(!state.is_ticking());
        assert!(state.paused);
        assert_eq!(state.resume(), vec![PlaybackEvent::TickingResumed]);
        state.tick();
        assert_eq!(minutes(&state, state.current), 2036);
    }

    #[test]
    fn skip_fires_phase_change_once() {
        let mut state = state();
        let events = state.skip_to_end();
        assert!(events.contains(&PlaybackEvent::PhaseChanged(Phase::Final)));
        assert!(events.contains(&PlaybackEvent::TickingStopped));
        assert_eq!(state.skip_to_end(), vec![PlaybackEvent::Redraw]);
    }

    #[test]
    fn restart_resets_everything() {
        let mut state = state();
        state.skip_to_end();
        state.brush(0.1, 0.2);
        state.pause();

        let events = state.restart();
        assert_eq!(
            events,
            vec![
                PlaybackEvent::Redraw,
                PlaybackEvent::PhaseChanged(Phase::Animating),
                PlaybackEvent::TickingResumed,
            ]
        );
        assert_eq!(state.current, state.calendar.start);
        assert!(state.brush.is_none());
        assert!(state.is_ticking());
    }

    #[test]
    fn summary_follows_the_current_day() {
        let mut state = state();
        match state.summary_scope() {
            SummaryScope::Day { day, window } => {
                assert_eq!(day, 1);
                assert_eq!(window.duration_minutes(), 1439);
            }
            other => panic!("unexpected scope {other:?}"),
        }

        state.skip_to_end();
        assert!(matches!(state.summary_scope(), SummaryScope::FullRange { .. }));

        state.brush(0.0, 0.5);
        assert!(matches!(state.summary_scope(), SummaryScope::Brushed { .. }));
    }
}
