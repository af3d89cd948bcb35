//! Per-mouse detail view: one male and one female series replayed together.

use serde::Serialize;
use uuid::Uuid;

use crate::aggregate::{range_summary, RangeSummary};
use crate::calendar::{ExperimentCalendar, Timestamp};
use crate::error::Result;
use crate::playback::{Phase, PlaybackState, SummaryScope, ViewWindow};
use crate::segmentation::{segment_series, Segment};
use crate::series::{points_between, smooth, Dataset, DatasetKind, Series, Sex, TimePoint};

/// Smoothed data owned by one view instance; immutable once built.
#[derive(Debug, Clone)]
pub struct DetailView {
    pub id: Uuid,
    pub kind: DatasetKind,
    pub calendar: ExperimentCalendar,
    pub mouse_number: u32,
    pub male: Series,
    pub female: Series,
    pub female_segments: Vec<Segment>,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SegmentSlice<'a> {
    pub estrus: bool,
    pub data: &'a [TimePoint],
}

/// Everything the renderer needs for one redraw.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Frame<'a> {
    pub view_id: Uuid,
    pub sim_time: Timestamp,
    pub phase: Phase,
    pub window: ViewWindow,
    pub male: &'a [TimePoint],
    pub female: Vec<SegmentSlice<'a>>,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FrameSummary {
    pub scope: SummaryScope,
    pub male: RangeSummary,
    pub female: RangeSummary,
}

impl DetailView {
    pub fn build(dataset: &Dataset, mouse_number: u32, smoothing_window: usize) -> Result<Self> {
        let male = smooth(dataset.subject(Sex::Male, mouse_number)?, smoothing_window);
        let female = smooth(dataset.subject(Sex::Female, mouse_number)?, smoothing_window);
        Ok(Self::from_series(dataset.kind, dataset.calendar, mouse_number, male, female))
    }

    /// Takes already smoothed series.
    pub fn from_series(
        kind: DatasetKind,
        calendar: ExperimentCalendar,
        mouse_number: u32,
        male: Series,
        female: Series,
    ) -> Self {
        let female_segments = segment_series(&female, &calendar);
        Self {
            id: Uuid::new_v4(),
            kind,
            calendar,
            mouse_number,
            male,
            female,
            female_segments,
        }
    }

    pub fn frame(&self, state: &PlaybackState) -> Frame<'_> {
        let visible = state.visible_range();
        let female = self
            .female_segments
            .iter()
            .filter_map(|segment| {
                let data = points_between(&segment.data, visible.start, visible.end);
                (!data.is_empty()).then_some(SegmentSlice {
                    estrus: segment.estrus,
                    data,
                })
            })
            .collect();

        Frame {
            view_id: self.id,
            sim_time: state.current,
            phase: state.phase,
            window: state.window(),
            male: self.male.between(visible.start, visible.end),
            female,
        }
    }

    pub fn summary(&self, state: &PlaybackState) -> FrameSummary {
        let scope = state.summary_scope();
        let window = scope.window();
        FrameSummary {
            scope,
            male: range_summary(&self.male, window.start, window.end),
            female: range_summary(&self.female, window.start, window.end),
        }
    }
}
