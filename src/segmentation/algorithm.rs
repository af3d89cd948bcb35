use serde::{Deserialize, Serialize};

use crate::calendar::ExperimentCalendar;
use crate::series::{Series, TimePoint};

use super::estrus::estrus_state;

/// A maximal run of points sharing one estrus state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Segment {
    pub estrus: bool,
    pub data: Vec<TimePoint>,
}

impl Segment {
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Splits a female series into consecutive estrus / non-estrus runs in a single pass.
///
/// Concatenating the segments in order gives back the input points.
pub fn segment_series(series: &Series, calendar: &ExperimentCalendar) -> Vec<Segment> {
    segment_points(&series.points, calendar)
}

pub fn segment_points(points: &[TimePoint], calendar: &ExperimentCalendar) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut current: Option<Segment> = None;

    for point in points {
        let estrus = estrus_state(calendar, point.time);
        match &mut current {
            Some(segment) if segment.estrus == estrus => {
                segment.data.push(*point);
            }
            _ => {
                if let Some(segment) = current.take() {
                    segments.push(segment);
                }
                current = Some(Segment {
                    estrus,
                    data: vec![*point],
                });
            }
        }
    }

    if let Some(segment) = current {
        segments.push(segment);
    }

    segments
}
