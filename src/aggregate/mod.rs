//! Cross-subject means and range statistics.

mod types;

pub mod distribution;
pub mod profile;

pub use distribution::{distribution, temperature_distribution};
pub use profile::{
    daily_profile, group_means, group_profiles, DayFilter, GroupToggles, Overview,
    OverviewSelection,
};
pub use types::{Bin, RangeSummary, Stats};

use crate::calendar::Timestamp;
use crate::error::{DataError, Result};
use crate::series::{nan_mean, points_between, GroupKey, Series, TimePoint};

/// Point-wise mean of aligned series, tagged as the aggregate of `group`.
///
/// Every input must have the same length and the same timestamps.
pub fn mean_series(group: GroupKey, inputs: &[&Series]) -> Result<Series> {
    let Some(first) = inputs.first() else {
        return Err(DataError::alignment("no series to average"));
    };

    for other in &inputs[1..] {
        if other.len() != first.len() {
            return Err(DataError::alignment(format!(
                "{} has {} points, {} has {}",
                first.label(),
                first.len(),
                other.label(),
                other.len()
            )));
        }
        let misaligned = first
            .points
            .iter()
            .zip(&other.points)
            .position(|(a, b)| a.time != b.time);
        if let Some(index) = misaligned {
            return Err(DataError::alignment(format!(
                "{} and {} disagree on the time of point {index}",
                first.label(),
                other.label()
            )));
        }
    }

    let points = first
        .points
        .iter()
        .enumerate()
        .map(|(i, point)| {
            let value = nan_mean(inputs.iter().map(|series| series.points[i].value));
            TimePoint::new(point.time, value)
        })
        .collect();

    Ok(Series::aggregate(group, points))
}

/// Min, max and mean over points with `start <= time <= end`. Missing readings are skipped.
pub fn range_summary(series: &Series, start: Timestamp, end: Timestamp) -> RangeSummary {
    summarize(points_between(&series.points, start, end))
}

pub fn summarize(points: &[TimePoint]) -> RangeSummary {
    let mut values = points.iter().map(|p| p.value).filter(|v| !v.is_nan());
    let Some(first) = values.next() else {
        return RangeSummary::NoData;
    };

    let (min, max, sum, count) = values.fold((first, first, first, 1usize), |acc, v| {
        (acc.0.min(v), acc.1.max(v), acc.2 + v, acc.3 + 1)
    });

    RangeSummary::Values(Stats {
        min,
        max,
        mean: sum / count as f64,
    })
}
