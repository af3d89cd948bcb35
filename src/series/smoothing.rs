use super::models::{Series, TimePoint};
use super::nan_mean;

/// Centered moving average over `window_minutes` points.
///
/// Edges use a shorter window instead of padding. The half-width is `window_minutes / 2`, so an
/// even window spans `window_minutes + 1` points and a zero window behaves like a window of one.
/// `NaN` readings are skipped inside each window.
pub fn smooth(series: &Series, window_minutes: usize) -> Series {
    series.with_points(smooth_points(&series.points, window_minutes))
}

pub fn smooth_points(points: &[TimePoint], window_minutes: usize) -> Vec<TimePoint> {
    let half = window_minutes / 2;
    let n = points.len();
    (0..n)
        .map(|i| {
            let start = i.saturating_sub(half);
            let end = (i + half + 1).min(n);
            let value = nan_mean(points[start..end].iter().map(|p| p.value));
            TimePoint::new(points[i].time, value)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::ExperimentCalendar;
    use crate::series::{Sex, SubjectId};

    fn series(values: &[f64]) -> Series {
        let calendar = ExperimentCalendar::default();
        let points = values
            .iter()
            .enumerate()
            .map(|(i, v)| TimePoint::new(calendar.time_at(i as i64), *v))
            .collect();
        Series::individual(SubjectId::new(Sex::Male, 1), points)
    }

    #[test]
    fn window_of_one_is_identity() {
        let input = series(&[1.0, 5.0, -2.0, 8.5]);
        assert_eq!(smooth(&input, 1), input);
    }

    #[test]
    fn edges_use_shorter_windows() {
        let smoothed = smooth(&series(&[0.0, 3.0, 6.0, 9.0]), 3);
        let values: Vec<f64> = smoothed.values().collect();
        assert_eq!(values, vec![1.5, 3.0, 6.0, 7.5]);
    }

    #[test]
    fn even_window_uses_the_same_half_width_as_the_next_odd_one() {
        // half = 1, so index 0 averages [0, 2) and index 1 averages [0, 3).
        let smoothed = smooth(&series(&[0.0, 2.0, 4.0]), 2);
        let values: Vec<f64> = smoothed.values().collect();
        assert_eq!(values, vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn missing_readings_are_skipped() {
        let smoothed = smooth(&series(&[f64::NAN, 4.0, f64::NAN]), 3);
        assert!(smoothed.values().all(|v| v == 4.0));

        let all_missing = smooth(&series(&[f64::NAN, f64::NAN]), 3);
        assert!(all_missing.values().all(f64::is_nan));
    }

    #[test]
    fn times_pass_through() {
        let input = series(&[1.0, 2.0, 3.0, 4.0, 5.0]);
        let smoothed = smooth(&input, 15);
        assert_eq!(smoothed.len(), input.len());
        for (a, b) in smoothed.points.iter().zip(&input.points) {
            assert_eq!(a.time, b.time);
        }
    }
}
