pub mod loader;
pub mod models;
pub mod smoothing;

pub use loader::{
    load_subjects, parse_table, read_table, Dataset, DatasetKind, MissingValuePolicy, RawTable,
};
pub use models::{
    points_between, EstrusType, GroupKey, Series, SeriesKind, Sex, SubjectId, TimePoint,
};
pub use smoothing::{smooth, smooth_points};

/// Mean of the non-`NaN` values, or `NaN` when there are none.
pub(crate) fn nan_mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, count) = values
        .filter(|v| !v.is_nan())
        .fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    if count == 0 {
        f64::NAN
    } else {
        sum / count as f64
    }
}
