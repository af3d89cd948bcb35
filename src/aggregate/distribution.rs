use crate::series::Series;

use super::types::Bin;

pub const TEMPERATURE_LOWER: f64 = 35.0;
pub const TEMPERATURE_UPPER: f64 = 40.0;
pub const TEMPERATURE_BIN_WIDTH: f64 = 0.5;

/// Counts values into `[low, high)` bins of `width` covering `[lower, upper)`.
///
/// The last bin is cut short at `upper` when the range is not a whole number of bins.
/// Gaps and out-of-range values are not counted.
pub fn distribution(
    values: impl IntoIterator<Item = f64>,
    lower: f64,
    upper: f64,
    width: f64,
) -> Vec<Bin> {
    if !(width > 0.0) || !(upper > lower) {
        return Vec::new();
    }
    // 1.1 / 0.1 comes out just above 11; the tolerance keeps it from adding a sliver bin.
    let bin_count = ((upper - lower) / width - 1e-9).ceil().max(1.0) as usize;
    let mut bins: Vec<Bin> = (0..bin_count)
        .map(|i| Bin {
            low: lower + i as f64 * width,
            high: (lower + (i + 1) as f64 * width).min(upper),
            count: 0,
        })
        .collect();

    let last = bins.len() - 1;
    for value in values {
        if value.is_nan() || value < lower || value >= upper {
            continue;
        }
        let index = ((value - lower) / width).floor() as usize;
        bins[index.min(last)].count += 1;
    }

    bins
}

/// Half-degree bins from 35 to 40 °C over every reading of `series`.
pub fn temperature_distribution(series: &[Series]) -> Vec<Bin> {
    distribution(
        series.iter().flat_map(Series::values),
        TEMPERATURE_LOWER,
        TEMPERATURE_UPPER,
        TEMPERATURE_BIN_WIDTH,
    )
}
