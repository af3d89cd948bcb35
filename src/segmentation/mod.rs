pub mod algorithm;
pub mod estrus;

pub use algorithm::{segment_points, segment_series, Segment};
pub use estrus::{estrus_state, is_estrus_day};
