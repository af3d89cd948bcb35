use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Stats {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
}

/// Summary of a time range. `NoData` means nothing was measured there, which is not zero.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum RangeSummary {
    NoData,
    Values(Stats),
}

impl RangeSummary {
    pub fn stats(&self) -> Option<Stats> {
        match self {
            RangeSummary::NoData => None,
            RangeSummary::Values(stats) => Some(*stats),
        }
    }

    pub fn is_no_data(&self) -> bool {
        matches!(self, RangeSummary::NoData)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Bin {
    pub low: f64,
    pub high: f64,
    pub count: usize,
}
