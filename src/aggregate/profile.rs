//! Average-day profiles for the summary views: 14 days folded into one 1440-minute cycle.

use serde::{Deserialize, Serialize};

use crate::calendar::{ExperimentCalendar, MINUTES_PER_DAY};
use crate::error::Result;
use crate::segmentation::is_estrus_day;
use crate::series::{smooth, Dataset, EstrusType, GroupKey, Series, SeriesKind, Sex, TimePoint};

use super::mean_series;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum DayFilter {
    All,
    Estrus,
    NonEstrus,
}

impl DayFilter {
    fn accepts(&self, day: i64) -> bool {
        match self {
            DayFilter::All => true,
            DayFilter::Estrus => is_estrus_day(day),
            DayFilter::NonEstrus => !is_estrus_day(day),
        }
    }
}

/// Averages each minute-of-day over the days `filter` accepts.
///
/// The result is anchored to day 1 of the calendar. `None` when no whole day matches.
pub fn daily_profile(
    series: &Series,
    calendar: &ExperimentCalendar,
    filter: DayFilter,
) -> Option<Series> {
    let minutes = MINUTES_PER_DAY as usize;
    let mut sums = vec![0.0; minutes];
    let mut counts = vec![0usize; minutes];
    let mut matched_days = 0;

    for day in series.days() {
        if !filter.accepts(calendar.day_number(day[0].time)) {
            continue;
        }
        matched_days += 1;
        for (minute, point) in day.iter().enumerate() {
            if !point.value.is_nan() {
                sums[minute] += point.value;
                counts[minute] += 1;
            }
        }
    }

    if matched_days == 0 {
        return None;
    }

    let points = sums
        .iter()
        .zip(&counts)
        .enumerate()
        .map(|(minute, (sum, count))| {
            let value = if *count == 0 {
                f64::NAN
            } else {
                sum / *count as f64
            };
            TimePoint::new(calendar.time_at(minute as i64), value)
        })
        .collect();

    let profile = series.with_points(points);
    Some(match filter {
        DayFilter::All => profile,
        DayFilter::Estrus | DayFilter::NonEstrus => {
            profile.with_estrus(EstrusType::from_state(filter == DayFilter::Estrus))
        }
    })
}

/// One profile per male, an estrus and a non-estrus profile per female.
pub fn group_profiles(dataset: &Dataset) -> Vec<Series> {
    let calendar = &dataset.calendar;
    let males = dataset
        .males
        .iter()
        .filter_map(|series| daily_profile(series, calendar, DayFilter::All));
    let females = dataset.females.iter().flat_map(|series| {
        [DayFilter::Estrus, DayFilter::NonEstrus]
            .into_iter()
            .filter_map(move |filter| daily_profile(series, calendar, filter))
    });
    males.chain(females).collect()
}

pub fn group_of(series: &Series) -> GroupKey {
    match (series.sex, series.estrus) {
        (Sex::Male, _) => GroupKey::Male,
        (Sex::Female, Some(EstrusType::Estrus)) => GroupKey::FemaleEstrus,
        (Sex::Female, Some(EstrusType::NonEstrus)) => GroupKey::FemaleNonEstrus,
        (Sex::Female, None) => GroupKey::Female,
    }
}

/// Mean line per group present in `profiles`, in male / estrus / non-estrus order.
pub fn group_means(profiles: &[Series]) -> Result<Vec<Series>> {
    let mut means = Vec::new();
    for group in OVERVIEW_GROUPS {
        let members: Vec<&Series> = profiles.iter().filter(|s| group_of(s) == group).collect();
        if !members.is_empty() {
            means.push(mean_series(group, &members)?);
        }
    }
    Ok(means)
}

const OVERVIEW_GROUPS: [GroupKey; 3] = [
    GroupKey::Male,
    GroupKey::FemaleEstrus,
    GroupKey::FemaleNonEstrus,
];

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GroupToggles {
    pub male: bool,
    pub estrus: bool,
    pub non_estrus: bool,
}

impl GroupToggles {
    pub fn all(value: bool) -> Self {
        Self {
            male: value,
            estrus: value,
            non_estrus: value,
        }
    }

    pub fn get(&self, group: GroupKey) -> bool {
        match group {
            GroupKey::Male => self.male,
            GroupKey::FemaleEstrus => self.estrus,
            GroupKey::FemaleNonEstrus => self.non_estrus,
            GroupKey::Female => self.estrus || self.non_estrus,
        }
    }

    pub fn toggle(&mut self, group: GroupKey) {
        match group {
            GroupKey::Male => self.male = !self.male,
            GroupKey::FemaleEstrus => self.estrus = !self.estrus,
            GroupKey::FemaleNonEstrus => self.non_estrus = !self.non_estrus,
            GroupKey::Female => {
                let next = !(self.estrus && self.non_estrus);
                self.estrus = next;
                self.non_estrus = next;
            }
        }
    }
}

/// Which groups are drawn and whether each shows its mean or every member.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct OverviewSelection {
    pub shown: GroupToggles,
    pub expanded: GroupToggles,
}

impl Default for OverviewSelection {
    fn default() -> Self {
        Self {
            shown: GroupToggles::all(true),
            expanded: GroupToggles::all(false),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Overview {
    pub profiles: Vec<Series>,
    pub means: Vec<Series>,
}

impl Overview {
    pub fn build(dataset: &Dataset, smoothing_window: usize) -> Result<Self> {
        let profiles: Vec<Series> = group_profiles(dataset)
            .iter()
            .map(|profile| smooth(profile, smoothing_window))
            .collect();
        let means = group_means(&profiles)?;
        Ok(Self { profiles, means })
    }

    pub fn chart_series(&self, selection: &OverviewSelection) -> Vec<&Series> {
        let mut chart = Vec::new();
        for group in OVERVIEW_GROUPS {
            if !selection.shown.get(group) {
                continue;
            }
            if selection.expanded.get(group) {
                chart.extend(self.profiles.iter().filter(|s| group_of(s) == group));
            } else {
                chart.extend(
                    self.means
                        .iter()
                        .filter(|s| s.kind == SeriesKind::Aggregate(group)),
                );
            }
        }
        chart
    }

    /// Lowest and highest profile value, ignoring gaps.
    pub fn value_range(&self) -> Option<(f64, f64)> {
        self.profiles
            .iter()
            .flat_map(Series::values)
            .filter(|v| !v.is_nan())
            .fold(None, |range, v| match range {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
    }
}
