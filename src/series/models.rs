use serde::{Deserialize, Serialize};
use std::fmt;

use crate::calendar::{Timestamp, MINUTES_PER_DAY};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TimePoint {
    pub time: Timestamp,
    pub value: f64,
}

impl TimePoint {
    pub fn new(time: Timestamp, value: f64) -> Self {
        Self { time, value }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Sex {
    Male,
    Female,
}

impl Sex {
    pub fn prefix(&self) -> char {
        match self {
            Sex::Male => 'm',
            Sex::Female => 'f',
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Sex::Male => "male",
            Sex::Female => "female",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum EstrusType {
    Estrus,
    NonEstrus,
}

impl EstrusType {
    pub fn from_state(estrus: bool) -> Self {
        if estrus {
            EstrusType::Estrus
        } else {
            EstrusType::NonEstrus
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EstrusType::Estrus => "estrus",
            EstrusType::NonEstrus => "non-estrus",
        }
    }
}

/// Population a derived series summarises.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum GroupKey {
    Male,
    Female,
    FemaleEstrus,
    FemaleNonEstrus,
}

impl GroupKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            GroupKey::Male => "male",
            GroupKey::Female => "female",
            GroupKey::FemaleEstrus => "female-estrus",
            GroupKey::FemaleNonEstrus => "female-non-estrus",
        }
    }

    pub fn sex(&self) -> Sex {
        match self {
            GroupKey::Male => Sex::Male,
            GroupKey::Female | GroupKey::FemaleEstrus | GroupKey::FemaleNonEstrus => Sex::Female,
        }
    }

    pub fn estrus(&self) -> Option<EstrusType> {
        match self {
            GroupKey::FemaleEstrus => Some(EstrusType::Estrus),
            GroupKey::FemaleNonEstrus => Some(EstrusType::NonEstrus),
            GroupKey::Male | GroupKey::Female => None,
        }
    }
}

/// Column key of one animal, e.g. `m3` or `f12`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubjectId(String);

impl SubjectId {
    pub fn new(sex: Sex, number: u32) -> Self {
        Self(format!("{}{}", sex.prefix(), number))
    }

    /// Accepts `m<digits>` / `f<digits>` (either case); anything else is not a subject column.
    pub fn parse(key: &str) -> Option<Self> {
        let key = key.trim();
        let mut chars = key.chars();
        let prefix = chars.next()?.to_ascii_lowercase();
        let digits = chars.as_str();
        if !matches!(prefix, 'm' | 'f')
            || digits.is_empty()
            || !digits.chars().all(|c| c.is_ascii_digit())
        {
            return None;
        }
        Some(Self(format!("{prefix}{digits}")))
    }

    pub fn sex(&self) -> Sex {
        if self.0.starts_with('f') {
            Sex::Female
        } else {
            Sex::Male
        }
    }

    pub fn number(&self) -> Option<u32> {
        self.0.get(1..)?.parse().ok()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SubjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "camelCase")]
pub enum SeriesKind {
    Individual(SubjectId),
    Aggregate(GroupKey),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Series {
    pub kind: SeriesKind,
    pub sex: Sex,
    pub estrus: Option<EstrusType>,
    pub points: Vec<TimePoint>,
}

impl Series {
    pub fn individual(subject: SubjectId, points: Vec<TimePoint>) -> Self {
        Self {
            sex: subject.sex(),
            kind: SeriesKind::Individual(subject),
            estrus: None,
            points,
        }
    }

    pub fn aggregate(group: GroupKey, points: Vec<TimePoint>) -> Self {
        Self {
            kind: SeriesKind::Aggregate(group),
            sex: group.sex(),
            estrus: group.estrus(),
            points,
        }
    }

    /// Same identity tags, new points.
    pub fn with_points(&self, points: Vec<TimePoint>) -> Self {
        Self {
            kind: self.kind.clone(),
            sex: self.sex,
            estrus: self.estrus,
            points,
        }
    }

    pub fn with_estrus(mut self, estrus: EstrusType) -> Self {
        self.estrus = Some(estrus);
        self
    }

    pub fn subject(&self) -> Option<&SubjectId> {
        match &self.kind {
            SeriesKind::Individual(subject) => Some(subject),
            SeriesKind::Aggregate(_) => None,
        }
    }

    pub fn is_aggregate(&self) -> bool {
        matches!(self.kind, SeriesKind::Aggregate(_))
    }

    pub fn label(&self) -> String {
        let base = match &self.kind {
            SeriesKind::Individual(subject) => subject.to_string(),
            SeriesKind::Aggregate(group) => format!("{}-avg", group.as_str()),
        };
        match (&self.kind, self.estrus) {
            (SeriesKind::Individual(_), Some(estrus)) => format!("{base}-{}", estrus.as_str()),
            _ => base,
        }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        self.points.iter().map(|p| p.value)
    }

    /// Whole days of the recording, 1440 points each.
    pub fn days(&self) -> impl Iterator<Item = &[TimePoint]> + '_ {
        self.points.chunks_exact(MINUTES_PER_DAY as usize)
    }

    pub fn between(&self, start: Timestamp, end: Timestamp) -> &[TimePoint] {
        points_between(&self.points, start, end)
    }
}

/// Sub-slice of time-ordered points with `start <= time <= end`.
pub fn points_between(points: &[TimePoint], start: Timestamp, end: Timestamp) -> &[TimePoint] {
    if start > end {
        return &points[..0];
    }
    let from = points.partition_point(|p| p.time < start);
    let to = points.partition_point(|p| p.time <= end);
    &points[from..to.max(from)]
}
