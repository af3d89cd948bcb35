use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::calendar::{ExperimentCalendar, MINUTES_PER_DAY};
use crate::error::{DataError, Result};

use super::models::{Series, Sex, SubjectId, TimePoint};

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::{log_info, log_warn};

/// Header plus string cells, one row per elapsed minute.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { headers, rows }
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}

/// What an empty or non-numeric cell becomes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum MissingValuePolicy {
    /// Temperature: a gap stays a gap.
    Nan,
    /// Activity: no count recorded means no movement.
    Zero,
}

impl MissingValuePolicy {
    pub fn fallback(&self) -> f64 {
        match self {
            MissingValuePolicy::Nan => f64::NAN,
            MissingValuePolicy::Zero => 0.0,
        }
    }

    /// Returns the parsed value and whether the fallback was used.
    pub fn parse(&self, cell: &str) -> (f64, bool) {
        match cell.trim().parse::<f64>() {
            Ok(value) if value.is_finite() => (value, false),
            _ => (self.fallback(), true),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum DatasetKind {
    #[default]
    Temperature,
    Activity,
}

impl DatasetKind {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "temperature" | "temp" => Some(DatasetKind::Temperature),
            "activity" | "act" => Some(DatasetKind::Activity),
            _ => None,
        }
    }

    pub fn file_name(&self, sex: Sex) -> &'static str {
        match (self, sex) {
            (DatasetKind::Temperature, Sex::Male) => "male_temp.csv",
            (DatasetKind::Temperature, Sex::Female) => "fem_temp.csv",
            (DatasetKind::Activity, Sex::Male) => "male_act.csv",
            (DatasetKind::Activity, Sex::Female) => "fem_act.csv",
        }
    }

    pub fn missing_values(&self) -> MissingValuePolicy {
        match self {
            DatasetKind::Temperature => MissingValuePolicy::Nan,
            DatasetKind::Activity => MissingValuePolicy::Zero,
        }
    }

    pub fn unit(&self) -> &'static str {
        match self {
            DatasetKind::Temperature => "°C",
            DatasetKind::Activity => "",
        }
    }
}

pub fn read_table(path: &Path) -> Result<RawTable> {
    let file = std::fs::File::open(path)?;
    parse_table(file)
}

pub fn parse_table<R: Read>(source: R) -> Result<RawTable> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(source);

    let headers: Vec<String> = reader.headers()?.iter().map(String::from).collect();
    let mut rows = Vec::new();
    for (index, record) in reader.records().enumerate() {
        let record = record?;
        if record.len() != headers.len() {
            return Err(DataError::malformed(format!(
                "row {} has {} cells, expected {}",
                index + 1,
                record.len(),
                headers.len()
            )));
        }
        rows.push(record.iter().map(String::from).collect());
    }

    Ok(RawTable::new(headers, rows))
}

/// One series per `sex` column of `table`, point `i` at minute `i` of the calendar.
///
/// Partial days and row counts that disagree with the calendar are rejected.
pub fn load_subjects(
    table: &RawTable,
    sex: Sex,
    policy: MissingValuePolicy,
    calendar: &ExperimentCalendar,
) -> Result<Vec<Series>> {
    let row_count = table.row_count();
    if row_count == 0 || row_count as i64 % MINUTES_PER_DAY != 0 {
        return Err(DataError::malformed(format!(
            "{row_count} rows is not a whole number of days"
        )));
    }
    if row_count as i64 != calendar.total_minutes() {
        return Err(DataError::malformed(format!(
            "expected {} rows for {} days, found {row_count}",
            calendar.total_minutes(),
            calendar.days
        )));
    }
    if let Some(index) = table.rows.iter().position(|row| row.len() != table.headers.len()) {
        return Err(DataError::malformed(format!(
            "row {} does not match the header width",
            index + 1
        )));
    }

    let mut columns: Vec<(usize, SubjectId)> = table
        .headers
        .iter()
        .enumerate()
        .filter_map(|(index, header)| {
            SubjectId::parse(header)
                .filter(|subject| subject.sex() == sex)
                .map(|subject| (index, subject))
        })
        .collect();
    if columns.is_empty() {
        return Err(DataError::malformed(format!(
            "no {} subject columns in table",
            sex.as_str()
        )));
    }
    columns.sort_by_key(|(_, subject)| subject.number());

    let mut fallbacks = 0usize;
    let series: Vec<Series> = columns
        .into_iter()
        .map(|(column, subject)| {
            let points = table
                .rows
                .iter()
                .enumerate()
                .map(|(minute, row)| {
                    let (value, missing) = policy.parse(&row[column]);
                    fallbacks += usize::from(missing);
                    TimePoint::new(calendar.time_at(minute as i64), value)
                })
                .collect();
            Series::individual(subject, points)
        })
        .collect();

    if fallbacks > 0 {
        log_warn!(
            "{} {} cells were missing or non-numeric, substituted {:?}",
            fallbacks,
            sex.as_str(),
            policy
        );
    }
    log_info!(
        "loaded {} {} subjects over {} days",
        series.len(),
        sex.as_str(),
        calendar.days
    );

    Ok(series)
}

/// Male and female series of one measurement kind.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub kind: DatasetKind,
    pub calendar: ExperimentCalendar,
    pub males: Vec<Series>,
    pub females: Vec<Series>,
}

impl Dataset {
    pub fn load(dir: &Path, kind: DatasetKind, calendar: ExperimentCalendar) -> Result<Self> {
        let male = read_table(&dir.join(kind.file_name(Sex::Male)))?;
        let female = read_table(&dir.join(kind.file_name(Sex::Female)))?;
        Self::from_tables(kind, calendar, &male, &female)
    }

    pub fn from_tables(
        kind: DatasetKind,
        calendar: ExperimentCalendar,
        male: &RawTable,
        female: &RawTable,
    ) -> Result<Self> {
        let policy = kind.missing_values();
        Ok(Self {
            kind,
            calendar,
            males: load_subjects(male, Sex::Male, policy, &calendar)?,
            females: load_subjects(female, Sex::Female, policy, &calendar)?,
        })
    }

    pub fn series(&self, sex: Sex) -> &[Series] {
        match sex {
            Sex::Male => &self.males,
            Sex::Female => &self.females,
        }
    }

    pub fn subject(&self, sex: Sex, number: u32) -> Result<&Series> {
        let wanted = SubjectId::new(sex, number);
        self.series(sex)
            .iter()
            .find(|series| series.subject() == Some(&wanted))
            .ok_or_else(|| DataError::UnknownSubject(wanted.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(prefix: char, subjects: u32, rows: usize, cell: &str) -> RawTable {
        let mut headers = vec!["minute".to_string()];
        headers.extend((1..=subjects).map(|n| format!("{prefix}{n}")));
        let rows = (0..rows)
            .map(|i| {
                let mut row = vec![(i + 1).to_string()];
                row.extend((0..subjects).map(|_| cell.to_string()));
                row
            })
            .collect();
        RawTable::new(headers, rows)
    }

    #[test]
    fn loads_one_series_per_subject_column() {
        let calendar = ExperimentCalendar::with_days(1);
        let series = load_subjects(
            &table('m', 3, 1440, "37.0"),
            Sex::Male,
            MissingValuePolicy::Nan,
            &calendar,
        )
        .unwrap();

        assert_eq!(series.len(), 3);
        assert_eq!(series[2].subject(), Some(&SubjectId::new(Sex::Male, 3)));
        assert_eq!(series[0].len(), 1440);
        assert_eq!(series[0].points[0].time, calendar.start);
        assert_eq!(series[0].points[1439].time, calendar.time_at(1439));
        assert!(series[0].values().all(|v| v == 37.0));
    }

    #[test]
    fn partial_days_are_rejected() {
        let calendar = ExperimentCalendar::with_days(1);
        let err = load_subjects(
            &table('m', 1, 1439, "1"),
            Sex::Male,
            MissingValuePolicy::Zero,
            &calendar,
        )
        .unwrap_err();
        assert!(matches!(err, DataError::MalformedInput(_)));

        let empty = load_subjects(
            &table('m', 1, 0, "1"),
            Sex::Male,
            MissingValuePolicy::Zero,
            &calendar,
        );
        assert!(matches!(empty, Err(DataError::MalformedInput(_))));
    }

    #[test]
    fn row_count_must_match_calendar() {
        let calendar = ExperimentCalendar::with_days(2);
        let err = load_subjects(
            &table('f', 1, 1440, "1"),
            Sex::Female,
            MissingValuePolicy::Zero,
            &calendar,
        );
        assert!(matches!(err, Err(DataError::MalformedInput(_))));
    }

    #[test]
    fn missing_cells_follow_policy() {
        let calendar = ExperimentCalendar::with_days(1);
        let raw = table('f', 1, 1440, "n/a");
        let temperature =
            load_subjects(&raw, Sex::Female, MissingValuePolicy::Nan, &calendar).unwrap();
        assert!(temperature[0].values().all(f64::is_nan));

        let activity =
            load_subjects(&raw, Sex::Female, MissingValuePolicy::Zero, &calendar).unwrap();
        assert!(activity[0].values().all(|v| v == 0.0));
    }

    #[test]
    fn columns_of_the_other_sex_are_ignored() {
        let calendar = ExperimentCalendar::with_days(1);
        let err = load_subjects(
            &table('m', 2, 1440, "1"),
            Sex::Female,
            MissingValuePolicy::Zero,
            &calendar,
        );
        assert!(matches!(err, Err(DataError::MalformedInput(_))));
    }

    #[test]
    fn ragged_csv_rows_are_malformed() {
        let csv = "minute,m1,m2\n1,36.5,36.7\n2,36.6\n";
        let err = parse_table(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, DataError::MalformedInput(_)));
    }

    #[test]
    fn csv_cells_are_trimmed() {
        let csv = "minute, m1\n1, 36.5\n";
        let raw = parse_table(csv.as_bytes()).unwrap();
        assert_eq!(raw.headers, vec!["minute", "m1"]);
        assert_eq!(raw.rows, vec![vec!["1".to_string(), "36.5".to_string()]]);
    }

    #[test]
    fn unknown_subject_is_reported() {
        let calendar = ExperimentCalendar::with_days(1);
        let dataset = Dataset::from_tables(
            DatasetKind::Activity,
            calendar,
            &table('m', 2, 1440, "4"),
            &table('f', 2, 1440, "5"),
        )
        .unwrap();
        assert_eq!(dataset.subject(Sex::Female, 2).unwrap().points[0].value, 5.0);
        assert!(matches!(
            dataset.subject(Sex::Male, 9),
            Err(DataError::UnknownSubject(id)) if id == "m9"
        ));
    }
}
