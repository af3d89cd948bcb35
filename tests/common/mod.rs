#![allow(dead_code)]

use std::sync::Mutex;

use anyhow::{bail, Result};
use chrono::Duration;
use rand::{rngs::StdRng, Rng, SeedableRng};

use mousewatch_lib::bridge::RenderBridge;
use mousewatch_lib::calendar::{ExperimentCalendar, Timestamp, MINUTES_PER_DAY};
use mousewatch_lib::playback::Phase;
use mousewatch_lib::series::{Dataset, DatasetKind, RawTable, Series, Sex, SubjectId, TimePoint};
use mousewatch_lib::view::{DetailView, Frame, FrameSummary};

pub fn points(calendar: &ExperimentCalendar, mut value: impl FnMut(i64) -> f64) -> Vec<TimePoint> {
    (0..calendar.total_minutes())
        .map(|minute| TimePoint::new(calendar.start + Duration::minutes(minute), value(minute)))
        .collect()
}

pub fn subject(sex: Sex, number: u32, points: Vec<TimePoint>) -> Series {
    Series::individual(SubjectId::new(sex, number), points)
}

/// One CSV-shaped table with a `minute` column and `subjects` constant columns.
pub fn constant_table(sex: Sex, subjects: u32, days: u32, value: f64) -> RawTable {
    let mut headers = vec!["minute".to_string()];
    headers.extend((1..=subjects).map(|n| format!("{}{n}", sex.prefix())));
    let rows = (0..i64::from(days) * MINUTES_PER_DAY)
        .map(|minute| {
            let mut row = vec![minute.to_string()];
            row.extend((0..subjects).map(|_| value.to_string()));
            row
        })
        .collect();
    RawTable::new(headers, rows)
}

pub fn constant_dataset(subjects: u32, days: u32, value: f64) -> Dataset {
    let calendar = ExperimentCalendar::with_days(days);
    Dataset::from_tables(
        DatasetKind::Temperature,
        calendar,
        &constant_table(Sex::Male, subjects, days, value),
        &constant_table(Sex::Female, subjects, days, value),
    )
    .unwrap()
}

/// Noisy body temperatures around 37 degrees, reproducible per seed.
pub fn noisy_view(calendar: ExperimentCalendar, seed: u64) -> DetailView {
    let mut rng = StdRng::seed_from_u64(seed);
    let male = points(&calendar, |_| 36.5 + rng.gen_range(0.0..1.0));
    let female = points(&calendar, |_| 36.8 + rng.gen_range(0.0..1.0));
    DetailView::from_series(
        DatasetKind::Temperature,
        calendar,
        1,
        subject(Sex::Male, 1, male),
        subject(Sex::Female, 1, female),
    )
}

#[derive(Debug, Clone, PartialEq)]
pub enum Recorded {
    Tick(Timestamp),
    Summary(FrameSummary),
    Phase(Phase),
    Zoom,
}

#[derive(Default)]
pub struct RecordingBridge {
    pub events: Mutex<Vec<Recorded>>,
}

impl RecordingBridge {
    pub fn events(&self) -> Vec<Recorded> {
        self.events.lock().unwrap().clone()
    }

    pub fn tick_count(&self) -> usize {
        self.events()
            .iter()
            .filter(|event| matches!(event, Recorded::Tick(_)))
            .count()
    }

    pub fn phases(&self) -> Vec<Phase> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                Recorded::Phase(phase) => Some(phase),
                _ => None,
            })
            .collect()
    }

    pub fn last_tick(&self) -> Option<Timestamp> {
        self.events().into_iter().rev().find_map(|event| match event {
            Recorded::Tick(time) => Some(time),
            _ => None,
        })
    }

    fn push(&self, event: Recorded) {
        self.events.lock().unwrap().push(event);
    }
}

impl RenderBridge for RecordingBridge {
    fn on_tick(&self, frame: &Frame<'_>) -> Result<()> {
        self.push(Recorded::Tick(frame.sim_time));
        Ok(())
    }

    fn on_summary(&self, summary: &FrameSummary) -> Result<()> {
        self.push(Recorded::Summary(*summary));
        Ok(())
    }

    fn on_phase_change(&self, phase: Phase) -> Result<()> {
        self.push(Recorded::Phase(phase));
        Ok(())
    }

    fn on_zoom_to_full_range(&self) -> Result<()> {
        self.push(Recorded::Zoom);
        Ok(())
    }
}

/// Rejects every redraw.
pub struct BrokenBridge;

impl RenderBridge for BrokenBridge {
    fn on_tick(&self, _frame: &Frame<'_>) -> Result<()> {
        bail!("surface lost")
    }

    fn on_summary(&self, _summary: &FrameSummary) -> Result<()> {
        bail!("surface lost")
    }

    fn on_phase_change(&self, _phase: Phase) -> Result<()> {
        Ok(())
    }
}
