pub mod aggregate;
pub mod bridge;
pub mod calendar;
pub mod error;
pub mod playback;
pub mod segmentation;
pub mod series;
pub mod settings;
pub mod utils;
pub mod view;

use std::{env, path::PathBuf, sync::Arc};

use anyhow::{anyhow, bail, Context, Result};
use tokio::{
    io::{AsyncBufRead, AsyncBufReadExt, AsyncWriteExt, BufReader},
    sync::mpsc,
};

use aggregate::{temperature_distribution, Overview, OverviewSelection};
use bridge::{BridgeEvent, ChannelBridge};
use playback::{dispatch, Phase, PlaybackCommand, PlaybackController};
use series::{Dataset, DatasetKind, Sex, SubjectId};
use settings::SettingsStore;
use view::DetailView;

pub use calendar::{ExperimentCalendar, Timestamp};
pub use error::DataError;

/// Process-level options read from the environment.
#[derive(Debug, Clone)]
struct RunOptions {
    settings_path: PathBuf,
    data_dir: PathBuf,
    mouse_number: u32,
    kind: DatasetKind,
    debug: bool,
}

impl RunOptions {
    fn from_env() -> Result<Self> {
        let settings_path = env::var_os("MOUSEWATCH_SETTINGS")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("mousewatch.json"));
        let data_dir = env::var_os("MOUSEWATCH_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("data"));

        let mouse_number = match env::var("MOUSEWATCH_MOUSE_ID") {
            Ok(value) => parse_mouse_number(&value)?,
            Err(_) => 1,
        };

        let kind = match env::var("MOUSEWATCH_MODE") {
            Ok(value) => DatasetKind::parse(&value)
                .ok_or_else(|| anyhow!("unknown MOUSEWATCH_MODE {value:?}"))?,
            Err(_) => DatasetKind::default(),
        };

        let debug = env::var("MOUSEWATCH_DEBUG")
            .map(|value| matches!(value.trim(), "1" | "true"))
            .unwrap_or(false);

        Ok(Self {
            settings_path,
            data_dir,
            mouse_number,
            kind,
            debug,
        })
    }
}

/// Accepts `m3`, `f3` or a bare `3`; either prefix selects the same pair.
fn parse_mouse_number(value: &str) -> Result<u32> {
    let value = value.trim();
    let number = match SubjectId::parse(value) {
        Some(id) => id.number(),
        None => value.parse().ok(),
    };
    match number {
        Some(number) if number > 0 => Ok(number),
        _ => bail!("invalid mouse id {value:?}"),
    }
}

pub fn run() {
    // Initialize logging; RUST_LOG overrides the default level
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    log::info!("mousewatch starting up...");

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .expect("failed to build tokio runtime");

    if let Err(err) = runtime.block_on(serve()) {
        log::error!("{err:#}");
        std::process::exit(1);
    }
}

async fn serve() -> Result<()> {
    let options = RunOptions::from_env()?;
    let store = SettingsStore::new(options.settings_path.clone())?;
    match store.write_defaults_if_missing() {
        Ok(true) => log::info!("wrote default settings to {}", store.path().display()),
        Ok(false) => {}
        Err(err) => log::warn!("could not write default settings: {err:#}"),
    }
    let mut settings = store.playback();
    if options.debug {
        log::info!("debug mode: ticking every millisecond");
        settings.tick_interval_ms = 1;
    }

    let calendar = settings.calendar();
    let data_dir = options.data_dir.clone();
    let kind = options.kind;
    let dataset = tokio::task::spawn_blocking(move || Dataset::load(&data_dir, kind, calendar))
        .await?
        .with_context(|| {
            format!(
                "failed to load {kind:?} recordings from {}",
                options.data_dir.display()
            )
        })?;

    log_overview(&dataset, settings.overview_smoothing_minutes)?;

    let view = DetailView::build(&dataset, options.mouse_number, settings.smoothing_window_minutes)?;
    drop(dataset);

    let (tx, rx) = mpsc::unbounded_channel();
    let bridge = Arc::new(ChannelBridge::new(view.id, tx, settings.emit_points));
    let controller = PlaybackController::new(view, &settings, bridge);

    let writer = tokio::spawn(write_events(rx));
    controller.start().await?;
    let stdin = BufReader::new(tokio::io::stdin());
    let mut reader = tokio::spawn(drive(controller.clone(), stdin));

    tokio::select! {
        result = &mut reader => result??,
        _ = tokio::signal::ctrl_c() => {
            log::info!("interrupted");
            reader.abort();
            controller.shutdown().await;
            return Ok(());
        }
    }

    controller.shutdown().await;
    drop(controller);
    writer.await??;
    log::info!("playback finished");
    Ok(())
}

/// Applies commands from `input` until it closes, then runs the clock out to the end.
async fn drive<R>(controller: PlaybackController, input: R) -> Result<()>
where
    R: AsyncBufRead + Unpin,
{
    read_commands(&controller, input).await?;

    // Nothing can resume playback once input is gone.
    if controller.snapshot().await.state.phase != Phase::Final {
        log::info!("input closed before the end of playback; skipping to the end");
        controller.skip_to_end().await?;
    }
    Ok(())
}

fn log_overview(dataset: &Dataset, smoothing_window: usize) -> Result<()> {
    let overview = Overview::build(dataset, smoothing_window)?;
    let shown = overview.chart_series(&OverviewSelection::default());
    match overview.value_range() {
        Some((low, high)) => log::info!(
            "overview: {} daily profiles, {} charted, range {low:.2}..{high:.2} {}",
            overview.profiles.len(),
            shown.len(),
            dataset.kind.unit()
        ),
        None => log::warn!("overview has no finite values"),
    }

    if dataset.kind == DatasetKind::Temperature {
        for sex in [Sex::Male, Sex::Female] {
            let bins = temperature_distribution(dataset.series(sex));
            let total: usize = bins.iter().map(|bin| bin.count).sum();
            log::info!("{} temperature distribution: {total} readings in {} bins", sex.as_str(), bins.len());
        }
    }
    Ok(())
}

async fn write_events(mut rx: mpsc::UnboundedReceiver<BridgeEvent>) -> Result<()> {
    let mut stdout = tokio::io::stdout();
    while let Some(event) = rx.recv().await {
        let mut line = serde_json::to_vec(&event)?;
        line.push(b'\n');
        stdout.write_all(&line).await?;
        stdout.flush().await?;
    }
    Ok(())
}

async fn read_commands<R>(controller: &PlaybackController, input: R) -> Result<()>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = input.lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        match PlaybackCommand::from_json(&line) {
            Ok(command) => {
                dispatch(controller, command).await?;
            }
            Err(err) => log::warn!("{err:#}"),
        }
    }
    Ok(())
}
