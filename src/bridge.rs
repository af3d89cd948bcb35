//! Output side of a playback view: whatever draws the chart implements [`RenderBridge`].

use anyhow::{anyhow, Result};
use log::{debug, info};
use serde::Serialize;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::calendar::Timestamp;
use crate::playback::{Phase, ViewWindow};
use crate::series::TimePoint;
use crate::view::{Frame, FrameSummary};

/// Receives view updates. Errors abort one update only; the clock has already moved.
pub trait RenderBridge: Send + Sync {
    fn on_tick(&self, frame: &Frame<'_>) -> Result<()>;

    fn on_summary(&self, summary: &FrameSummary) -> Result<()>;

    /// Fired once per transition.
    fn on_phase_change(&self, phase: Phase) -> Result<()>;

    fn on_zoom_to_full_range(&self) -> Result<()> {
        Ok(())
    }
}

/// Writes updates to the log; used when nothing is drawing.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogBridge;

impl RenderBridge for LogBridge {
    fn on_tick(&self, frame: &Frame<'_>) -> Result<()> {
        debug!(
            "tick {} {:?}: {} male points, {} female segments, window {} .. {}",
            frame.sim_time,
            frame.phase,
            frame.male.len(),
            frame.female.len(),
            frame.window.start,
            frame.window.end
        );
        Ok(())
    }

    fn on_summary(&self, summary: &FrameSummary) -> Result<()> {
        debug!("summary {:?}", summary);
        Ok(())
    }

    fn on_phase_change(&self, phase: Phase) -> Result<()> {
        info!("playback phase is now {:?}", phase);
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PointsPayload {
    pub count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub points: Option<Vec<TimePoint>>,
}

impl PointsPayload {
    fn new(points: &[TimePoint], include_points: bool) -> Self {
        Self {
            count: points.len(),
            points: include_points.then(|| points.to_vec()),
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SegmentPayload {
    pub estrus: bool,
    #[serde(flatten)]
    pub data: PointsPayload,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TickPayload {
    pub view_id: Uuid,
    pub sim_time: Timestamp,
    pub phase: Phase,
    pub window: ViewWindow,
    pub male: PointsPayload,
    pub female: Vec<SegmentPayload>,
}

/// Owned form of the bridge callbacks, for sending across tasks.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum BridgeEvent {
    Tick(TickPayload),
    Summary {
        view_id: Uuid,
        #[serde(flatten)]
        summary: FrameSummary,
    },
    PhaseChanged {
        view_id: Uuid,
        phase: Phase,
    },
    ZoomToFullRange {
        view_id: Uuid,
    },
}

/// Forwards every update as a [`BridgeEvent`] on an unbounded channel.
pub struct ChannelBridge {
    view_id: Uuid,
    tx: mpsc::UnboundedSender<BridgeEvent>,
    include_points: bool,
}

impl ChannelBridge {
    /// Without `include_points` ticks only carry point counts.
    pub fn new(view_id: Uuid, tx: mpsc::UnboundedSender<BridgeEvent>, include_points: bool) -> Self {
        Self {
            view_id,
            tx,
            include_points,
        }
    }

    fn send(&self, event: BridgeEvent) -> Result<()> {
        self.tx
            .send(event)
            .map_err(|_| anyhow!("render channel for view {} is closed", self.view_id))
    }
}

impl RenderBridge for ChannelBridge {
    fn on_tick(&self, frame: &Frame<'_>) -> Result<()> {
        let female = frame
            .female
            .iter()
            .map(|segment| SegmentPayload {
                estrus: segment.estrus,
                data: PointsPayload::new(segment.data, self.include_points),
            })
            .collect();

        self.send(BridgeEvent::Tick(TickPayload {
            view_id: frame.view_id,
            sim_time: frame.sim_time,
            phase: frame.phase,
            window: frame.window,
            male: PointsPayload::new(frame.male, self.include_points),
            female,
        }))
    }

    fn on_summary(&self, summary: &FrameSummary) -> Result<()> {
        self.send(BridgeEvent::Summary {
            view_id: self.view_id,
            summary: *summary,
        })
    }

    fn on_phase_change(&self, phase: Phase) -> Result<()> {
        self.send(BridgeEvent::PhaseChanged {
            view_id: self.view_id,
            phase,
        })
    }

    fn on_zoom_to_full_range(&self) -> Result<()> {
        self.send(BridgeEvent::ZoomToFullRange {
            view_id: self.view_id,
        })
    }
}
