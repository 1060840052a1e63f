//! Display Projection
//!
//! A read-only view of console state for presentation adapters. Nothing here
//! mutates the console; a [`ConsoleSnapshot`] is rebuilt from scratch after
//! every handled event and handed to a [`DisplaySurface`].
//!
//! ## Speed text
//!
//! | Slot      | No reading | Reading 7.4 |
//! |-----------|------------|-------------|
//! | Lane      | `--`       | `07`        |
//! | Aggregate | `000`      | `007`       |
//! | Patrol    | `000`      | `007`       |

use serde::Serialize;

use crate::alert::Alert;
use crate::console::{Console, ScannerState};
use crate::enrichment::EnrichmentStatus;
use crate::plate::{Channel, PlateRecord};
use crate::radar::{SpeedBand, TargetCorrelation, TargetSummary};

/// Receives a fresh snapshot whenever console state changes
pub trait DisplaySurface {
    fn render(&mut self, snapshot: &ConsoleSnapshot);
}

fn whole(speed: f64) -> u32 {
    speed.max(0.0).round() as u32
}

pub fn lane_text(speed: Option<f64>) -> String {
    match speed {
        Some(speed) => format!("{:02}", whole(speed)),
        None => "--".to_string(),
    }
}

pub fn aggregate_text(speed: Option<f64>) -> String {
    format!("{:03}", speed.map(whole).unwrap_or(0))
}

// =============================================================================
// Views
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlateRow {
    pub plate: String,
    pub source: Channel,
    pub flags: Vec<String>,
    pub seen_count: u32,
    pub selected: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChannelView {
    pub plate: Option<String>,
    pub hit: bool,
}

/// Source and range of the most recent ingestion
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LastDetection {
    pub source: Channel,
    pub distance: Option<f64>,
}

impl LastDetection {
    /// Chip text, e.g. `LAST: REAR 12m`
    pub fn label(&self) -> String {
        let source = self.source.as_str().to_ascii_uppercase();
        match self.distance {
            Some(distance) => format!("LAST: {} {:.0}m", source, distance),
            None => format!("LAST: {}", source),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LaneView {
    pub lane: u8,
    pub text: String,
    pub band: Option<SpeedBand>,
    pub direction: Option<Channel>,
    pub selected: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateView {
    pub text: String,
    pub band: Option<SpeedBand>,
    pub locked: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RadarView {
    pub open: bool,
    pub active: bool,
    pub laser_mode: bool,
    pub speed_limit: f64,
    pub patrol_speed: String,
    pub selected_lane: Option<u8>,
    pub lanes: Vec<LaneView>,
    pub front: AggregateView,
    pub rear: AggregateView,
    pub target: Option<TargetSummary>,
    pub correlations: Vec<TargetCorrelation>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsoleSnapshot {
    pub scanner: ScannerState,
    pub plates: Vec<PlateRow>,
    pub plate_count: usize,
    pub selected: Option<PlateRecord>,
    pub front: ChannelView,
    pub rear: ChannelView,
    pub last_detection: Option<LastDetection>,
    pub alert: Option<Alert>,
    pub enrichment: EnrichmentStatus,
    pub radar: RadarView,
}

// =============================================================================
// Capture
// =============================================================================

impl ConsoleSnapshot {
    pub fn capture(console: &Console) -> Self {
        let selected_key = console.selection().plate_key();

        let plates: Vec<PlateRow> = console
            .plates()
            .iter()
            .map(|record| PlateRow {
                plate: record.plate.to_string(),
                source: record.source,
                flags: record.flags.to_vec(),
                seen_count: record.seen_count,
                selected: selected_key == Some(&record.plate),
            })
            .collect();

        let channel = |ch: Channel| ChannelView {
            plate: console.router().preview(ch).map(|key| key.to_string()),
            hit: console.router().is_hit(ch),
        };

        ConsoleSnapshot {
            scanner: console.scanner().clone(),
            plate_count: plates.len(),
            plates,
            selected: console.selected_plate().cloned(),
            front: channel(Channel::Front),
            rear: channel(Channel::Rear),
            last_detection: console.last_detection(),
            alert: console.alert().cloned(),
            enrichment: console.enrichment_status().clone(),
            radar: RadarView::capture(console),
        }
    }
}

impl RadarView {
    fn capture(console: &Console) -> Self {
        let radar = console.radar();
        let selected_lane = console.selection().lane();

        let lanes = radar
            .lanes()
            .iter()
            .map(|state| LaneView {
                lane: state.lane,
                text: lane_text(state.speed),
                band: state.speed.map(|s| radar.classify(s)),
                direction: state.direction,
                selected: selected_lane == Some(state.lane),
            })
            .collect();

        let aggregate = |ch: Channel| {
            let speed = radar.aggregate_speed(ch);
            AggregateView {
                text: aggregate_text(speed),
                band: speed.map(|s| radar.classify(s)),
                locked: radar.is_locked(ch),
            }
        };

        RadarView {
            open: radar.is_open(),
            active: radar.is_active(),
            laser_mode: radar.is_laser_mode(),
            speed_limit: radar.speed_limit(),
            patrol_speed: aggregate_text(Some(radar.patrol_speed())),
            selected_lane,
            lanes,
            front: aggregate(Channel::Front),
            rear: aggregate(Channel::Rear),
            target: radar.target().cloned(),
            correlations: radar.correlations().cloned().collect(),
        }
    }
}
