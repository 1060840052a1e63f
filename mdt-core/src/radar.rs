//! Radar Track Aggregator
//!
//! Tracks the latest speed reading for each of the six lanes, the front and
//! rear aggregate slots, operator locks, the shared "current target" summary
//! and laser-mode target correlations.
//!
//! # Lanes
//!
//! | Lanes | Direction |
//! |-------|-----------|
//! | 1-3   | Front     |
//! | 4-6   | Rear      |
//!
//! # Power
//!
//! All readings are ignored while the radar is powered off. Powering off
//! resets every display slot, clears the locks and the target state, and
//! drops laser mode (laser mode cannot be on while the radar is off).

use serde::Serialize;
use std::collections::BTreeMap;

use crate::plate::{Channel, PlateKey};

pub const LANE_COUNT: usize = 6;

fn lane_index(lane: u8) -> Option<usize> {
    if (1..=LANE_COUNT as u8).contains(&lane) {
        Some(lane as usize - 1)
    } else {
        None
    }
}

pub fn is_valid_lane(lane: u8) -> bool {
    lane_index(lane).is_some()
}

// =============================================================================
// Banding
// =============================================================================

/// Speed classification relative to the configured limit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SpeedBand {
    UnderLimit,
    CloseToLimit,
    OverLimit,
}

impl SpeedBand {
    /// Both edges of the close band belong to `CloseToLimit`
    pub fn classify(speed: f64, limit: f64, close_band: f64) -> SpeedBand {
        if speed < limit - close_band {
            SpeedBand::UnderLimit
        } else if speed <= limit + close_band {
            SpeedBand::CloseToLimit
        } else {
            SpeedBand::OverLimit
        }
    }
}

// =============================================================================
// Readings and state
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SpeedReading {
    pub lane: u8,
    pub speed: f64,
    pub direction: Channel,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LaserReading {
    pub lane: u8,
    pub speed: f64,
    pub distance: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plate: Option<String>,
}

/// Latest reading for one lane
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LaneState {
    pub lane: u8,
    pub speed: Option<f64>,
    pub direction: Option<Channel>,
}

impl LaneState {
    fn empty(lane: u8) -> Self {
        LaneState {
            lane,
            speed: None,
            direction: None,
        }
    }
}

/// What last wrote the shared target summary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetSource {
    Front,
    Rear,
    Laser,
}

impl From<Channel> for TargetSource {
    fn from(channel: Channel) -> Self {
        match channel {
            Channel::Front => TargetSource::Front,
            Channel::Rear => TargetSource::Rear,
        }
    }
}

/// The shared "current target" slot
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TargetSummary {
    pub lane: u8,
    pub speed: f64,
    pub source: TargetSource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plate: Option<String>,
}

/// Laser reading bound to a lane and, once seen, a plate
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TargetCorrelation {
    pub lane: u8,
    pub speed: f64,
    pub distance: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plate: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpeedOutcome {
    /// Radar off or lane out of range
    Ignored,
    /// Lane slot updated; `echo` is false when another lane has focus
    Updated { echo: bool },
}

// =============================================================================
// Tracker
// =============================================================================

#[derive(Debug, Clone)]
pub struct RadarTracker {
    speed_limit: f64,
    close_band: f64,
    open: bool,
    active: bool,
    laser: bool,
    lanes: [LaneState; LANE_COUNT],
    front_speed: Option<f64>,
    rear_speed: Option<f64>,
    front_locked: bool,
    rear_locked: bool,
    target: Option<TargetSummary>,
    correlations: BTreeMap<u8, TargetCorrelation>,
    patrol_speed: f64,
}

impl RadarTracker {
    pub fn new(speed_limit: f64, close_band: f64) -> Self {
        RadarTracker {
            speed_limit,
            close_band,
            open: false,
            active: false,
            laser: false,
            lanes: std::array::from_fn(|i| LaneState::empty(i as u8 + 1)),
            front_speed: None,
            rear_speed: None,
            front_locked: false,
            rear_locked: false,
            target: None,
            correlations: BTreeMap::new(),
            patrol_speed: 0.0,
        }
    }

    pub fn classify(&self, speed: f64) -> SpeedBand {
        SpeedBand::classify(speed, self.speed_limit, self.close_band)
    }

    pub fn speed_limit(&self) -> f64 {
        self.speed_limit
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn is_laser_mode(&self) -> bool {
        self.laser
    }

    pub fn is_locked(&self, direction: Channel) -> bool {
        match direction {
            Channel::Front => self.front_locked,
            Channel::Rear => self.rear_locked,
        }
    }

    pub fn lanes(&self) -> &[LaneState] {
        &self.lanes
    }

    pub fn lane(&self, lane: u8) -> Option<&LaneState> {
        lane_index(lane).map(|i| &self.lanes[i])
    }

    pub fn aggregate_speed(&self, channel: Channel) -> Option<f64> {
        match channel {
            Channel::Front => self.front_speed,
            Channel::Rear => self.rear_speed,
        }
    }

    pub fn target(&self) -> Option<&TargetSummary> {
        self.target.as_ref()
    }

    pub fn correlation(&self, lane: u8) -> Option<&TargetCorrelation> {
        self.correlations.get(&lane)
    }

    pub fn correlations(&self) -> impl Iterator<Item = &TargetCorrelation> {
        self.correlations.values()
    }

    pub fn patrol_speed(&self) -> f64 {
        self.patrol_speed
    }

    pub fn open(&mut self) {
        self.open = true;
    }

    /// Closing powers the radar off
    pub fn close(&mut self) {
        self.open = false;
        self.active = false;
        self.power_off_reset();
    }

    /// Returns the new power state
    pub fn toggle_power(&mut self) -> bool {
        self.active = !self.active;
        if !self.active {
            self.power_off_reset();
        }
        log::info!("Radar power {}", if self.active { "ON" } else { "OFF" });
        self.active
    }

    fn power_off_reset(&mut self) {
        self.laser = false;
        for lane in self.lanes.iter_mut() {
            lane.speed = None;
            lane.direction = None;
        }
        self.front_speed = None;
        self.rear_speed = None;
        self.front_locked = false;
        self.rear_locked = false;
        self.target = None;
        self.correlations.clear();
    }

    /// Returns the new laser state, or `None` if the radar is off
    pub fn toggle_laser(&mut self) -> Option<bool> {
        if !self.active {
            return None;
        }
        self.laser = !self.laser;
        log::info!("Laser mode {}", if self.laser { "ON" } else { "OFF" });
        Some(self.laser)
    }

    /// Returns the new lock state for `direction`
    pub fn toggle_lock(&mut self, direction: Channel) -> bool {
        let lock = match direction {
            Channel::Front => &mut self.front_locked,
            Channel::Rear => &mut self.rear_locked,
        };
        *lock = !*lock;
        log::info!("Lock {} {}", direction, if *lock { "ON" } else { "OFF" });
        *lock
    }

    pub fn set_patrol_speed(&mut self, speed: f64) {
        self.patrol_speed = speed;
    }

    fn set_aggregate(&mut self, channel: Channel, speed: f64) {
        match channel {
            Channel::Front => self.front_speed = Some(speed),
            Channel::Rear => self.rear_speed = Some(speed),
        }
    }

    fn write_target(&mut self, lane: u8, speed: f64, source: TargetSource) {
        // Distance and plate persist until a reading supplies new ones
        let (distance, plate) = match self.target.take() {
            Some(t) => (t.distance, t.plate),
            None => (None, None),
        };
        self.target = Some(TargetSummary {
            lane,
            speed,
            source,
            distance,
            plate,
        });
    }

    /// Apply a lane speed reading
    ///
    /// The lane's own slot always updates. The shared target summary only
    /// updates when the reading's direction is locked, or when the reading
    /// is for the selected lane.
    pub fn on_speed_detected(
        &mut self,
        reading: SpeedReading,
        selected_lane: Option<u8>,
    ) -> SpeedOutcome {
        if !self.active {
            log::trace!("Radar off, dropping lane {} reading", reading.lane);
            return SpeedOutcome::Ignored;
        }
        let Some(index) = lane_index(reading.lane) else {
            log::debug!("Speed reading for invalid lane {}", reading.lane);
            return SpeedOutcome::Ignored;
        };

        log::trace!(
            "Lane {} ({}): {:.0} -> {:?}",
            reading.lane,
            reading.direction,
            reading.speed,
            self.classify(reading.speed)
        );

        self.lanes[index].speed = Some(reading.speed);
        self.lanes[index].direction = Some(reading.direction);

        let aggregate = if reading.direction == Channel::Front || reading.lane <= 3 {
            Channel::Front
        } else {
            Channel::Rear
        };
        self.set_aggregate(aggregate, reading.speed);

        if self.is_locked(reading.direction) || selected_lane == Some(reading.lane) {
            self.write_target(reading.lane, reading.speed, reading.direction.into());
        }

        SpeedOutcome::Updated {
            echo: selected_lane.map_or(true, |lane| lane == reading.lane),
        }
    }

    /// Apply a laser reading. Returns false when laser mode is off.
    pub fn on_laser_target(&mut self, reading: &LaserReading) -> bool {
        if !self.laser {
            log::trace!("Laser off, dropping lane {} target", reading.lane);
            return false;
        }
        if !is_valid_lane(reading.lane) {
            log::debug!("Laser target for invalid lane {}", reading.lane);
            return false;
        }

        let plate = reading
            .plate
            .as_deref()
            .and_then(PlateKey::parse)
            .map(|key| key.to_string());

        let correlation = self
            .correlations
            .entry(reading.lane)
            .or_insert_with(|| TargetCorrelation {
                lane: reading.lane,
                speed: reading.speed,
                distance: reading.distance,
                plate: None,
            });
        correlation.speed = reading.speed;
        correlation.distance = reading.distance;
        if plate.is_some() {
            correlation.plate = plate.clone();
        }

        self.set_aggregate(Channel::for_lane(reading.lane), reading.speed);
        self.write_target(reading.lane, reading.speed, TargetSource::Laser);
        if let Some(target) = self.target.as_mut() {
            target.distance = Some(reading.distance);
            if plate.is_some() {
                target.plate = plate;
            }
        }
        true
    }

    /// Attach a plate to the active target for `lane`, if there is one
    pub fn on_plate_detected(&mut self, lane: u8, plate: &PlateKey) -> bool {
        let Some(correlation) = self.correlations.get_mut(&lane) else {
            return false;
        };
        correlation.plate = Some(plate.to_string());

        if let Some(target) = self.target.as_mut().filter(|t| t.lane == lane) {
            target.plate = Some(plate.to_string());
        }
        true
    }

    /// Drop the correlation for a lane that lost focus
    pub fn clear_correlation(&mut self, lane: u8) {
        self.correlations.remove(&lane);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn powered() -> RadarTracker {
        let mut radar = RadarTracker::new(35.0, 5.0);
        radar.toggle_power();
        radar
    }

    fn speed(lane: u8, speed: f64) -> SpeedReading {
        SpeedReading {
            lane,
            speed,
            direction: Channel::for_lane(lane),
        }
    }

    fn laser(lane: u8, speed: f64, distance: f64, plate: Option<&str>) -> LaserReading {
        LaserReading {
            lane,
            speed,
            distance,
            plate: plate.map(str::to_string),
        }
    }

    #[test]
    fn test_banding_edges() {
        let radar = RadarTracker::new(35.0, 5.0);
        assert_eq!(radar.classify(29.0), SpeedBand::UnderLimit);
        assert_eq!(radar.classify(30.0), SpeedBand::CloseToLimit);
        assert_eq!(radar.classify(40.0), SpeedBand::CloseToLimit);
        assert_eq!(radar.classify(41.0), SpeedBand::OverLimit);
    }

    #[test]
    fn test_readings_ignored_when_off() {
        let mut radar = RadarTracker::new(35.0, 5.0);
        assert_eq!(radar.on_speed_detected(speed(1, 40.0), None), SpeedOutcome::Ignored);
        assert_eq!(radar.lane(1).unwrap().speed, None);
    }

    #[test]
    fn test_invalid_lane_ignored() {
        let mut radar = powered();
        assert_eq!(radar.on_speed_detected(speed(0, 40.0), None), SpeedOutcome::Ignored);
        assert_eq!(radar.on_speed_detected(speed(7, 40.0), None), SpeedOutcome::Ignored);
        assert!(radar.lanes().iter().all(|l| l.speed.is_none()));
    }

    #[test]
    fn test_lane_and_aggregate_slots() {
        let mut radar = powered();
        radar.on_speed_detected(speed(2, 33.0), None);
        radar.on_speed_detected(speed(5, 52.0), None);

        assert_eq!(radar.lane(2).unwrap().speed, Some(33.0));
        assert_eq!(radar.lane(5).unwrap().speed, Some(52.0));
        assert_eq!(radar.aggregate_speed(Channel::Front), Some(33.0));
        assert_eq!(radar.aggregate_speed(Channel::Rear), Some(52.0));
        // No lock, no selected lane: summary untouched
        assert!(radar.target().is_none());
    }

    #[test]
    fn test_selected_lane_filters_target_and_echo() {
        let mut radar = powered();

        let outcome = radar.on_speed_detected(speed(1, 44.0), Some(3));
        assert_eq!(outcome, SpeedOutcome::Updated { echo: false });
        assert_eq!(radar.lane(1).unwrap().speed, Some(44.0));
        assert!(radar.target().is_none());

        let outcome = radar.on_speed_detected(speed(3, 38.0), Some(3));
        assert_eq!(outcome, SpeedOutcome::Updated { echo: true });
        assert_eq!(radar.target().unwrap().lane, 3);
    }

    #[test]
    fn test_lock_overrides_lane_filter() {
        let mut radar = powered();
        assert!(radar.toggle_lock(Channel::Rear));

        radar.on_speed_detected(speed(5, 61.0), Some(2));
        let target = radar.target().unwrap();
        assert_eq!(target.lane, 5);
        assert_eq!(target.speed, 61.0);
        assert_eq!(target.source, TargetSource::Rear);

        assert!(!radar.toggle_lock(Channel::Rear));
    }

    #[test]
    fn test_laser_requires_power_and_mode() {
        let mut radar = RadarTracker::new(35.0, 5.0);
        assert_eq!(radar.toggle_laser(), None);
        assert!(!radar.on_laser_target(&laser(2, 50.0, 120.0, None)));

        radar.toggle_power();
        assert!(!radar.on_laser_target(&laser(2, 50.0, 120.0, None)));

        assert_eq!(radar.toggle_laser(), Some(true));
        assert!(radar.on_laser_target(&laser(2, 50.0, 120.0, None)));
        assert_eq!(radar.correlation(2).unwrap().distance, 120.0);
    }

    #[test]
    fn test_laser_updates_in_place() {
        let mut radar = powered();
        radar.toggle_laser();

        radar.on_laser_target(&laser(2, 50.0, 120.0, Some("abc-123")));
        radar.on_laser_target(&laser(2, 48.0, 95.0, None));

        let c = radar.correlation(2).unwrap();
        assert_eq!(c.speed, 48.0);
        assert_eq!(c.distance, 95.0);
        assert_eq!(c.plate.as_deref(), Some("ABC123"));

        let target = radar.target().unwrap();
        assert_eq!(target.source, TargetSource::Laser);
        assert_eq!(target.distance, Some(95.0));
        assert_eq!(target.plate.as_deref(), Some("ABC123"));
    }

    #[test]
    fn test_plate_detected_binds_active_target() {
        let mut radar = powered();
        radar.toggle_laser();
        let key = PlateKey::parse("XYZ999").unwrap();

        assert!(!radar.on_plate_detected(4, &key));

        radar.on_laser_target(&laser(4, 70.0, 200.0, None));
        assert!(radar.on_plate_detected(4, &key));
        assert_eq!(radar.correlation(4).unwrap().plate.as_deref(), Some("XYZ999"));
        assert_eq!(radar.target().unwrap().plate.as_deref(), Some("XYZ999"));
    }

    #[test]
    fn test_power_off_resets_everything() {
        let mut radar = powered();
        radar.toggle_laser();
        radar.toggle_lock(Channel::Front);
        radar.on_speed_detected(speed(1, 40.0), None);
        radar.on_laser_target(&laser(1, 40.0, 80.0, Some("P1")));

        assert!(!radar.toggle_power());
        assert!(!radar.is_laser_mode());
        assert!(!radar.is_locked(Channel::Front));
        assert!(radar.lanes().iter().all(|l| l.speed.is_none()));
        assert_eq!(radar.aggregate_speed(Channel::Front), None);
        assert!(radar.target().is_none());
        assert_eq!(radar.correlations().count(), 0);

        // Back on: clean slate
        assert!(radar.toggle_power());
        assert!(!radar.is_laser_mode());
    }

    #[test]
    fn test_close_powers_off() {
        let mut radar = powered();
        radar.open();
        radar.toggle_laser();
        radar.close();
        assert!(!radar.is_open());
        assert!(!radar.is_active());
        assert!(!radar.is_laser_mode());
    }
}
