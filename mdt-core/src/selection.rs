//! Selection & Focus Manager
//!
//! Holds the selected plate (by canonical key, never a copy of the record)
//! and the selected radar lane.

use crate::error::ConsoleError;
use crate::plate::{PlateKey, PlateRecord};
use crate::plates::PlateTracker;
use crate::radar::is_valid_lane;

/// Result of a lane toggle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LaneToggle {
    /// Lane with focus after the toggle
    pub selected: Option<u8>,
    /// Lane that lost focus, if any
    pub deselected: Option<u8>,
}

#[derive(Debug, Clone)]
pub struct SelectionState {
    auto_select_on_detect: bool,
    plate: Option<PlateKey>,
    lane: Option<u8>,
}

impl SelectionState {
    pub fn new(auto_select_on_detect: bool) -> Self {
        SelectionState {
            auto_select_on_detect,
            plate: None,
            lane: None,
        }
    }

    pub fn plate_key(&self) -> Option<&PlateKey> {
        self.plate.as_ref()
    }

    /// Live view of the selected record
    pub fn selected_plate<'a>(&self, plates: &'a PlateTracker) -> Option<&'a PlateRecord> {
        self.plate.as_ref().and_then(|key| plates.get(key.as_str()))
    }

    pub fn lane(&self) -> Option<u8> {
        self.lane
    }

    /// Auto-select policy for a freshly ingested plate.
    ///
    /// With the policy on (the default) this replaces any manual selection.
    /// Returns true if the selection changed hands to `key`.
    pub fn on_detected(&mut self, key: &PlateKey) -> bool {
        if !self.auto_select_on_detect && self.plate.is_some() {
            return false;
        }
        self.plate = Some(key.clone());
        true
    }

    /// Operator selection by raw plate text
    pub fn select_plate<'a>(
        &mut self,
        plates: &'a PlateTracker,
        raw: &str,
    ) -> Result<&'a PlateRecord, ConsoleError> {
        let record = plates
            .find(raw)
            .ok_or_else(|| ConsoleError::LookupMiss(format!("plate {:?} not tracked", raw)))?;
        self.plate = Some(record.plate.clone());
        Ok(record)
    }

    pub fn clear_plate(&mut self) {
        self.plate = None;
    }

    /// Drop the selection if it points at a plate that left the collection
    pub fn forget(&mut self, key: &PlateKey) {
        if self.plate.as_ref() == Some(key) {
            self.plate = None;
        }
    }

    /// Selecting the selected lane deselects it; any other lane replaces it.
    pub fn toggle_lane(&mut self, lane: u8) -> Result<LaneToggle, ConsoleError> {
        if !is_valid_lane(lane) {
            return Err(ConsoleError::LookupMiss(format!("lane {} does not exist", lane)));
        }

        let previous = self.lane;
        self.lane = if previous == Some(lane) {
            None
        } else {
            Some(lane)
        };
        log::info!("Lane selection: {:?}", self.lane);

        Ok(LaneToggle {
            selected: self.lane,
            deselected: previous,
        })
    }

    pub fn clear_lane(&mut self) {
        self.lane = None;
    }
}
